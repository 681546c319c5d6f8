use clap::Parser;
use log::{debug, info};
use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

/// Extension given to compressed files.
pub const EXTENSION: &str = "huf";
/// Extension given to decoded files whose name does not end in `.huf`.
pub const DECODED_EXTENSION: &str = "out";

/// Encode, Decode, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encode,
    Decode,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "A static Huffman file compressor",
    long_about = "
    Compresses each file with a Huffman code built from that file's own byte counts.
    The code tree is stored in front of the payload, so every file decodes on its own."
)]
pub struct Args {
    /// Files to process
    #[clap(required = true)]
    files: Vec<String>,

    /// Compress the input files (default)
    #[clap(short = 'z', long = "encode")]
    encode: bool,

    /// Decompress the input files
    #[clap(short = 'd', long = "decode", conflicts_with = "encode")]
    decode: bool,

    /// Check that the input files decode cleanly, without writing anything
    #[clap(short = 't', long = "test", conflicts_with_all = &["encode", "decode"])]
    test: bool,

    /// Overwrite existing output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Output file name, only valid with a single input file
    #[clap(short = 'o', long = "output")]
    output: Option<String>,

    /// Sets verbosity. -v0 is silent, -v5 is chatty
    #[clap(short = 'v', default_value_t = 3)]
    v: u8,
}

/// Everything main needs to know to run.
#[derive(Debug)]
pub struct HuffOpts {
    /// Encode/Decode/Test
    pub mode: Mode,
    /// Names of files to read for input
    pub files: Vec<String>,
    /// Explicit output name for a single input
    pub output: Option<String>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Log verbosity, 0 to 5
    pub verbose: u8,
}

impl From<Args> for HuffOpts {
    fn from(args: Args) -> Self {
        let mode = if args.test {
            Mode::Test
        } else if args.decode {
            Mode::Decode
        } else {
            Mode::Encode
        };
        Self {
            mode,
            files: args.files,
            output: args.output,
            force_overwrite: args.force,
            verbose: args.v,
        }
    }
}

impl HuffOpts {
    /// Where the result of processing `input` goes. None in test mode.
    pub fn output_for(&self, input: &Path) -> Option<PathBuf> {
        match (&self.output, self.mode) {
            (_, Mode::Test) => None,
            (Some(name), _) => Some(PathBuf::from(name)),
            (None, Mode::Encode) => Some(encoded_name(input)),
            (None, Mode::Decode) => Some(decoded_name(input)),
        }
    }
}

/// Parse the command line and set the log level from it.
pub fn init_opts() -> Result<HuffOpts, clap::Error> {
    let opts = HuffOpts::from(Args::try_parse()?);

    log::set_max_level(level_filter(opts.verbose));

    info!("---- Huffpack Initialization Start ----");
    info!("Verbosity set to {}", log::max_level());
    info!("Operational mode set to {}", opts.mode);
    debug!("Input files: {:?}", opts.files);
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    info!("---- Huffpack Initialization End ----");
    Ok(opts)
}

/// Map the -v count onto a log level.
pub fn level_filter(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// `name` becomes `name.huf`.
pub fn encoded_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

/// `name.huf` becomes `name`, anything else becomes `anything.out`.
pub fn decoded_name(input: &Path) -> PathBuf {
    match (input.extension(), input.file_stem()) {
        (Some(ext), Some(_)) if ext == EXTENSION => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".");
            name.push(DECODED_EXTENSION);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{decoded_name, encoded_name, level_filter, Args, HuffOpts, Mode};
    use clap::Parser;
    use std::path::{Path, PathBuf};

    fn opts(args: &[&str]) -> HuffOpts {
        HuffOpts::from(Args::try_parse_from(args).unwrap())
    }

    #[test]
    fn encoded_name_test() {
        assert_eq!(encoded_name(Path::new("book.txt")), PathBuf::from("book.txt.huf"));
        assert_eq!(encoded_name(Path::new("dir/data")), PathBuf::from("dir/data.huf"));
    }

    #[test]
    fn decoded_name_test() {
        assert_eq!(decoded_name(Path::new("book.txt.huf")), PathBuf::from("book.txt"));
        assert_eq!(decoded_name(Path::new("dir/data.huf")), PathBuf::from("dir/data"));
        assert_eq!(decoded_name(Path::new("book.txt")), PathBuf::from("book.txt.out"));
        assert_eq!(decoded_name(Path::new(".huf")), PathBuf::from(".huf.out"));
    }

    #[test]
    fn mode_test() {
        assert_eq!(opts(&["huffpack", "a"]).mode, Mode::Encode);
        assert_eq!(opts(&["huffpack", "-z", "a"]).mode, Mode::Encode);
        assert_eq!(opts(&["huffpack", "-d", "a.huf"]).mode, Mode::Decode);
        assert_eq!(opts(&["huffpack", "--test", "a.huf"]).mode, Mode::Test);
        assert!(Args::try_parse_from(&["huffpack", "-z", "-d", "a"]).is_err());
        assert!(Args::try_parse_from(&["huffpack"]).is_err());
    }

    #[test]
    fn output_for_test() {
        let o = opts(&["huffpack", "-f", "a.txt", "b"]);
        assert!(o.force_overwrite);
        assert_eq!(o.verbose, 3);
        assert_eq!(o.output_for(Path::new("a.txt")), Some(PathBuf::from("a.txt.huf")));

        let o = opts(&["huffpack", "-d", "-o", "plain", "a.huf"]);
        assert_eq!(o.output_for(Path::new("a.huf")), Some(PathBuf::from("plain")));

        let o = opts(&["huffpack", "-t", "a.huf"]);
        assert_eq!(o.output_for(Path::new("a.huf")), None);
    }

    #[test]
    fn level_filter_test() {
        assert_eq!(level_filter(0), log::LevelFilter::Off);
        assert_eq!(level_filter(3), log::LevelFilter::Info);
        assert_eq!(level_filter(9), log::LevelFilter::Trace);
    }
}
