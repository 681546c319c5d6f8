//! The Huffman tree, stored as an arena of nodes addressed by index.
//!
//! Branches own their children through indices and every node records its parent, so codes can
//! be derived by walking up from a leaf without any shared or cyclic ownership.
//!
//! Tie-break rule used during construction: leaves are queued in ascending symbol order, each
//! queue entry is ordered by (frequency, insertion sequence), the first node popped becomes the
//! left child (edge bit 0) and the second the right child (edge bit 1).

use std::fmt;

use log::trace;

use super::heap::{HeapOrder, PriorityQueue};
use crate::error::{HuffError, Result};
use crate::tools::freq_count::FrequencyTable;

/// Longest code a `Code` can carry.
pub const MAX_CODE_LEN: usize = u128::BITS as usize;
/// A full binary tree over a one-byte alphabet never has more nodes than this.
pub const MAX_NODES: usize = 2 * 256 - 1;

/// Index of a node in its tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf { symbol: u8 },
    Branch { left: NodeId, right: NodeId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Sum of the leaf frequencies below. Zero for trees read back from a header.
    pub frequency: u64,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// One node as it appears in a pre-order walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreorderItem {
    Leaf(u8),
    Branch,
}

/// A variable length code, right aligned in `bits`, transmitted most significant bit first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Code {
    pub bits: u128,
    pub len: u8,
}

impl Code {
    /// True if `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            f.write_str(if (self.bits >> i) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Code of every present symbol, derived once per encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; 256],
}

impl CodeTable {
    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes[symbol as usize]
    }

    /// Present symbols and their codes, in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|code| (symbol as u8, code)))
    }
}

/// Queue entry used while merging. Field order gives the (frequency, sequence) ordering.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    frequency: u64,
    seq: usize,
    id: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
    leaves: [Option<NodeId>; 256],
}

impl HuffmanTree {
    fn empty() -> Self {
        Self {
            nodes: Vec::with_capacity(MAX_NODES),
            root: NodeId(0),
            leaves: [None; 256],
        }
    }

    /// Build the tree for a frequency table. Returns None when no symbol is present.
    pub fn from_frequencies(freqs: &FrequencyTable) -> Option<Self> {
        let mut tree = Self::empty();
        let mut queue = PriorityQueue::new(HeapOrder::Min);
        let mut seq = 0;

        for (symbol, frequency) in freqs.present() {
            let id = tree.push_leaf(symbol, frequency);
            queue.push(Pending { frequency, seq, id });
            seq += 1;
        }

        // Merge the two lightest nodes until one is left
        tree.root = loop {
            let first = queue.pop()?;
            let second = match queue.pop() {
                Some(node) => node,
                None => break first.id,
            };
            let id = tree.join(first.id, second.id);
            queue.push(Pending {
                frequency: first.frequency + second.frequency,
                seq,
                id,
            });
            seq += 1;
        };
        Some(tree)
    }

    /// Rebuild a tree from its pre-order walk, restoring parent links. Fails unless the items
    /// describe exactly one full binary tree with distinct leaf symbols.
    pub fn from_preorder(items: &[PreorderItem]) -> Result<Self> {
        if items.is_empty() || items.len() > MAX_NODES {
            return Err(HuffError::CorruptHeader("node count out of range"));
        }
        let mut tree = Self::empty();
        let mut stack: Vec<NodeId> = Vec::with_capacity(items.len());

        // Walking the pre-order sequence backwards, both subtrees of a branch are complete
        // (left on top) by the time the branch itself is reached.
        for item in items.iter().rev() {
            let id = match *item {
                PreorderItem::Leaf(symbol) => {
                    if tree.leaves[symbol as usize].is_some() {
                        return Err(HuffError::CorruptHeader("duplicate leaf symbol"));
                    }
                    tree.push_leaf(symbol, 0)
                }
                PreorderItem::Branch => match (stack.pop(), stack.pop()) {
                    (Some(left), Some(right)) => tree.join(left, right),
                    _ => return Err(HuffError::CorruptHeader("branch without two children")),
                },
            };
            stack.push(id);
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => {
                tree.root = root;
                Ok(tree)
            }
            _ => Err(HuffError::CorruptHeader("nodes do not form a single tree")),
        }
    }

    fn push_leaf(&mut self, symbol: u8, frequency: u64) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            frequency,
            parent: None,
            kind: NodeKind::Leaf { symbol },
        });
        self.leaves[symbol as usize] = Some(id);
        id
    }

    /// Make a new branch owning `left` and `right`.
    fn join(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        let frequency = self.nodes[left.0].frequency + self.nodes[right.0].frequency;
        self.nodes[left.0].parent = Some(id);
        self.nodes[right.0].parent = Some(id);
        self.nodes.push(Node {
            frequency,
            parent: None,
            kind: NodeKind::Branch { left, right },
        });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The child reached from `id` along edge `bit` (false = left), or None from a leaf.
    pub fn child(&self, id: NodeId, bit: bool) -> Option<NodeId> {
        match self.nodes[id.0].kind {
            NodeKind::Branch { left, right } => Some(if bit { right } else { left }),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.iter().flatten().count()
    }

    /// Leaf holding `symbol`, if the symbol is in the tree.
    pub fn leaf(&self, symbol: u8) -> Option<NodeId> {
        self.leaves[symbol as usize]
    }

    /// Derive the code of `symbol` by walking from its leaf up to the root. Each edge is
    /// prepended, so the result is already in root-to-leaf order. A tree that is a single leaf
    /// gives that symbol the one-bit code `0`.
    pub fn code_of(&self, symbol: u8) -> Result<Option<Code>> {
        let mut id = match self.leaves[symbol as usize] {
            Some(id) => id,
            None => return Ok(None),
        };
        let mut bits = 0_u128;
        let mut len = 0_usize;
        while let Some(parent) = self.nodes[id.0].parent {
            if len == MAX_CODE_LEN {
                return Err(HuffError::CodeTooLong(len + 1));
            }
            if let NodeKind::Branch { right, .. } = self.nodes[parent.0].kind {
                if right == id {
                    bits |= 1_u128 << len;
                }
            }
            len += 1;
            id = parent;
        }
        if len == 0 {
            len = 1;
        }
        Ok(Some(Code {
            bits,
            len: len as u8,
        }))
    }

    /// Codes for every symbol in the tree.
    pub fn code_table(&self) -> Result<CodeTable> {
        let mut codes = [None; 256];
        for symbol in 0..=255_u8 {
            codes[symbol as usize] = self.code_of(symbol)?;
        }
        let table = CodeTable { codes };
        for (symbol, code) in table.iter() {
            trace!("{:#04x} -> {}", symbol, code);
        }
        Ok(table)
    }

    /// Iterate the nodes in pre-order: node, left subtree, right subtree.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
        }
    }
}

/// Iterative pre-order walk over a tree.
pub struct Preorder<'a> {
    tree: &'a HuffmanTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = PreorderItem;

    fn next(&mut self) -> Option<PreorderItem> {
        let id = self.stack.pop()?;
        Some(match self.tree.node(id).kind {
            NodeKind::Leaf { symbol } => PreorderItem::Leaf(symbol),
            NodeKind::Branch { left, right } => {
                self.stack.push(right);
                self.stack.push(left);
                PreorderItem::Branch
            }
        })
    }
}
