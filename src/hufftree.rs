use std::cmp::Ordering;
use std::fmt;

use crate::code_table::{BitCode, CodeTable};
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;
use crate::min_heap::MinHeap;

#[derive(Debug, Clone)]
pub struct HuffmanTree {
    pub root: HuffNode,
}

impl HuffmanTree {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        HuffmanTree::build(&FrequencyTable::from_bytes(bytes))
    }

    /// Build the tree for a frequency table.
    ///
    /// Leaves are seeded in ascending (weight, byte) order. Each merge pops the
    /// two lightest nodes, the first becoming the left child, and the merged
    /// node queues behind every node already waiting at the same weight.
    pub fn build(frequencies: &FrequencyTable) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        let mut leaves: Vec<(u8, u64)> = frequencies.iter().collect();
        leaves.sort_by_key(|&(_, weight)| weight);

        let nodes: Vec<Ranked> = leaves
            .into_iter()
            .enumerate()
            .map(|(seq, (byte, weight))| Ranked::new(seq, HuffNode::new(byte, weight)))
            .collect();
        let mut next_seq = nodes.len();
        let mut heap = MinHeap::build(nodes);

        while heap.heap_size() > 1 {
            let x = heap.extract_min()?;
            let y = heap.extract_min()?;

            let z = HuffNode::merge(x.node, y.node);

            heap.insert(Ranked::new(next_seq, z));
            next_seq += 1;
        }
        let root = heap.extract_min()?.node;

        Ok(HuffmanTree { root })
    }

    /// Derive the code of every leaf: left edges are `0`, right edges `1`.
    /// A tree that is a single leaf gets the code `0`.
    pub fn generate_table(&self) -> Result<CodeTable> {
        let mut table = CodeTable::new();
        match &self.root {
            HuffNode::Leaf { byte, .. } => {
                let code = BitCode::ROOT.child(false).ok_or_else(too_deep)?;
                table.insert(*byte, code);
            }
            internal => internal.generate_table(&mut table, BitCode::ROOT)?,
        }
        Ok(table)
    }

    /// Sum over leaves of weight times code length.
    pub fn weighted_path_length(&self) -> u64 {
        match &self.root {
            HuffNode::Leaf { weight, .. } => *weight,
            internal => internal.weighted_depth(0),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Huffman Tree Structure:")?;
        self.root.fmt_node(f, 0, "root")
    }
}

fn too_deep() -> CodecError {
    CodecError::malformed_table("tree deeper than the longest representable code")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        byte: u8,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn new(b: u8, f: u64) -> Self {
        HuffNode::Leaf { weight: f, byte: b }
    }

    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn merge(a: Self, b: Self) -> Self {
        // a is the lighter node
        let weight = a.weight() + b.weight();
        HuffNode::Internal {
            weight,
            left: Box::new(a),
            right: Box::new(b),
        }
    }

    fn generate_table(&self, table: &mut CodeTable, code: BitCode) -> Result<()> {
        match self {
            HuffNode::Leaf { byte, .. } => {
                table.insert(*byte, code);
            }
            HuffNode::Internal { left, right, .. } => {
                left.generate_table(table, code.child(false).ok_or_else(too_deep)?)?;
                right.generate_table(table, code.child(true).ok_or_else(too_deep)?)?;
            }
        }
        Ok(())
    }

    fn weighted_depth(&self, depth: u64) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => weight * depth,
            HuffNode::Internal { left, right, .. } => {
                left.weighted_depth(depth + 1) + right.weighted_depth(depth + 1)
            }
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 1,
            HuffNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize, label: &str) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            HuffNode::Leaf { byte, weight } => {
                writeln!(
                    f,
                    "{}{}-> Leaf: {:?} ({}) [weight: {}]",
                    indent, label, *byte as char, byte, weight
                )
            }
            HuffNode::Internal { weight, left, right } => {
                writeln!(f, "{}{}-> Internal [weight: {}]", indent, label, weight)?;
                left.fmt_node(f, depth + 1, "L")?;
                right.fmt_node(f, depth + 1, "R")
            }
        }
    }
}

/// Heap entry: nodes order by weight, then by the order they were queued.
#[derive(Debug)]
struct Ranked {
    seq: usize,
    node: HuffNode,
}

impl Ranked {
    fn new(seq: usize, node: HuffNode) -> Self {
        Ranked { seq, node }
    }

    fn key(&self) -> (u64, usize) {
        (self.node.weight(), self.seq)
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
