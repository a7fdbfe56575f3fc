//! Reuse trie: a prefix tree over sequences of `BblId`s, where each
//! root-to-leaf path spells one reuse segment (§3, §4.2).

use crate::ids::{BblId, CostSite, Cost};
use std::collections::BTreeMap;

/// An unordered set of BblIds sharing a cache line, with a distinguished
/// head (the block whose write opened the segment) and an occurrence
/// count. Insertion order (excluding duplicates) is preserved because it
/// becomes the trie path.
#[derive(Clone, Debug, Default)]
pub struct ReuseSegment {
    pub head: BblId,
    pub count: u64,
    members: Vec<BblId>,
}

impl ReuseSegment {
    pub fn new(head: BblId, count: u64) -> Self {
        ReuseSegment {
            head,
            count,
            members: Vec::new(),
        }
    }

    /// Adds a member, preserving insertion order and suppressing
    /// duplicates (set semantics).
    pub fn insert(&mut self, id: BblId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn members(&self) -> &[BblId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One node of the reuse trie. Sibling edges are keyed uniquely by
/// `BblId` in a `BTreeMap` so traversal order is deterministic.
#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<BblId, TrieNode>,
    is_leaf: bool,
    /// Only meaningful when `is_leaf`. A node can be both internal and a
    /// leaf when one segment is a strict prefix of another.
    leaf_count: u64,
}

#[derive(Debug, Default)]
pub struct ReuseTrie {
    root: TrieNode,
}

/// A leaf identified by the path of `BblId`s from the root, used so
/// callers can re-export/traverse without holding a borrow into the trie.
#[derive(Clone, Debug)]
pub struct LeafHandle {
    pub path: Vec<BblId>,
    pub count: u64,
}

impl LeafHandle {
    /// Reconstructs the `ReuseSegment` this leaf was exported from: head is
    /// the first element of the insertion-order path, members are the path
    /// in full (§4.2 "Segment export").
    pub fn to_segment(&self) -> ReuseSegment {
        let head = *self.path.first().unwrap_or(&0);
        let mut seg = ReuseSegment::new(head, self.count);
        for &id in &self.path {
            seg.insert(id);
        }
        seg
    }
}

impl ReuseTrie {
    pub fn new() -> Self {
        ReuseTrie::default()
    }

    /// Inserts a segment, merging common prefixes with whatever is
    /// already in the trie and summing the count at the terminal leaf.
    pub fn insert(&mut self, segment: &ReuseSegment) {
        let mut node = &mut self.root;
        for &id in segment.members() {
            node = node.children.entry(id).or_default();
        }
        node.is_leaf = true;
        node.leaf_count += segment.count;
    }

    /// Enumerates all leaves as `(path, count)`, sorted descending by
    /// `count * max_reuse_unit` ("importance", §4.2).
    pub fn leaves_by_importance(&self, max_reuse_unit: Cost) -> Vec<LeafHandle> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        collect_leaves(&self.root, &mut path, &mut out);
        out.sort_by(|a, b| {
            let ia = a.count as f64 * max_reuse_unit;
            let ib = b.count as f64 * max_reuse_unit;
            ib.partial_cmp(&ia).unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }

    /// Root-level children, for the traversal the cost oracle needs
    /// (§4.3): `(child_bblid, subtree)` pairs in deterministic order.
    fn root_children(&self) -> impl Iterator<Item = (&BblId, &TrieNode)> {
        self.root.children.iter()
    }

    /// Traverses the trie accumulating reuse cost for a given decision
    /// (§4.3). `decision(bblid)` must never return `CostSite::Invalid`
    /// for a bblid that appears in the trie when used for final
    /// evaluation; `leaf_cost(site)` returns the flush+fetch charge for a
    /// leaf reached on a path with at least one differing pair.
    pub fn reuse_cost<D, F>(&self, decision: &D, leaf_cost: F) -> Cost
    where
        D: Fn(BblId) -> CostSite,
        F: Fn(CostSite) -> Cost,
    {
        let mut cost = 0.0;
        for (&child_id, child) in self.root_children() {
            walk(child_id, child, decision, &leaf_cost, false, &mut cost);
        }
        cost
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// All leaves as freshly-reconstructed `ReuseSegment`s, for
    /// round-tripping the trie's contents (§8).
    pub fn export_all_segments(&self) -> Vec<ReuseSegment> {
        self.leaves_by_importance(1.0)
            .iter()
            .map(LeafHandle::to_segment)
            .collect()
    }

    /// Structural isomorphism: same multiset of (path, count) pairs,
    /// regardless of insertion order (§8 round-trip property).
    pub fn isomorphic_to(&self, other: &ReuseTrie) -> bool {
        let mut a: Vec<(Vec<BblId>, u64)> = self
            .leaves_by_importance(1.0)
            .into_iter()
            .map(|l| (l.path, l.count))
            .collect();
        let mut b: Vec<(Vec<BblId>, u64)> = other
            .leaves_by_importance(1.0)
            .into_iter()
            .map(|l| (l.path, l.count))
            .collect();
        a.sort();
        b.sort();
        a == b
    }
}

fn collect_leaves(node: &TrieNode, path: &mut Vec<BblId>, out: &mut Vec<LeafHandle>) {
    if node.is_leaf {
        out.push(LeafHandle {
            path: path.clone(),
            count: node.leaf_count,
        });
    }
    for (&id, child) in &node.children {
        path.push(id);
        collect_leaves(child, path, out);
        path.pop();
    }
}

fn walk<D, F>(
    bblid: BblId,
    node: &TrieNode,
    decision: &D,
    leaf_cost: &F,
    parent_different: bool,
    cost: &mut Cost,
) where
    D: Fn(BblId) -> CostSite,
    F: Fn(CostSite) -> Cost,
{
    if node.is_leaf && parent_different {
        // An unresolved (Invalid) leaf can't be charged yet; this is the
        // tolerance partial-trie evaluation needs during batch search.
        if let site @ (CostSite::Cpu | CostSite::Pim) = decision(bblid) {
            *cost += node.leaf_count as f64 * leaf_cost(site);
        }
    }
    for (&child_id, child) in &node.children {
        let is_different = parent_different || decision(bblid) != decision(child_id);
        walk(child_id, child, decision, leaf_cost, is_different, cost);
    }
}
