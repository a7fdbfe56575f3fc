//! Union-find over `BblId`, used by the SCA strategy to coalesce basic
//! blocks that share cache-line data-movement traffic (§4.8).

use crate::ids::BblId;

#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<BblId>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n as BblId).collect(),
            rank: vec![0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Finds the representative of `id`'s set, compressing the path
    /// traversed along the way.
    pub fn find(&mut self, id: BblId) -> BblId {
        if self.parent[id as usize] != id {
            let root = self.find(self.parent[id as usize]);
            self.parent[id as usize] = root;
        }
        self.parent[id as usize]
    }

    /// Merges the sets containing `a` and `b`, by rank. Returns `true` if
    /// they were previously in different sets.
    pub fn union(&mut self, a: BblId, b: BblId) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (ra, rb) = if self.rank[ra as usize] < self.rank[rb as usize] {
            (rb, ra)
        } else {
            (ra, rb)
        };
        self.parent[rb as usize] = ra;
        if self.rank[ra as usize] == self.rank[rb as usize] {
            self.rank[ra as usize] += 1;
        }
        true
    }

    pub fn same_set(&mut self, a: BblId, b: BblId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Groups every id by its set representative, in ascending
    /// representative then member order.
    pub fn groups(&mut self) -> Vec<Vec<BblId>> {
        let n = self.parent.len();
        let mut roots = Vec::with_capacity(n);
        for id in 0..n as BblId {
            roots.push(self.find(id));
        }
        let mut groups: std::collections::BTreeMap<BblId, Vec<BblId>> =
            std::collections::BTreeMap::new();
        for id in 0..n as BblId {
            groups.entry(roots[id as usize]).or_default().push(id);
        }
        groups.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_set_has_everyone_singleton() {
        let mut ds = DisjointSet::new(4);
        assert!(!ds.same_set(0, 1));
        assert_eq!(ds.groups().len(), 4);
    }

    #[test]
    fn union_merges_transitively() {
        let mut ds = DisjointSet::new(5);
        ds.union(0, 1);
        ds.union(1, 2);
        assert!(ds.same_set(0, 2));
        assert!(!ds.same_set(0, 3));
    }

    #[test]
    fn union_returns_false_when_already_merged() {
        let mut ds = DisjointSet::new(3);
        assert!(ds.union(0, 1));
        assert!(!ds.union(0, 1));
    }

    #[test]
    fn groups_partitions_all_members() {
        let mut ds = DisjointSet::new(6);
        ds.union(0, 1);
        ds.union(2, 3);
        let groups = ds.groups();
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, 6);
        assert!(groups.iter().any(|g| g.contains(&0) && g.contains(&1)));
        assert!(groups.iter().any(|g| g.contains(&2) && g.contains(&3)));
    }
}
