//! Sparse from→to control-switch transition counts (§3).

use crate::ids::BblId;
use std::collections::BTreeMap;

/// Sparse `to_bblid -> count` mapping for a single `from_bblid`.
#[derive(Clone, Debug, Default)]
pub struct SwitchCountRow {
    pub from: BblId,
    tos: BTreeMap<BblId, u64>,
}

impl SwitchCountRow {
    pub fn new(from: BblId) -> Self {
        SwitchCountRow {
            from,
            tos: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, to: BblId, count: u64) {
        *self.tos.entry(to).or_insert(0) += count;
    }

    pub fn iter(&self) -> impl Iterator<Item = (BblId, u64)> + '_ {
        self.tos.iter().map(|(&to, &c)| (to, c))
    }
}

/// Ordered sequence of switch-count rows, sorted by `from` after
/// ingestion for deterministic traversal (§3).
#[derive(Clone, Debug, Default)]
pub struct SwitchCountTable {
    rows: BTreeMap<BblId, SwitchCountRow>,
}

impl SwitchCountTable {
    pub fn new() -> Self {
        SwitchCountTable::default()
    }

    pub fn add(&mut self, from: BblId, to: BblId, count: u64) {
        self.rows
            .entry(from)
            .or_insert_with(|| SwitchCountRow::new(from))
            .add(to, count);
    }

    /// Rows in ascending `from` order.
    pub fn rows(&self) -> impl Iterator<Item = &SwitchCountRow> {
        self.rows.values()
    }

    pub fn row(&self, from: BblId) -> Option<&SwitchCountRow> {
        self.rows.get(&from)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates_and_sorts_by_from() {
        let mut t = SwitchCountTable::new();
        t.add(1, 2, 5);
        t.add(0, 1, 3);
        t.add(1, 2, 2);

        let froms: Vec<BblId> = t.rows().map(|r| r.from).collect();
        assert_eq!(froms, vec![0, 1]);

        let row1 = t.row(1).unwrap();
        let tos: Vec<(BblId, u64)> = row1.iter().collect();
        assert_eq!(tos, vec![(2, 7)]);
    }
}
