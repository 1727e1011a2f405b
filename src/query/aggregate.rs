use std::collections::HashMap;

use serde::Serialize;

/// One (value, count) pair in a top-values table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    /// The cleaned cell value
    pub value: String,
    /// How many matching rows carried it
    pub count: u64,
}

/// Streaming frequency table with top-N extraction.
///
/// Counts are accumulated in one pass over the scan; ties in the top-N are
/// broken by first-encountered order, so results are deterministic for a
/// fixed dataset and filter.
#[derive(Debug, Default)]
pub struct TopCounts {
    counts: HashMap<String, (u64, usize)>,
    next_rank: usize,
}

impl TopCounts {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `value`.
    pub fn observe(&mut self, value: &str) {
        match self.counts.get_mut(value) {
            Some((count, _)) => *count += 1,
            None => {
                self.counts.insert(value.to_string(), (1, self.next_rank));
                self.next_rank += 1;
            }
        }
    }

    /// Total occurrences observed.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|(c, _)| c).sum()
    }

    /// Number of distinct values observed.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// The `n` most frequent values, descending by count, ties by
    /// first-encountered scan order.
    pub fn top(&self, n: usize) -> Vec<ValueCount> {
        let mut entries: Vec<(&String, &(u64, usize))> = self.counts.iter().collect();
        entries.sort_by(|(_, (ca, ra)), (_, (cb, rb))| cb.cmp(ca).then(ra.cmp(rb)));
        entries
            .into_iter()
            .take(n)
            .map(|(value, (count, _))| ValueCount {
                value: value.clone(),
                count: *count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_orders_by_count_descending() {
        let mut agg = TopCounts::new();
        for v in ["a", "b", "b", "c", "c", "c"] {
            agg.observe(v);
        }
        let top = agg.top(2);
        assert_eq!(top[0].value, "c");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].value, "b");
        assert_eq!(top[1].count, 2);
    }

    #[test]
    fn test_ties_break_by_first_encountered() {
        let mut agg = TopCounts::new();
        for v in ["late", "early", "early", "late"] {
            agg.observe(v);
        }
        let top = agg.top(2);
        assert_eq!(top[0].value, "late");
        assert_eq!(top[1].value, "early");
    }

    #[test]
    fn test_top_n_bounds() {
        let mut agg = TopCounts::new();
        for v in ["a", "b", "c"] {
            agg.observe(v);
        }
        assert_eq!(agg.top(10).len(), 3);
        assert_eq!(agg.top(0).len(), 0);
        assert_eq!(agg.distinct(), 3);
        assert_eq!(agg.total(), 3);
    }
}
