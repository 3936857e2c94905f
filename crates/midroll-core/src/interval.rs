use std::collections::BTreeMap;

use midroll_protocol::MemRange;

/// An ordered set of half-open `u64` ranges, coalesced on insert.
///
/// Tracks every scratch range the rebuild stream ever observes; the replay
/// engine provisions exactly this set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeList {
    // base -> end
    spans: BTreeMap<u64, u64>,
}

impl RangeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `range` into the list, merging with any overlapping or
    /// adjacent spans.
    pub fn merge(&mut self, range: MemRange) {
        if range.size == 0 {
            return;
        }
        let mut base = range.base;
        let mut end = range.end();

        // A span starting at or before `end` may overlap or touch us.
        // Absorb every such span that reaches back to `base`.
        let absorbed: Vec<u64> = self
            .spans
            .range(..=end)
            .rev()
            .take_while(|(_, &e)| e >= base)
            .map(|(&b, _)| b)
            .collect();
        for b in absorbed {
            let e = self.spans.remove(&b).unwrap_or(b);
            base = base.min(b);
            end = end.max(e);
        }
        self.spans.insert(base, end);
    }

    /// The coalesced ranges, in ascending base order.
    pub fn ranges(&self) -> Vec<MemRange> {
        self.spans
            .iter()
            .map(|(&base, &end)| MemRange::new(base, end - base))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total bytes covered.
    pub fn total(&self) -> u64 {
        self.spans.iter().map(|(&b, &e)| e - b).sum()
    }

    /// True when `range` lies entirely inside one coalesced span.
    pub fn covers(&self, range: MemRange) -> bool {
        if range.size == 0 {
            return true;
        }
        self.spans
            .range(..=range.base)
            .next_back()
            .map(|(_, &end)| end >= range.end())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_disjoint_ranges() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(0, 16));
        list.merge(MemRange::new(64, 16));
        assert_eq!(
            list.ranges(),
            vec![MemRange::new(0, 16), MemRange::new(64, 16)]
        );
        assert_eq!(list.total(), 32);
    }

    #[test]
    fn merge_overlapping_ranges_coalesces() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(0, 32));
        list.merge(MemRange::new(16, 32));
        assert_eq!(list.ranges(), vec![MemRange::new(0, 48)]);
    }

    #[test]
    fn merge_adjacent_ranges_coalesces() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(0, 16));
        list.merge(MemRange::new(16, 16));
        assert_eq!(list.ranges(), vec![MemRange::new(0, 32)]);
    }

    #[test]
    fn merge_bridging_range_collapses_spans() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(0, 8));
        list.merge(MemRange::new(24, 8));
        list.merge(MemRange::new(4, 24));
        assert_eq!(list.ranges(), vec![MemRange::new(0, 32)]);
    }

    #[test]
    fn zero_size_is_ignored() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(100, 0));
        assert!(list.is_empty());
    }

    #[test]
    fn covers_inner_range() {
        let mut list = RangeList::new();
        list.merge(MemRange::new(8, 32));
        assert!(list.covers(MemRange::new(8, 32)));
        assert!(list.covers(MemRange::new(16, 8)));
        assert!(!list.covers(MemRange::new(0, 16)));
        assert!(!list.covers(MemRange::new(32, 16)));
    }
}
