// Cut list - Ordered collection of committed ranges

use tracing::debug;

use crate::domain::model::{Cut, CutId, TimeRange};

/// Committed cuts in insertion order.
///
/// Cuts may overlap and are never re-sorted; insertion order is export order.
#[derive(Debug, Default, Clone)]
pub struct CutList {
    cuts: Vec<Cut>,
}

impl CutList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a range under a fresh identifier
    pub fn add(&mut self, range: TimeRange) -> Cut {
        let mut id = CutId::generate();
        while self.get(id).is_some() {
            id = CutId::generate();
        }

        let cut = Cut { id, range };
        self.cuts.push(cut.clone());
        debug!(cut_id = %id, start = range.start(), end = range.end(), "cut added");
        cut
    }

    /// Remove by id; removing an unknown id is a no-op
    pub fn remove(&mut self, id: CutId) -> Option<Cut> {
        let index = self.cuts.iter().position(|cut| cut.id == id)?;
        let removed = self.cuts.remove(index);
        debug!(cut_id = %id, "cut removed");
        Some(removed)
    }

    pub fn get(&self, id: CutId) -> Option<&Cut> {
        self.cuts.iter().find(|cut| cut.id == id)
    }

    pub fn list(&self) -> &[Cut] {
        &self.cuts
    }

    /// Ranges in export order; empty when nothing has been committed
    pub fn export_ranges(&self) -> Vec<TimeRange> {
        self.cuts.iter().map(|cut| cut.range).collect()
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn clear(&mut self) {
        self.cuts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: f64, end: f64) -> TimeRange {
        TimeRange::new(start, end, None).unwrap()
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cuts = CutList::new();
        cuts.add(range(30.0, 40.0));
        cuts.add(range(5.0, 10.0));
        cuts.add(range(20.0, 25.0));

        let starts: Vec<f64> = cuts.export_ranges().iter().map(|r| r.start()).collect();
        assert_eq!(starts, vec![30.0, 5.0, 20.0]);
    }

    #[test]
    fn test_overlapping_cuts_are_kept() {
        let mut cuts = CutList::new();
        cuts.add(range(0.0, 10.0));
        cuts.add(range(5.0, 15.0));
        assert_eq!(cuts.len(), 2);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut cuts = CutList::new();
        let ids: Vec<CutId> = (0..50).map(|i| cuts.add(range(i as f64, i as f64 + 1.0)).id).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut cuts = CutList::new();
        let a = cuts.add(range(1.0, 2.0));
        let b = cuts.add(range(3.0, 4.0));
        let c = cuts.add(range(5.0, 6.0));

        let removed = cuts.remove(b.id).unwrap();
        assert_eq!(removed.range, b.range);

        let ids: Vec<CutId> = cuts.list().iter().map(|cut| cut.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cuts = CutList::new();
        let cut = cuts.add(range(1.0, 2.0));
        assert!(cuts.remove(cut.id).is_some());
        assert!(cuts.remove(cut.id).is_none());
        assert!(cuts.is_empty());
    }

    #[test]
    fn test_empty_list_exports_nothing() {
        let cuts = CutList::new();
        assert!(cuts.export_ranges().is_empty());
    }
}
