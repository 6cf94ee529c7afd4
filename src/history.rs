//! Undo history as a stack of full-mask snapshots.
//!
//! `snapshots[i]` always holds the mask as it was *before* mutation `i`.

use std::collections::VecDeque;

use image::RgbaImage;

/// Ordered pre-mutation snapshots of a mask.
#[derive(Debug, Clone, Default)]
pub struct StrokeHistory {
    snapshots: VecDeque<RgbaImage>,
    limit: Option<usize>,
}

impl StrokeHistory {
    /// Create an empty history. `limit` caps the number of snapshots kept;
    /// the oldest are dropped first.
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            snapshots: VecDeque::new(),
            limit,
        }
    }

    /// Record the state before a mutation.
    pub fn push(&mut self, snapshot: RgbaImage) {
        self.snapshots.push_back(snapshot);
        self.prune();
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<RgbaImage> {
        self.snapshots.pop_back()
    }

    /// Number of recorded snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Whether an undo would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.is_empty()
    }

    /// Forget every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Apply `f` to every snapshot in place, oldest first.
    pub fn map_snapshots(&mut self, mut f: impl FnMut(&RgbaImage) -> RgbaImage) {
        for snapshot in &mut self.snapshots {
            *snapshot = f(snapshot);
        }
    }

    /// Total bytes held by all snapshots.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.snapshots.iter().map(|s| s.as_raw().len()).sum()
    }

    fn prune(&mut self) {
        if let Some(limit) = self.limit {
            while self.snapshots.len() > limit {
                self.snapshots.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marked(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([value, 0, 0, 255]))
    }

    #[test]
    fn pop_returns_snapshots_in_reverse_order() {
        let mut history = StrokeHistory::new(None);
        history.push(marked(1));
        history.push(marked(2));
        history.push(marked(3));
        assert_eq!(history.len(), 3);
        assert_eq!(history.pop(), Some(marked(3)));
        assert_eq!(history.pop(), Some(marked(2)));
        assert_eq!(history.pop(), Some(marked(1)));
        assert_eq!(history.pop(), None);
        assert!(!history.can_undo());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut history = StrokeHistory::new(Some(2));
        history.push(marked(1));
        history.push(marked(2));
        history.push(marked(3));
        assert_eq!(history.len(), 2);
        assert_eq!(history.pop(), Some(marked(3)));
        assert_eq!(history.pop(), Some(marked(2)));
        assert!(history.is_empty());
    }

    #[test]
    fn memory_usage_counts_all_snapshots() {
        let mut history = StrokeHistory::default();
        assert_eq!(history.memory_usage(), 0);
        history.push(marked(1));
        history.push(marked(2));
        assert_eq!(history.memory_usage(), 2 * 2 * 2 * 4);
        history.clear();
        assert_eq!(history.memory_usage(), 0);
    }

    #[test]
    fn map_snapshots_rewrites_each_entry() {
        let mut history = StrokeHistory::default();
        history.push(marked(1));
        history.push(marked(2));
        history.map_snapshots(|s| RgbaImage::new(s.width() * 2, s.height()));
        assert_eq!(history.pop().map(|s| s.dimensions()), Some((4, 2)));
    }
}
