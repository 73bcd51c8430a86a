//! Visible-window arithmetic for managed lists.
//!
//! The host reports two numbers: the selected row and the selected row's
//! offset from the top of the viewport (`view_position`). Together with the
//! configured maximum visible index they pin down which rows are on screen.

use std::ops::Range;

/// Result of planning a viewport shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPlan {
    /// Row to select so the host scrolls the viewport edge onto it.
    pub push: usize,
    /// Row to select afterwards when the user's selection is not held,
    /// if it is a valid position.
    pub settle: Option<usize>,
}

/// Computes visible ranges and scroll shifts for a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportTracker {
    max_view_index: usize,
}

impl ViewportTracker {
    /// Create a tracker for a viewport whose last visible row offset is
    /// `max_view_index`.
    pub fn new(max_view_index: usize) -> Self {
        Self { max_view_index }
    }

    /// The configured maximum visible row offset.
    pub fn max_view_index(&self) -> usize {
        self.max_view_index
    }

    /// Rows currently in view, as a half-open range.
    ///
    /// Covers `selected - view_position ..= selected + (max_view_index - view_position)`,
    /// clamped to `0..size`. An empty list yields an empty range.
    pub fn view_range(&self, selected: usize, view_position: usize, size: usize) -> Range<usize> {
        if size == 0 {
            return 0..0;
        }
        let selected = selected.min(size - 1);

        let start = selected.saturating_sub(view_position);
        let below = self.max_view_index.saturating_sub(view_position);
        let end = selected.saturating_add(below).saturating_add(1).min(size);
        start..end
    }

    /// Plan a shift of the viewport by `delta` rows.
    ///
    /// A positive delta pushes the selection past the bottom edge so the host
    /// scrolls down; a negative delta pushes past the top edge. Returns `None`
    /// when shifting is disabled (`max_view_index == 0`), the list is empty,
    /// or `delta` is zero.
    pub fn plan_shift(
        &self,
        selected: usize,
        view_position: usize,
        delta: isize,
        size: usize,
    ) -> Option<ShiftPlan> {
        if self.max_view_index == 0 || size == 0 || delta == 0 {
            return None;
        }

        let last = size as isize - 1;
        let selected = (selected as isize).min(last);
        let view_position = view_position as isize;
        let max = self.max_view_index as isize;

        let (push, new_view_position) = if delta > 0 {
            ((selected + (max - view_position).max(0) + delta).min(last), max)
        } else {
            (((selected - view_position).max(0) + delta).max(0), 0)
        };

        let settle = push - (new_view_position - view_position);
        Some(ShiftPlan {
            push: push as usize,
            settle: (0..=last).contains(&settle).then_some(settle as usize),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_range_middle() {
        let viewport = ViewportTracker::new(4);
        // Selected row 10 shown third from the top: rows 8..=12 visible.
        assert_eq!(viewport.view_range(10, 2, 50), 8..13);
    }

    #[test]
    fn test_view_range_includes_last_row() {
        let viewport = ViewportTracker::new(4);
        assert_eq!(viewport.view_range(8, 2, 10), 6..10);
        assert_eq!(viewport.view_range(9, 4, 10), 5..10);
    }

    #[test]
    fn test_view_range_clamps() {
        let viewport = ViewportTracker::new(9);
        assert_eq!(viewport.view_range(0, 0, 3), 0..3);
        assert_eq!(viewport.view_range(0, 0, 0), 0..0);
        // Stale selection past the end is clamped to the last row.
        assert_eq!(viewport.view_range(7, 0, 3), 2..3);
        // A view position larger than the selection cannot reach above row 0.
        assert_eq!(viewport.view_range(1, 5, 20), 0..6);
    }

    #[test]
    fn test_shift_disabled() {
        assert_eq!(ViewportTracker::new(0).plan_shift(3, 1, 2, 10), None);
        assert_eq!(ViewportTracker::new(4).plan_shift(3, 1, 0, 10), None);
        assert_eq!(ViewportTracker::new(4).plan_shift(0, 0, 1, 0), None);
    }

    #[test]
    fn test_shift_down() {
        let viewport = ViewportTracker::new(4);
        // Rows 8..=12 visible, row 10 selected at offset 2.
        let plan = viewport.plan_shift(10, 2, 3, 50).unwrap();
        assert_eq!(plan.push, 15);
        assert_eq!(plan.settle, Some(13));
    }

    #[test]
    fn test_shift_down_at_bottom_boundary() {
        let viewport = ViewportTracker::new(4);
        let plan = viewport.plan_shift(8, 2, 3, 10).unwrap();
        assert_eq!(plan.push, 9);
        assert_eq!(plan.settle, Some(7));
    }

    #[test]
    fn test_shift_up() {
        let viewport = ViewportTracker::new(4);
        let plan = viewport.plan_shift(10, 2, -3, 50).unwrap();
        assert_eq!(plan.push, 5);
        assert_eq!(plan.settle, Some(7));
    }

    #[test]
    fn test_shift_up_at_top_boundary() {
        let viewport = ViewportTracker::new(4);
        let plan = viewport.plan_shift(1, 1, -3, 10).unwrap();
        assert_eq!(plan.push, 0);
        assert_eq!(plan.settle, Some(1));

        let plan = viewport.plan_shift(0, 0, -1, 10).unwrap();
        assert_eq!(plan.push, 0);
        assert_eq!(plan.settle, Some(0));
    }

    #[test]
    fn test_view_position_beyond_selection() {
        let viewport = ViewportTracker::new(4);
        // The top edge clamps at row 0 but the bottom edge keeps the offset.
        assert_eq!(viewport.view_range(1, 3, 20), 0..3);
        assert_eq!(viewport.view_range(0, 4, 20), 0..1);

        let plan = viewport.plan_shift(1, 3, 2, 20).unwrap();
        assert_eq!(plan.push, 4);
        assert_eq!(plan.settle, Some(3));

        let plan = viewport.plan_shift(1, 3, -1, 20).unwrap();
        assert_eq!(plan.push, 0);
        assert_eq!(plan.settle, Some(3));
    }

    #[test]
    fn test_shift_single_row_list() {
        let viewport = ViewportTracker::new(4);
        let plan = viewport.plan_shift(0, 0, 5, 1).unwrap();
        assert_eq!(plan.push, 0);
        assert_eq!(plan.settle, None);
    }
}
