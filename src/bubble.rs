//! Bubble: one slot's occupant (kind, slot coordinates, selection and pop flags).

/// A single bubble on the board. `column`/`row` always describe the slot it sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bubble {
    kind: u8,
    column: usize,
    row: usize,
    selected: bool,
    popped: bool,
}

impl Bubble {
    pub fn new(kind: u8, column: usize, row: usize) -> Self {
        Self {
            kind,
            column,
            row,
            selected: false,
            popped: false,
        }
    }

    /// Colour index, used for match equality and theme lookup.
    #[inline]
    pub fn kind(&self) -> u8 {
        self.kind
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// (column, row) of the slot.
    #[inline]
    pub fn cell(&self) -> (usize, usize) {
        (self.column, self.row)
    }

    /// Only the board moves bubbles between slots (collapse).
    pub(crate) fn move_to_row(&mut self, row: usize) {
        self.row = row;
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_popped(&self) -> bool {
        self.popped
    }

    pub fn mark_popped(&mut self) {
        self.popped = true;
        self.selected = false;
    }

    /// Top-left of this bubble's slot in a layout of fixed-size cells offset by a margin.
    /// Saturates at `u16::MAX` instead of wrapping.
    pub fn origin(
        &self,
        cell_width: u16,
        cell_height: u16,
        margin_x: u16,
        margin_y: u16,
    ) -> (u16, u16) {
        let offset = |index: usize, size: u16, margin: u16| {
            u16::try_from(index)
                .unwrap_or(u16::MAX)
                .saturating_mul(size)
                .saturating_add(margin)
        };
        (
            offset(self.column, cell_width, margin_x),
            offset(self.row, cell_height, margin_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bubble_is_idle() {
        let b = Bubble::new(3, 0, 1);
        assert_eq!(b.kind(), 3);
        assert_eq!(b.cell(), (0, 1));
        assert!(!b.is_selected());
        assert!(!b.is_popped());
    }

    #[test]
    fn test_mark_popped_drops_selection() {
        let mut b = Bubble::new(0, 2, 2);
        b.set_selected(true);
        b.mark_popped();
        assert!(b.is_popped());
        assert!(!b.is_selected());
    }

    #[test]
    fn test_origin_uses_cell_size_and_margin() {
        let b = Bubble::new(1, 4, 3);
        assert_eq!(b.origin(2, 1, 10, 5), (18, 8));
        assert_eq!(Bubble::new(1, 0, 0).origin(2, 1, 10, 5), (10, 5));
    }

    #[test]
    fn test_origin_saturates_far_from_screen() {
        assert_eq!(Bubble::new(0, 40_000, 2).origin(2, 1, 10, 5), (u16::MAX, 7));
        assert_eq!(Bubble::new(0, 1, 70_000).origin(2, 1, 0, 0), (2, u16::MAX));
    }
}
