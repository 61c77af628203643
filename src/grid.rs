use crate::geometry::{Offset, Size};

/// A straight guide line from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub start: Offset,
    pub end: Offset,
}

/// Lazy sequence of grid guide lines for a viewport.
///
/// Horizontal lines come first (`y = 0, g, 2g, ...` while `y < height`), then
/// vertical lines (`x = 0, g, ...` while `x < width`). The iterator is finite
/// and `Clone`, so a renderer can restart it by cloning before iterating.
///
/// # Example
/// ```
/// use flow_designer::{grid_lines, Size};
///
/// let lines = grid_lines(Size::new(100.0, 50.0), 25.0);
/// assert_eq!(lines.clone().count(), 2 + 4);
/// ```
#[derive(Debug, Clone)]
pub struct GridLines {
    view: Size,
    spacing: f32,
    // Index of the next horizontal line, then of the next vertical line.
    row: u32,
    column: u32,
}

/// Create the grid line sequence for the given viewport and grid size.
///
/// Yields nothing when the viewport is smaller than one grid cell in either
/// dimension, or when `grid_size` is not a positive number.
pub fn grid_lines(view: Size, grid_size: f32) -> GridLines {
    GridLines {
        view,
        spacing: grid_size,
        row: 0,
        column: 0,
    }
}

impl GridLines {
    fn is_empty_grid(&self) -> bool {
        self.spacing.is_nan()
            || self.spacing <= 0.0
            || self.view.width < self.spacing || self.view.height < self.spacing
    }

    fn rows(&self) -> u32 {
        (self.view.height / self.spacing).ceil() as u32
    }

    fn columns(&self) -> u32 {
        (self.view.width / self.spacing).ceil() as u32
    }
}

impl Iterator for GridLines {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.is_empty_grid() {
            return None;
        }

        if self.row < self.rows() {
            let y = self.row as f32 * self.spacing;
            self.row += 1;
            return Some(Line {
                start: Offset::new(0.0, y),
                end: Offset::new(self.view.width, y),
            });
        }

        if self.column < self.columns() {
            let x = self.column as f32 * self.spacing;
            self.column += 1;
            return Some(Line {
                start: Offset::new(x, 0.0),
                end: Offset::new(x, self.view.height),
            });
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_empty_grid() {
            return (0, Some(0));
        }
        let remaining = (self.rows() - self.row.min(self.rows())) as usize
            + (self.columns() - self.column.min(self.columns())) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridLines {}
