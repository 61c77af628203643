//! Pin layout around a block's perimeter.
//!
//! Every side has an anchor where its first pin goes. Further pins on the same
//! side follow in declaration order, one pitch (`PIN_SIZE + PIN_SIZE / 2`)
//! apart: downwards on the left and right sides, rightwards on top and bottom.
//! Left pins sit outside the block's left edge; the other sides overlap the
//! edge by [`PIN_IO_OFFSET`].

use crate::geometry::{Offset, Size};
use crate::graph::{BlockSide, Pin};

pub const BLOCK_WIDTH: f32 = 150.0;
pub const BLOCK_HEIGHT: f32 = 40.0;
/// Edge length of a (square) pin.
pub const PIN_SIZE: f32 = 10.0;
/// How far a pin overlaps the block edge it sits on.
pub const PIN_IO_OFFSET: f32 = 2.0;
/// Distance along the side from the block corner to the first pin.
pub const PIN_SIDE_ANCHOR: f32 = 5.0;
/// Spacing between consecutive pins on one side.
pub const PIN_PITCH: f32 = PIN_SIZE + PIN_SIZE / 2.0;

/// Location of the first pin on `side` for a block of the given size.
pub fn side_anchor(size: Size, side: BlockSide) -> Offset {
    match side {
        BlockSide::Left => Offset::new(-(PIN_SIZE - PIN_IO_OFFSET), PIN_SIDE_ANCHOR),
        BlockSide::Top => Offset::new(PIN_SIDE_ANCHOR, -PIN_IO_OFFSET),
        BlockSide::Right => Offset::new(size.width - PIN_IO_OFFSET, PIN_SIDE_ANCHOR),
        BlockSide::Bottom => Offset::new(PIN_SIDE_ANCHOR, size.height - PIN_IO_OFFSET),
    }
}

/// Recompute the block-relative location of every pin.
///
/// Must be re-run whenever the block's size or pin set changes.
pub fn layout_pins(size: Size, pins: &mut [Pin]) {
    for side in BlockSide::ALL {
        layout_side(size, side, pins);
    }
}

fn layout_side(size: Size, side: BlockSide, pins: &mut [Pin]) {
    let anchor = side_anchor(size, side);
    let horizontal = matches!(side, BlockSide::Top | BlockSide::Bottom);

    let mut shift = 0.0;
    for pin in pins.iter_mut().filter(|p| p.side == side) {
        pin.location = if horizontal {
            Offset::new(anchor.x + shift, anchor.y)
        } else {
            Offset::new(anchor.x, anchor.y + shift)
        };
        shift += PIN_PITCH;
    }
}
