//! Stacking order of blocks.
//!
//! Each block carries a persistent rank (`Block::z_order`). After every
//! operation the ranks are renumbered to `0..N-1` preserving relative order,
//! so the stack is always gap-free and collision-free. The value a renderer
//! uses is `rank + z_boost`; only the block being dragged has a non-zero boost.

use crate::graph::{Block, BlockId};
use std::fmt;
use std::str::FromStr;

/// Stacking change requested for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrderAction {
    Front,
    Back,
    Up,
    Down,
}

impl FromStr for ZOrderAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown z-order action '{}'", other)),
        }
    }
}

impl fmt::Display for ZOrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.write_str(name)
    }
}

/// Helper functions for z-order operations on a block collection.
pub struct ZOrder;

impl ZOrder {
    /// Apply `action` to block `id`. Returns false if the block is not in `blocks`.
    pub fn apply(blocks: &mut [Block], id: BlockId, action: ZOrderAction) -> bool {
        match action {
            ZOrderAction::Front => Self::front(blocks, id),
            ZOrderAction::Back => Self::back(blocks, id),
            ZOrderAction::Up => Self::up(blocks, id),
            ZOrderAction::Down => Self::down(blocks, id),
        }
    }

    /// Move the block above every other block.
    pub fn front(blocks: &mut [Block], id: BlockId) -> bool {
        let Some(max) = blocks.iter().map(|b| b.z_order).max() else {
            return false;
        };
        let Some(block) = blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.z_order = max + 1;
        Self::compact(blocks);
        true
    }

    /// Move the block below every other block.
    pub fn back(blocks: &mut [Block], id: BlockId) -> bool {
        let Some(min) = blocks.iter().map(|b| b.z_order).min() else {
            return false;
        };
        let Some(block) = blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.z_order = min - 1;
        Self::compact(blocks);
        true
    }

    /// Swap ranks with the block immediately above. No-op for the top block.
    pub fn up(blocks: &mut [Block], id: BlockId) -> bool {
        Self::swap_with_neighbour(blocks, id, 1)
    }

    /// Swap ranks with the block immediately below. No-op for the bottom block.
    pub fn down(blocks: &mut [Block], id: BlockId) -> bool {
        Self::swap_with_neighbour(blocks, id, -1)
    }

    fn swap_with_neighbour(blocks: &mut [Block], id: BlockId, step: i32) -> bool {
        Self::compact(blocks);
        let Some(index) = blocks.iter().position(|b| b.id == id) else {
            return false;
        };
        let rank = blocks[index].z_order;
        if let Some(other) = blocks.iter().position(|b| b.z_order == rank + step) {
            blocks[other].z_order = rank;
            blocks[index].z_order = rank + step;
        }
        true
    }

    /// Renumber ranks to `0..N-1`, keeping relative order. Ties keep
    /// collection order.
    pub fn compact(blocks: &mut [Block]) {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&i| (blocks[i].z_order, i));
        for (rank, index) in order.into_iter().enumerate() {
            blocks[index].z_order = rank as i32;
        }
    }

    /// Rank one above the current top, for a block joining the collection.
    pub fn next_rank(blocks: &[Block]) -> i32 {
        blocks.iter().map(|b| b.z_order + 1).max().unwrap_or(0)
    }

    /// Check that ranks form a permutation of `0..N-1`.
    pub fn is_dense(blocks: &[Block]) -> bool {
        let mut ranks: Vec<i32> = blocks.iter().map(|b| b.z_order).collect();
        ranks.sort_unstable();
        ranks.iter().enumerate().all(|(i, &r)| r == i as i32)
    }
}
