use crate::graph::{BlockId, ConnectionId};

/// What is currently selected: at most one block or one connection, never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Block(BlockId),
    Connection(ConnectionId),
}

impl Selection {
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Selection::Block(id) => Some(*id),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            Selection::Connection(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// Select a block, dropping any selected connection.
    pub fn select_block(&mut self, id: BlockId) {
        *self = Selection::Block(id);
    }

    /// Select a connection, dropping any selected block.
    pub fn select_connection(&mut self, id: ConnectionId) {
        *self = Selection::Connection(id);
    }

    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    /// Forget the selection if it refers to `id` (block or connection).
    pub fn forget(&mut self, id: uuid::Uuid) {
        if self.block() == Some(id) || self.connection() == Some(id) {
            self.clear();
        }
    }
}
