use crate::graph::{BlockId, ConnectionId, PinId};
use std::fmt;
use thiserror::Error;

/// Why two pins may not be joined by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRule {
    /// Start and end are the same pin
    SamePin,
    /// Both pins are inputs or both are outputs
    DirectionMismatch,
    /// Pins carry different signal types (e.g. digital vs analogue)
    SignalTypeMismatch,
    /// The pin already takes part in another connection
    PinOccupied { block: BlockId, pin: PinId },
}

impl fmt::Display for ConnectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePin => write!(f, "cannot connect a pin to itself"),
            Self::DirectionMismatch => write!(f, "must connect an output to an input"),
            Self::SignalTypeMismatch => write!(f, "signal types do not match"),
            Self::PinOccupied { block, pin } => {
                write!(f, "pin {} on block {} is already connected", pin, block)
            }
        }
    }
}

/// Errors raised by the graph model, the template registry and the designer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Incompatible connection: {0}")]
    IncompatibleConnection(ConnectionRule),

    #[error("Connection {connection:?} refers to missing block {block} (pin {pin:?})")]
    DanglingReference {
        connection: Option<ConnectionId>,
        block: BlockId,
        pin: Option<PinId>,
    },

    #[error("Block type '{0}' is not registered")]
    UnknownTemplate(String),

    #[error("Block {0} not found")]
    UnknownBlock(BlockId),

    #[error("Block {0} already exists")]
    DuplicateBlock(BlockId),

    #[error("Connection {0} not found")]
    UnknownConnection(ConnectionId),
}

impl From<ConnectionRule> for FlowError {
    fn from(rule: ConnectionRule) -> Self {
        FlowError::IncompatibleConnection(rule)
    }
}

pub type Result<T, E = FlowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_rule_display() {
        assert_eq!(
            ConnectionRule::DirectionMismatch.to_string(),
            "must connect an output to an input"
        );
        assert_eq!(
            ConnectionRule::SignalTypeMismatch.to_string(),
            "signal types do not match"
        );
        assert_eq!(ConnectionRule::SamePin.to_string(), "cannot connect a pin to itself");
    }

    #[test]
    fn test_error_display_names_rule() {
        let err = FlowError::from(ConnectionRule::DirectionMismatch);
        assert_eq!(
            err.to_string(),
            "Incompatible connection: must connect an output to an input"
        );
    }

    #[test]
    fn test_unknown_template_display() {
        let err = FlowError::UnknownTemplate("nand".into());
        assert_eq!(err.to_string(), "Block type 'nand' is not registered");
    }

    #[test]
    fn test_duplicate_block_display() {
        let err = FlowError::DuplicateBlock(Uuid::nil());
        assert_eq!(err.to_string(), format!("Block {} already exists", Uuid::nil()));
    }

    #[test]
    fn test_dangling_reference_mentions_block() {
        let block = Uuid::nil();
        let err = FlowError::DanglingReference {
            connection: None,
            block,
            pin: None,
        };
        assert!(err.to_string().contains(&block.to_string()));
    }
}
