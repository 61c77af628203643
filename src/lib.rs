//! # Flow Designer
//!
//! Graph-editing engine for node based flow editors: function blocks with
//! typed input/output pins, connections between them, stacking order and the
//! pointer/keyboard interaction that edits it all.
//!
//! The crate draws nothing. A rendering layer (Slint, or anything else) reads
//! the designer's views, forwards element-tagged input through the
//! [`EventRouter`] and redraws when [`FlowDesigner::version`] moves.
//!
//! ## Quick Start
//!
//! ```
//! use flow_designer::{EditorConfig, FlowDesigner, Offset, TemplateAttributes, TemplateRegistry};
//!
//! let mut designer =
//!     FlowDesigner::new(EditorConfig::default(), TemplateRegistry::with_logic_gates());
//! let gate = designer
//!     .add_block_from_template("and", &TemplateAttributes::default(), Offset::new(40.0, 40.0))
//!     .unwrap();
//!
//! assert_eq!(designer.graph().block(gate).unwrap().pins.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`graph`] - Blocks, pins, connections and the compatibility rules
//! - [`catalog`] - Function templates and the [`TemplateRegistry`]
//! - [`designer`] - The [`FlowDesigner`] interaction state machine and its views
//! - [`events`] - [`EventBus`], [`EventRouter`] and the domain event names
//! - [`zorder`] - Stacking order operations
//! - [`layout`] / [`hit_test`] / [`grid`] - Geometry helpers
//! - [`render`] - [`SceneModels`], syncing views into Slint `VecModel`s

pub mod catalog;
pub mod config;
pub mod designer;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod layout;
pub mod render;
pub mod selection;
pub mod zorder;

pub use catalog::{Behavior, FunctionTemplate, PinTemplate, TemplateAttributes, TemplateRegistry};
pub use config::EditorConfig;
pub use designer::{
    BlockView, ConnectHint, Connecting, ConnectingView, ConnectionView, DragState, DropPolicy,
    FlowDesigner, GridSnap, InteractionState, NoOverlapDrop, PinView, SnapPolicy,
};
pub use error::{ConnectionRule, FlowError, Result};
pub use events::{
    configure_pointer_events, ElementKind, ElementTarget, EventBus, EventFilter, EventName,
    EventRouter, FlowEvent, FlowTarget, Key, PointerEvent, PointerGesture, RawInput, SubscriptionId,
};
pub use geometry::{BoundingBox, Offset, Size};
pub use graph::{
    Block, BlockId, BlockSide, Connection, ConnectionId, Graph, Pin, PinDirection, PinId,
    SignalType,
};
pub use grid::{grid_lines, GridLines, Line};
pub use hit_test::{hit_pins, topmost_block_at, topmost_pin_at, PinHit};
pub use render::{BlockRow, ConnectingRow, ConnectionRow, GridLineRow, PinRow, SceneModels};
pub use selection::Selection;
pub use zorder::{ZOrder, ZOrderAction};
