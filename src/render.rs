//! Slint model bindings for the designer's views.
//!
//! [`SceneModels`] keeps Slint `VecModel`s in step with a [`FlowDesigner`].
//! The host binds one model per element kind together with a constructor that
//! turns a row into its generated Slint struct, then calls
//! [`SceneModels::sync`] whenever the designer reports a change.
//!
//! # Example
//!
//! ```ignore
//! use flow_designer::{FlowDesigner, SceneModels};
//! use slint::{ModelRc, VecModel};
//! use std::rc::Rc;
//!
//! slint::include_modules!();
//!
//! let blocks = Rc::new(VecModel::<BlockData>::default());
//! window.set_blocks(ModelRc::from(blocks.clone()));
//!
//! let mut scene = SceneModels::new();
//! scene.bind_blocks(blocks, |row| BlockData {
//!     id: row.id.clone(),
//!     label: row.label.clone(),
//!     x: row.x,
//!     y: row.y,
//!     selected: row.selected,
//! });
//!
//! scene.sync(&mut designer.borrow_mut());
//! ```

use crate::designer::{
    BlockView, ConnectHint, ConnectingView, ConnectionView, FlowDesigner, PinView,
};
use crate::graph::{BlockSide, PinDirection};
use crate::grid::Line;
use slint::{Color, Model, SharedString, VecModel};
use std::rc::Rc;

/// Connection hint colours for the in-progress path.
pub const HINT_NEUTRAL: Color = Color::from_rgb_u8(160, 160, 160);
pub const HINT_VALID: Color = Color::from_rgb_u8(90, 200, 120);
pub const HINT_INVALID: Color = Color::from_rgb_u8(230, 80, 80);

impl ConnectHint {
    pub fn color(&self) -> Color {
        match self {
            ConnectHint::None => HINT_NEUTRAL,
            ConnectHint::Valid => HINT_VALID,
            ConnectHint::Invalid(_) => HINT_INVALID,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    pub id: SharedString,
    pub type_id: SharedString,
    pub label: SharedString,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub z: i32,
    pub selected: bool,
    pub is_new: bool,
}

impl From<&BlockView> for BlockRow {
    fn from(view: &BlockView) -> Self {
        Self {
            id: view.id.to_string().into(),
            type_id: view.type_id.as_str().into(),
            label: view.label.as_str().into(),
            x: view.location.x,
            y: view.location.y,
            width: view.size.width,
            height: view.size.height,
            z: view.z,
            selected: view.selected,
            is_new: view.is_new,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinRow {
    pub block_id: SharedString,
    pub pin_id: SharedString,
    pub label: SharedString,
    pub is_input: bool,
    pub side: i32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub connected: bool,
}

/// Side index for Slint, clockwise from the left edge.
fn side_index(side: BlockSide) -> i32 {
    match side {
        BlockSide::Left => 0,
        BlockSide::Top => 1,
        BlockSide::Right => 2,
        BlockSide::Bottom => 3,
    }
}

impl From<&PinView> for PinRow {
    fn from(view: &PinView) -> Self {
        Self {
            block_id: view.block.to_string().into(),
            pin_id: view.pin.to_string().into(),
            label: view.label.as_str().into(),
            is_input: view.direction == PinDirection::Input,
            side: side_index(view.side),
            x: view.location.x,
            y: view.location.y,
            size: view.size.width,
            connected: view.connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRow {
    pub id: SharedString,
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub start_side: i32,
    pub end_side: i32,
    pub label: SharedString,
    pub selected: bool,
}

impl From<&ConnectionView> for ConnectionRow {
    fn from(view: &ConnectionView) -> Self {
        Self {
            id: view.id.to_string().into(),
            start_x: view.start.x,
            start_y: view.start.y,
            end_x: view.end.x,
            end_y: view.end.y,
            start_side: side_index(view.start_side),
            end_side: side_index(view.end_side),
            label: view.label.as_deref().unwrap_or_default().into(),
            selected: view.selected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLineRow {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<&Line> for GridLineRow {
    fn from(line: &Line) -> Self {
        Self {
            x1: line.start.x,
            y1: line.start.y,
            x2: line.end.x,
            y2: line.end.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectingRow {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub start_side: i32,
    pub color: Color,
}

impl From<&ConnectingView> for ConnectingRow {
    fn from(view: &ConnectingView) -> Self {
        Self {
            start_x: view.start.x,
            start_y: view.start.y,
            end_x: view.end.x,
            end_y: view.end.y,
            start_side: side_index(view.start_side),
            color: view.hint.color(),
        }
    }
}

trait ModelSyncer<R> {
    fn sync(&self, rows: &[R]);
}

struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<R, P, F> ModelSyncer<R> for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(&R) -> P,
{
    fn sync(&self, rows: &[R]) {
        for (i, row) in rows.iter().enumerate() {
            let item = (self.constructor)(row);
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        while self.model.row_count() > rows.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

fn syncer<R, P, F>(model: Rc<VecModel<P>>, constructor: F) -> Box<dyn ModelSyncer<R>>
where
    R: 'static,
    P: Clone + 'static,
    F: Fn(&R) -> P + 'static,
{
    Box::new(ConcreteModelSyncer { model, constructor })
}

/// Keeps bound Slint models in step with a designer.
///
/// Unbound element kinds are skipped. A sync is a no-op when the designer's
/// version has not moved since the last one.
#[derive(Default)]
pub struct SceneModels {
    blocks: Option<Box<dyn ModelSyncer<BlockRow>>>,
    pins: Option<Box<dyn ModelSyncer<PinRow>>>,
    connections: Option<Box<dyn ModelSyncer<ConnectionRow>>>,
    grid: Option<Box<dyn ModelSyncer<GridLineRow>>>,
    connecting: Option<Box<dyn Fn(Option<ConnectingRow>)>>,
    synced_version: Option<u64>,
}

impl SceneModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_blocks<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&BlockRow) -> P + 'static,
    {
        self.blocks = Some(syncer(model, constructor));
        self.synced_version = None;
    }

    pub fn bind_pins<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&PinRow) -> P + 'static,
    {
        self.pins = Some(syncer(model, constructor));
        self.synced_version = None;
    }

    pub fn bind_connections<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&ConnectionRow) -> P + 'static,
    {
        self.connections = Some(syncer(model, constructor));
        self.synced_version = None;
    }

    pub fn bind_grid<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&GridLineRow) -> P + 'static,
    {
        self.grid = Some(syncer(model, constructor));
        self.synced_version = None;
    }

    /// Receive the in-progress connection, or `None` when nothing is drawn.
    pub fn bind_connecting<F>(&mut self, setter: F)
    where
        F: Fn(Option<ConnectingRow>) + 'static,
    {
        self.connecting = Some(Box::new(setter));
        self.synced_version = None;
    }

    /// Push the designer's current state into every bound model.
    ///
    /// Returns false when nothing changed since the previous sync. Resolving
    /// connections can drop dangling ones, hence the mutable borrow.
    pub fn sync(&mut self, designer: &mut FlowDesigner) -> bool {
        let connection_rows: Option<Vec<ConnectionRow>> = self
            .connections
            .as_ref()
            .map(|_| designer.connection_views().iter().map(ConnectionRow::from).collect());

        if self.synced_version == Some(designer.version()) {
            return false;
        }

        if let Some(blocks) = &self.blocks {
            let rows: Vec<BlockRow> = designer.block_views().iter().map(BlockRow::from).collect();
            blocks.sync(&rows);
        }
        if let Some(pins) = &self.pins {
            let rows: Vec<PinRow> = designer.pin_views().iter().map(PinRow::from).collect();
            pins.sync(&rows);
        }
        if let (Some(connections), Some(rows)) = (&self.connections, connection_rows) {
            connections.sync(&rows);
        }
        if let Some(grid) = &self.grid {
            let rows: Vec<GridLineRow> =
                designer.grid_lines().map(|line| GridLineRow::from(&line)).collect();
            grid.sync(&rows);
        }
        if let Some(connecting) = &self.connecting {
            connecting(designer.connecting_view().as_ref().map(ConnectingRow::from));
        }

        log::debug!("Synced scene models at version {}", designer.version());
        self.synced_version = Some(designer.version());
        true
    }

    /// Sync even if the designer's version is unchanged.
    pub fn force_sync(&mut self, designer: &mut FlowDesigner) {
        self.synced_version = None;
        self.sync(designer);
    }
}
