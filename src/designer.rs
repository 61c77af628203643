//! Interaction engine for the flow editor.
//!
//! [`FlowDesigner`] owns the graph, the selection and the current gesture. It
//! turns pointer and key input into graph edits and exposes read-side views for
//! whatever draws the canvas.
//!
//! ```text
//! Idle --pin down--> DrawingConnection --up--> Idle (connect if compatible)
//! Idle --block down--> DraggingBlock --up--> Idle (commit new block if accepted)
//! any --leave / Escape--> Idle (nothing committed)
//! ```

use crate::catalog::{TemplateAttributes, TemplateRegistry};
use crate::config::EditorConfig;
use crate::error::{FlowError, Result};
use crate::events::{FlowEvent, FlowTarget, Key, PointerEvent, PointerGesture};
use crate::geometry::{Offset, Size};
use crate::graph::{
    Block, BlockId, BlockSide, Connection, ConnectionId, Graph, PinDirection, PinId, SignalType,
};
use crate::grid::{grid_lines, GridLines};
use crate::hit_test::{topmost_pin_at, PinHit};
use crate::selection::Selection;
use crate::zorder::{ZOrder, ZOrderAction};

/// Decides whether a block dragged in from a palette may be dropped where it is.
pub trait DropPolicy {
    fn accepts(&self, block: &Block, graph: &Graph) -> bool;
}

impl<F> DropPolicy for F
where
    F: Fn(&Block, &Graph) -> bool,
{
    fn accepts(&self, block: &Block, graph: &Graph) -> bool {
        self(block, graph)
    }
}

/// Rejects drops on top of an existing block.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverlapDrop;

impl DropPolicy for NoOverlapDrop {
    fn accepts(&self, block: &Block, graph: &Graph) -> bool {
        let bounds = block.bounding_box();
        !graph
            .blocks()
            .iter()
            .any(|other| other.id != block.id && other.bounding_box().overlaps(&bounds))
    }
}

/// Adjusts a dragged block's location. Not installed by default.
pub trait SnapPolicy {
    fn snap(&self, location: Offset) -> Offset;
}

/// Rounds locations to the nearest grid intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnap {
    pub grid_size: f32,
}

impl SnapPolicy for GridSnap {
    fn snap(&self, location: Offset) -> Offset {
        if self.grid_size <= 0.0 {
            return location;
        }
        Offset::new(
            (location.x / self.grid_size).round() * self.grid_size,
            (location.y / self.grid_size).round() * self.grid_size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub block: BlockId,
    /// Pointer position minus block location at pointer-down
    pub pointer_offset: Offset,
    pub original_location: Offset,
    /// The block came from a palette and is not in the graph yet
    pub is_new: bool,
}

/// Feedback for the connection being drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectHint {
    /// Not over a pin
    None,
    Valid,
    Invalid(FlowError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connecting {
    pub start: PinHit,
    /// Floating end point following the pointer
    pub end_location: Offset,
    pub candidate: Option<PinHit>,
    pub hint: ConnectHint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingBlock(DragState),
    DrawingConnection(Connecting),
}

// === Views ===

#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub id: BlockId,
    pub type_id: String,
    pub label: String,
    pub location: Offset,
    pub size: Size,
    pub z: i32,
    pub selected: bool,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinView {
    pub block: BlockId,
    pub pin: PinId,
    pub label: String,
    pub direction: PinDirection,
    pub signal_type: SignalType,
    pub side: BlockSide,
    /// Top-left corner in canvas space
    pub location: Offset,
    pub size: Size,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView {
    pub id: ConnectionId,
    pub start: Offset,
    pub end: Offset,
    pub start_side: BlockSide,
    pub end_side: BlockSide,
    pub label: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectingView {
    pub start: Offset,
    pub start_side: BlockSide,
    pub end: Offset,
    pub hint: ConnectHint,
}

type ChangeObserver = Box<dyn FnMut(u64)>;

/// The editor engine: graph, selection and gesture state machine.
pub struct FlowDesigner {
    config: EditorConfig,
    graph: Graph,
    registry: TemplateRegistry,
    selection: Selection,
    state: InteractionState,
    /// Palette block being dragged; joins the graph on a successful drop
    new_block: Option<Block>,
    drop_policy: Box<dyn DropPolicy>,
    snap_policy: Option<Box<dyn SnapPolicy>>,
    observers: Vec<ChangeObserver>,
    version: u64,
}

impl Default for FlowDesigner {
    fn default() -> Self {
        Self::new(EditorConfig::default(), TemplateRegistry::with_logic_gates())
    }
}

impl FlowDesigner {
    pub fn new(config: EditorConfig, registry: TemplateRegistry) -> Self {
        Self {
            config,
            graph: Graph::new(),
            registry,
            selection: Selection::default(),
            state: InteractionState::Idle,
            new_block: None,
            drop_policy: Box::new(NoOverlapDrop),
            snap_policy: None,
            observers: Vec::new(),
            version: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_view_size(&mut self, size: Size) {
        self.config.view_size = size;
        self.changed();
    }

    pub fn set_grid_size(&mut self, grid_size: f32) {
        self.config.grid_size = grid_size;
        self.changed();
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.registry
    }

    pub fn set_drop_policy<P: DropPolicy + 'static>(&mut self, policy: P) {
        self.drop_policy = Box::new(policy);
    }

    pub fn set_snap_policy<P: SnapPolicy + 'static>(&mut self, policy: P) {
        self.snap_policy = Some(Box::new(policy));
    }

    pub fn clear_snap_policy(&mut self) {
        self.snap_policy = None;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    pub fn dragging(&self) -> Option<&DragState> {
        match &self.state {
            InteractionState::DraggingBlock(drag) => Some(drag),
            _ => None,
        }
    }

    pub fn connecting(&self) -> Option<&Connecting> {
        match &self.state {
            InteractionState::DrawingConnection(connecting) => Some(connecting),
            _ => None,
        }
    }

    /// The palette block currently being dragged, if any.
    pub fn new_block(&self) -> Option<&Block> {
        self.new_block.as_ref()
    }

    // === Change tracking ===

    /// Bumped after every handled input or edit that changed something.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a callback invoked with the new version after each change.
    ///
    /// Observers run while the designer is mutably borrowed; they must not
    /// feed input back into it.
    pub fn on_change<F: FnMut(u64) + 'static>(&mut self, observer: F) {
        self.observers.push(Box::new(observer));
    }

    fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
        let version = self.version;
        for observer in &mut self.observers {
            observer(version);
        }
    }

    // === Selection ===

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selection.block().and_then(|id| self.graph.block(id).ok())
    }

    pub fn selected_connection(&self) -> Option<&Connection> {
        self.selection
            .connection()
            .and_then(|id| self.graph.connection(id).ok())
    }

    pub fn select_block(&mut self, id: BlockId) -> Result<()> {
        self.graph.block(id)?;
        self.selection.select_block(id);
        self.sync_selection_flags();
        self.changed();
        Ok(())
    }

    pub fn select_connection(&mut self, id: ConnectionId) -> Result<()> {
        self.graph.connection(id)?;
        self.selection.select_connection(id);
        self.sync_selection_flags();
        self.changed();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.sync_selection_flags();
        self.changed();
    }

    fn sync_selection_flags(&mut self) {
        self.graph
            .set_selected_flags(self.selection.block(), self.selection.connection());
    }

    // === Graph edits ===

    /// Add a block. Fails with [`FlowError::DuplicateBlock`] if its id is taken.
    pub fn add_block(&mut self, block: Block) -> Result<BlockId> {
        let id = self.graph.add_block(block)?;
        self.changed();
        Ok(id)
    }

    /// Instantiate a registered template and add it at `location`.
    pub fn add_block_from_template(
        &mut self,
        type_id: &str,
        attrs: &TemplateAttributes,
        location: Offset,
    ) -> Result<BlockId> {
        let template = self.registry.instantiate(type_id, attrs)?;
        self.add_block(Block::from_template(template, location))
    }

    /// Remove a block together with its connections.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        if self.dragging().is_some_and(|d| d.block == id && !d.is_new) {
            self.state = InteractionState::Idle;
        }
        if self
            .connecting()
            .is_some_and(|c| c.start.block == id || c.candidate.is_some_and(|h| h.block == id))
        {
            self.state = InteractionState::Idle;
        }

        let block = self.graph.remove_block(id)?;
        self.selection.forget(id);
        if let Some(conn) = self.selection.connection() {
            if self.graph.connection(conn).is_err() {
                self.selection.clear();
            }
        }
        self.changed();
        Some(block)
    }

    pub fn add_connection(
        &mut self,
        start_block: BlockId,
        start_pin: PinId,
        end_block: BlockId,
        end_pin: PinId,
    ) -> Result<ConnectionId> {
        let id = self
            .graph
            .add_connection(start_block, start_pin, end_block, end_pin)?;
        self.changed();
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.graph.remove_connection(id)?;
        self.selection.forget(id);
        self.changed();
        Some(connection)
    }

    pub fn move_block(&mut self, id: BlockId, location: Offset) -> Result<()> {
        self.graph.move_block(id, location)?;
        self.changed();
        Ok(())
    }

    pub fn move_block_z(&mut self, id: BlockId, action: ZOrderAction) -> Result<()> {
        self.graph.apply_z_order(id, action)?;
        log::debug!("Z-order {} on block {}", action, id);
        self.changed();
        Ok(())
    }

    /// Apply a stacking change to the selected block. Returns false if no
    /// block is selected.
    pub fn move_selected_block_z(&mut self, action: ZOrderAction) -> bool {
        match self.selection.block() {
            Some(id) => self.move_block_z(id, action).is_ok(),
            None => false,
        }
    }

    /// Delete whatever is selected. Returns true if something was removed.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Selection::Block(id) => self.remove_block(id).is_some(),
            Selection::Connection(id) => self.remove_connection(id).is_some(),
            Selection::None => false,
        }
    }

    // === Pointer and key input ===

    /// Dispatch a classified event from the bus.
    pub fn handle_flow_event(&mut self, event: &FlowEvent) {
        match (event.gesture, event.target) {
            (PointerGesture::Down, FlowTarget::Block(id)) => {
                self.block_pointer_down(id, event.pointer)
            }
            (PointerGesture::Down, FlowTarget::Pin { block, pin }) => {
                self.pin_pointer_down(block, pin, event.pointer)
            }
            (PointerGesture::Down, FlowTarget::Connection(id)) => self.connection_pointer_down(id),
            (PointerGesture::Move, _) => self.pointer_move(event.pointer),
            (PointerGesture::Up, _) => self.pointer_up(event.pointer),
            _ => {}
        }
    }

    /// Start dragging an existing block.
    pub fn block_pointer_down(&mut self, id: BlockId, pointer: PointerEvent) {
        self.abandon_gesture();
        let Ok(block) = self.graph.block(id) else {
            log::warn!("Pointer down on unknown block {}", id);
            return;
        };
        let drag = DragState {
            block: id,
            pointer_offset: pointer.position - block.location,
            original_location: block.location,
            is_new: false,
        };

        self.selection.select_block(id);
        self.sync_selection_flags();
        // Above every persistent rank while dragged
        let boost = self.graph.blocks().len() as i32;
        if let Err(err) = self.graph.set_z_boost(id, boost) {
            log::warn!("Cannot boost block {}: {}", id, err);
        }
        self.state = InteractionState::DraggingBlock(drag);
        log::debug!("Dragging block {}", id);
        self.changed();
    }

    /// Start dragging a fresh block out of a palette, centred on the pointer.
    ///
    /// The block stays outside the graph until [`FlowDesigner::pointer_up`]
    /// drops it somewhere the [`DropPolicy`] accepts.
    pub fn begin_new_block_drag(
        &mut self,
        type_id: &str,
        attrs: &TemplateAttributes,
        pointer: PointerEvent,
    ) -> Result<BlockId> {
        let template = self.registry.instantiate(type_id, attrs)?;
        self.abandon_gesture();

        let mut block = Block::from_template(template, Offset::ZERO);
        let pointer_offset = Offset::new(block.size.width / 2.0, block.size.height / 2.0);
        block.location = pointer.position - pointer_offset;
        block.dragging_as_new = true;
        block.z_order = ZOrder::next_rank(self.graph.blocks());
        block.z_boost = self.graph.blocks().len() as i32 + 1;

        let id = block.id;
        self.state = InteractionState::DraggingBlock(DragState {
            block: id,
            pointer_offset,
            original_location: block.location,
            is_new: true,
        });
        self.new_block = Some(block);
        self.selection.clear();
        self.sync_selection_flags();
        log::debug!("Dragging new {} block {}", type_id, id);
        self.changed();
        Ok(id)
    }

    /// Start drawing a connection from a pin.
    pub fn pin_pointer_down(&mut self, block: BlockId, pin: PinId, pointer: PointerEvent) {
        self.abandon_gesture();
        if let Err(err) = self.graph.pin(block, pin) {
            log::warn!("Pointer down on unknown pin: {}", err);
            return;
        }
        self.selection.clear();
        self.sync_selection_flags();
        self.state = InteractionState::DrawingConnection(Connecting {
            start: PinHit { block, pin },
            end_location: pointer.position,
            candidate: None,
            hint: ConnectHint::None,
        });
        log::debug!("Drawing connection from {}:{}", block, pin);
        self.changed();
    }

    pub fn connection_pointer_down(&mut self, id: ConnectionId) {
        self.abandon_gesture();
        if let Err(err) = self.select_connection(id) {
            log::warn!("Pointer down on unknown connection: {}", err);
        }
    }

    /// Pointer down on the empty canvas clears the selection.
    pub fn canvas_pointer_down(&mut self, _pointer: PointerEvent) {
        let had_selection = !self.selection.is_empty();
        self.selection.clear();
        self.sync_selection_flags();
        if had_selection {
            self.changed();
        }
    }

    pub fn pointer_move(&mut self, pointer: PointerEvent) {
        match &self.state {
            InteractionState::Idle => return,
            InteractionState::DraggingBlock(drag) => {
                let drag = *drag;
                let mut location = pointer.position - drag.pointer_offset;
                if let Some(snap) = &self.snap_policy {
                    location = snap.snap(location);
                }
                if drag.is_new {
                    if let Some(block) = &mut self.new_block {
                        block.location = location;
                    }
                } else if let Err(err) = self.graph.move_block(drag.block, location) {
                    log::warn!("Dragged block vanished: {}", err);
                    self.state = InteractionState::Idle;
                }
            }
            InteractionState::DrawingConnection(_) => self.update_connecting(pointer.position),
        }
        self.changed();
    }

    fn update_connecting(&mut self, position: Offset) {
        let graph = &self.graph;
        let InteractionState::DrawingConnection(connecting) = &mut self.state else {
            return;
        };
        connecting.end_location = position;
        connecting.candidate = topmost_pin_at(graph.blocks(), position, Some(connecting.start));
        connecting.hint = match connecting.candidate {
            None => ConnectHint::None,
            Some(hit) => match graph.can_connect(
                (connecting.start.block, connecting.start.pin),
                (hit.block, hit.pin),
            ) {
                Ok(()) => ConnectHint::Valid,
                Err(err) => ConnectHint::Invalid(err),
            },
        };
    }

    pub fn pointer_up(&mut self, pointer: PointerEvent) {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => return,
            InteractionState::DraggingBlock(drag) => self.finish_drag(drag),
            InteractionState::DrawingConnection(connecting) => {
                self.finish_connecting(connecting, pointer)
            }
        }
        self.changed();
    }

    fn finish_drag(&mut self, drag: DragState) {
        if !drag.is_new {
            if let Err(err) = self.graph.set_z_boost(drag.block, 0) {
                log::warn!("Dragged block vanished: {}", err);
            }
            log::debug!("Dropped block {}", drag.block);
            return;
        }

        let Some(block) = self.new_block.take() else {
            return;
        };
        if !self.drop_policy.accepts(&block, &self.graph) {
            log::debug!("Drop rejected for new block {}", block.id);
            return;
        }
        match self.graph.add_block(block) {
            Ok(id) => {
                self.selection.select_block(id);
                self.sync_selection_flags();
            }
            Err(err) => log::warn!("Discarded new block: {}", err),
        }
    }

    fn finish_connecting(&mut self, connecting: Connecting, pointer: PointerEvent) {
        // Re-test at the release point in case no move preceded it
        let mut connecting = connecting;
        connecting.candidate =
            topmost_pin_at(self.graph.blocks(), pointer.position, Some(connecting.start));
        let Some(end) = connecting.candidate else {
            log::debug!(
                "Connection from {}:{} released on nothing",
                connecting.start.block,
                connecting.start.pin
            );
            return;
        };
        let start = connecting.start;
        match self.graph.can_connect((start.block, start.pin), (end.block, end.pin)) {
            Ok(()) => {
                let added = self.graph.add_connection(start.block, start.pin, end.block, end.pin);
                if let Err(err) = added {
                    log::warn!("Connection failed: {}", err);
                }
            }
            Err(err) => log::debug!("Connection discarded: {}", err),
        }
    }

    /// Pointer left the canvas: abandon the gesture without committing.
    pub fn pointer_leave(&mut self) {
        self.cancel();
    }

    /// Abandon the current gesture. A dragged block returns to where it was;
    /// a new block and a half-drawn connection are discarded.
    pub fn cancel(&mut self) {
        if self.is_idle() {
            return;
        }
        self.abandon_gesture();
        self.changed();
    }

    fn abandon_gesture(&mut self) {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => {}
            InteractionState::DraggingBlock(drag) if drag.is_new => {
                self.new_block = None;
                log::debug!("Discarded new block {}", drag.block);
            }
            InteractionState::DraggingBlock(drag) => {
                let restored = self
                    .graph
                    .move_block(drag.block, drag.original_location)
                    .and_then(|()| self.graph.set_z_boost(drag.block, 0));
                if let Err(err) = restored {
                    log::warn!("Cannot restore dragged block: {}", err);
                }
                log::debug!("Cancelled drag of block {}", drag.block);
            }
            InteractionState::DrawingConnection(_) => {
                log::debug!("Cancelled connection");
            }
        }
    }

    pub fn key_up(&mut self, key: &Key) {
        match key {
            Key::Delete => {
                self.delete_selected();
            }
            Key::Escape => self.cancel(),
            Key::Other(_) => {}
        }
    }

    // === Views ===

    /// Every block including a palette block in flight, bottom to top.
    pub fn block_views(&self) -> Vec<BlockView> {
        let mut views: Vec<BlockView> = self
            .graph
            .blocks()
            .iter()
            .chain(self.new_block.iter())
            .map(|block| BlockView {
                id: block.id,
                type_id: block.template.type_id.clone(),
                label: block.template.label.clone(),
                location: block.location,
                size: block.size,
                z: block.z(),
                selected: block.selected,
                is_new: block.dragging_as_new,
            })
            .collect();
        views.sort_by_key(|v| v.z);
        views
    }

    pub fn pin_views(&self) -> Vec<PinView> {
        self.graph
            .blocks()
            .iter()
            .chain(self.new_block.iter())
            .flat_map(|block| {
                block.pins.iter().map(move |pin| PinView {
                    block: block.id,
                    pin: pin.id,
                    label: pin.label.clone(),
                    direction: pin.direction,
                    signal_type: pin.signal_type,
                    side: pin.side,
                    location: block.location + pin.location,
                    size: pin.size,
                    connected: self.graph.is_pin_connected(block.id, pin.id),
                })
            })
            .collect()
    }

    /// Resolve every connection to canvas coordinates.
    ///
    /// A connection whose block or pin no longer exists panics when
    /// [`EditorConfig::strict_references`] is set. Otherwise it is logged and
    /// removed from the graph.
    pub fn connection_views(&mut self) -> Vec<ConnectionView> {
        let mut views = Vec::with_capacity(self.graph.connections().len());
        let mut dangling = Vec::new();

        for connection in self.graph.connections() {
            match self.resolve_connection(connection) {
                Ok(view) => views.push(view),
                Err(err) if self.config.strict_references => panic!("dangling reference: {}", err),
                Err(err) => {
                    log::error!("{}", err);
                    dangling.push(connection.id);
                }
            }
        }

        if !dangling.is_empty() {
            for id in dangling {
                self.graph.remove_connection(id);
                self.selection.forget(id);
            }
            self.changed();
        }
        views
    }

    fn resolve_connection(&self, connection: &Connection) -> Result<ConnectionView> {
        let start_pin = self.graph.connection_start_pin(connection)?;
        let end_pin = self.graph.connection_end_pin(connection)?;
        Ok(ConnectionView {
            id: connection.id,
            start: self.graph.connection_start_offset(connection)?,
            end: self.graph.connection_end_offset(connection)?,
            start_side: start_pin.side,
            end_side: end_pin.side,
            label: connection.label.clone(),
            selected: connection.selected,
        })
    }

    pub fn connecting_view(&self) -> Option<ConnectingView> {
        let connecting = self.connecting()?;
        let block = self.graph.block(connecting.start.block).ok()?;
        let pin = block.pin(connecting.start.pin)?;
        Some(ConnectingView {
            start: block.pin_anchor(pin),
            start_side: pin.side,
            end: connecting.end_location,
            hint: connecting.hint.clone(),
        })
    }

    pub fn grid_lines(&self) -> GridLines {
        grid_lines(self.config.view_size, self.config.grid_size)
    }
}
