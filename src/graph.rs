use crate::catalog::{FunctionTemplate, PinTemplate};
use crate::error::{ConnectionRule, FlowError, Result};
use crate::geometry::{BoundingBox, Offset, Size};
use crate::layout::{layout_pins, BLOCK_HEIGHT, BLOCK_WIDTH, PIN_SIZE};
use crate::zorder::{ZOrder, ZOrderAction};
use std::rc::Rc;
use uuid::Uuid;

pub type BlockId = Uuid;
pub type PinId = Uuid;
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

/// Compatibility tag that must match across a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Digital,
    Analogue,
}

/// Side of the block perimeter a pin is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSide {
    Left,
    Top,
    Right,
    Bottom,
}

impl BlockSide {
    pub const ALL: [BlockSide; 4] = [
        BlockSide::Left,
        BlockSide::Top,
        BlockSide::Right,
        BlockSide::Bottom,
    ];
}

/// An input or output terminal on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    /// Unique within the owning block
    pub id: PinId,
    pub label: String,
    pub description: String,
    pub direction: PinDirection,
    pub signal_type: SignalType,
    pub side: BlockSide,
    /// Location relative to the block origin
    pub location: Offset,
    pub size: Size,
}

impl Pin {
    pub fn from_template(template: &PinTemplate) -> Self {
        Self {
            id: template.id,
            label: template.label.clone(),
            description: template.description.clone(),
            direction: template.direction,
            signal_type: template.signal_type,
            side: template.side,
            location: Offset::ZERO,
            size: Size::new(PIN_SIZE, PIN_SIZE),
        }
    }

    /// Bounding box in the owning block's local frame.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_location_size(self.location, self.size)
    }
}

/// A placed instance of a function template.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub template: Rc<FunctionTemplate>,
    pub location: Offset,
    pub size: Size,
    pub pins: Vec<Pin>,
    /// Persistent stacking rank
    pub z_order: i32,
    /// Extra stacking while dragged, 0 otherwise
    pub z_boost: i32,
    pub selected: bool,
    /// Dragged in from a palette and not yet committed to the graph
    pub dragging_as_new: bool,
}

impl Block {
    /// Instantiate a block from a template at `location` with the default size.
    ///
    /// The block takes the template's id; pins are derived in declaration order
    /// and laid out immediately.
    pub fn from_template(template: FunctionTemplate, location: Offset) -> Self {
        let size = Size::new(BLOCK_WIDTH, BLOCK_HEIGHT);
        let mut pins: Vec<Pin> = template.pins.iter().map(Pin::from_template).collect();
        layout_pins(size, &mut pins);
        Self {
            id: template.id,
            template: Rc::new(template),
            location,
            size,
            pins,
            z_order: 0,
            z_boost: 0,
            selected: false,
            dragging_as_new: false,
        }
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// Displayed stacking value: persistent rank plus drag boost.
    pub fn z(&self) -> i32 {
        self.z_order + self.z_boost
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_location_size(self.location, self.size)
    }

    /// Absolute canvas point where a connection attaches to `pin`:
    /// block location + pin location + half the pin height.
    pub fn pin_anchor(&self, pin: &Pin) -> Offset {
        Offset::new(
            self.location.x + pin.location.x,
            self.location.y + pin.location.y + pin.size.height / 2.0,
        )
    }
}

/// A directed edge between two pins, stored by identifiers only.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub start_block: BlockId,
    pub start_pin: PinId,
    pub end_block: BlockId,
    pub end_pin: PinId,
    pub label: Option<String>,
    pub description: Option<String>,
    pub selected: bool,
}

impl Connection {
    pub fn new(start_block: BlockId, start_pin: PinId, end_block: BlockId, end_pin: PinId) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_block,
            start_pin,
            end_block,
            end_pin,
            label: None,
            description: None,
            selected: false,
        }
    }

    pub fn touches_block(&self, block: BlockId) -> bool {
        self.start_block == block || self.end_block == block
    }

    pub fn touches_pin(&self, block: BlockId, pin: PinId) -> bool {
        (self.start_block == block && self.start_pin == pin)
            || (self.end_block == block && self.end_pin == pin)
    }
}

/// Resolved pin endpoints of a connection, as `(block, pin)` id pairs.
pub type EndpointIds = ((BlockId, PinId), (BlockId, PinId));

/// Authoritative collections of blocks and connections.
///
/// Every mutation bumps [`Graph::version`], which renderers can poll to decide
/// whether to redraw.
#[derive(Debug, Default)]
pub struct Graph {
    blocks: Vec<Block>,
    connections: Vec<Connection>,
    version: u64,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    // === Blocks ===

    pub fn contains_block(&self, id: BlockId) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .ok_or(FlowError::UnknownBlock(id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(FlowError::UnknownBlock(id))
    }

    /// Add a block on top of the stack and lay out its pins.
    ///
    /// Fails with [`FlowError::DuplicateBlock`] if the id is already taken;
    /// the existing block and its connections are left alone.
    pub fn add_block(&mut self, mut block: Block) -> Result<BlockId> {
        if self.contains_block(block.id) {
            log::warn!("Rejected block {}: id already in use", block.id);
            return Err(FlowError::DuplicateBlock(block.id));
        }
        block.z_order = ZOrder::next_rank(&self.blocks);
        block.z_boost = 0;
        block.dragging_as_new = false;
        layout_pins(block.size, &mut block.pins);

        let id = block.id;
        log::info!("Added block {} ({})", id, block.template.type_id);
        self.blocks.push(block);
        self.touch();
        Ok(id)
    }

    /// Remove a block and every connection touching it.
    ///
    /// Returns `None` (and changes nothing) if the block does not exist.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.id == id)?;

        let before = self.connections.len();
        self.connections.retain(|c| !c.touches_block(id));
        let dropped = before - self.connections.len();

        let block = self.blocks.remove(index);
        ZOrder::compact(&mut self.blocks);
        self.touch();
        log::info!("Removed block {} and {} connection(s)", id, dropped);
        Some(block)
    }

    pub fn move_block(&mut self, id: BlockId, location: Offset) -> Result<()> {
        self.block_mut(id)?.location = location;
        self.touch();
        Ok(())
    }

    /// Resize a block and re-run its pin layout.
    pub fn resize_block(&mut self, id: BlockId, size: Size) -> Result<()> {
        let block = self.block_mut(id)?;
        block.size = size;
        layout_pins(size, &mut block.pins);
        self.touch();
        Ok(())
    }

    /// Replace a block's pins and re-run its pin layout.
    ///
    /// Connections to pins that disappear are left in place; they become
    /// dangling until [`Graph::prune_dangling_connections`] removes them.
    pub fn set_block_pins(&mut self, id: BlockId, mut pins: Vec<Pin>) -> Result<()> {
        let block = self.block_mut(id)?;
        layout_pins(block.size, &mut pins);
        block.pins = pins;
        self.touch();
        Ok(())
    }

    /// Apply a stacking change to one block.
    pub fn apply_z_order(&mut self, id: BlockId, action: ZOrderAction) -> Result<()> {
        if !ZOrder::apply(&mut self.blocks, id, action) {
            return Err(FlowError::UnknownBlock(id));
        }
        self.touch();
        Ok(())
    }

    pub fn set_z_boost(&mut self, id: BlockId, boost: i32) -> Result<()> {
        self.block_mut(id)?.z_boost = boost;
        self.touch();
        Ok(())
    }

    pub(crate) fn set_selected_flags(
        &mut self,
        block: Option<BlockId>,
        connection: Option<ConnectionId>,
    ) {
        for b in &mut self.blocks {
            b.selected = Some(b.id) == block;
        }
        for c in &mut self.connections {
            c.selected = Some(c.id) == connection;
        }
        self.touch();
    }

    // === Pins ===

    /// Resolve a pin by its owning block and id.
    pub fn pin(&self, block: BlockId, pin: PinId) -> Result<&Pin> {
        self.blocks
            .iter()
            .find(|b| b.id == block)
            .and_then(|b| b.pin(pin))
            .ok_or(FlowError::DanglingReference {
                connection: None,
                block,
                pin: Some(pin),
            })
    }

    /// Absolute canvas anchor of a pin.
    pub fn pin_offset(&self, block: BlockId, pin: PinId) -> Result<Offset> {
        let b = self.block(block)?;
        let p = b.pin(pin).ok_or(FlowError::DanglingReference {
            connection: None,
            block,
            pin: Some(pin),
        })?;
        Ok(b.pin_anchor(p))
    }

    pub fn is_pin_connected(&self, block: BlockId, pin: PinId) -> bool {
        self.connections.iter().any(|c| c.touches_pin(block, pin))
    }

    /// Check whether `from` may be connected to `to`.
    ///
    /// Directions must differ, signal types must match and neither pin may
    /// already be part of a connection.
    pub fn can_connect(&self, from: (BlockId, PinId), to: (BlockId, PinId)) -> Result<()> {
        let from_pin = self.pin(from.0, from.1)?;
        let to_pin = self.pin(to.0, to.1)?;

        if from == to {
            return Err(ConnectionRule::SamePin.into());
        }
        if from_pin.direction == to_pin.direction {
            return Err(ConnectionRule::DirectionMismatch.into());
        }
        if from_pin.signal_type != to_pin.signal_type {
            return Err(ConnectionRule::SignalTypeMismatch.into());
        }
        for (block, pin) in [from, to] {
            if self.is_pin_connected(block, pin) {
                return Err(ConnectionRule::PinOccupied { block, pin }.into());
            }
        }
        Ok(())
    }

    // === Connections ===

    /// Connect two pins after checking [`Graph::can_connect`].
    pub fn add_connection(
        &mut self,
        start_block: BlockId,
        start_pin: PinId,
        end_block: BlockId,
        end_pin: PinId,
    ) -> Result<ConnectionId> {
        if let Err(err) = self.can_connect((start_block, start_pin), (end_block, end_pin)) {
            log::warn!(
                "Rejected connection {}:{} -> {}:{}: {}",
                start_block,
                start_pin,
                end_block,
                end_pin,
                err
            );
            return Err(err);
        }
        let connection = Connection::new(start_block, start_pin, end_block, end_pin);
        let id = connection.id;
        self.connections.push(connection);
        self.touch();
        log::info!("Connected {}:{} -> {}:{}", start_block, start_pin, end_block, end_pin);
        Ok(id)
    }

    /// Insert a connection as-is, without compatibility or reference checks.
    ///
    /// Meant for rehydrating a stored graph; follow up with
    /// [`Graph::prune_dangling_connections`] if the source is not trusted.
    pub fn restore_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
        self.touch();
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        let connection = self.connections.remove(index);
        self.touch();
        log::info!("Removed connection {}", id);
        Some(connection)
    }

    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.connections
            .iter()
            .find(|c| c.id == id)
            .ok_or(FlowError::UnknownConnection(id))
    }

    pub fn set_connection_label(&mut self, id: ConnectionId, label: Option<String>) -> Result<()> {
        let connection = self
            .connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(FlowError::UnknownConnection(id))?;
        connection.label = label;
        self.touch();
        Ok(())
    }

    pub fn connections_touching(&self, block: BlockId) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.iter().filter(move |c| c.touches_block(block))
    }

    fn resolve_endpoint(
        &self,
        connection: &Connection,
        block: BlockId,
        pin: PinId,
    ) -> Result<(&Block, &Pin)> {
        let dangling = || FlowError::DanglingReference {
            connection: Some(connection.id),
            block,
            pin: Some(pin),
        };
        let b = self.blocks.iter().find(|b| b.id == block).ok_or_else(dangling)?;
        let p = b.pin(pin).ok_or_else(dangling)?;
        Ok((b, p))
    }

    pub fn connection_start_pin(&self, connection: &Connection) -> Result<&Pin> {
        self.resolve_endpoint(connection, connection.start_block, connection.start_pin)
            .map(|(_, p)| p)
    }

    pub fn connection_end_pin(&self, connection: &Connection) -> Result<&Pin> {
        self.resolve_endpoint(connection, connection.end_block, connection.end_pin)
            .map(|(_, p)| p)
    }

    pub fn connection_start_offset(&self, connection: &Connection) -> Result<Offset> {
        let (block, pin) =
            self.resolve_endpoint(connection, connection.start_block, connection.start_pin)?;
        Ok(block.pin_anchor(pin))
    }

    pub fn connection_end_offset(&self, connection: &Connection) -> Result<Offset> {
        let (block, pin) =
            self.resolve_endpoint(connection, connection.end_block, connection.end_pin)?;
        Ok(block.pin_anchor(pin))
    }

    /// Resolve both endpoints and return them as `(block, pin)` id pairs.
    pub fn connection_endpoint_ids(&self, connection: &Connection) -> Result<EndpointIds> {
        let (sb, sp) =
            self.resolve_endpoint(connection, connection.start_block, connection.start_pin)?;
        let (eb, ep) = self.resolve_endpoint(connection, connection.end_block, connection.end_pin)?;
        Ok(((sb.id, sp.id), (eb.id, ep.id)))
    }

    /// Remove every connection whose endpoints no longer resolve.
    pub fn prune_dangling_connections(&mut self) -> Vec<Connection> {
        let (kept, dropped): (Vec<Connection>, Vec<Connection>) =
            std::mem::take(&mut self.connections)
                .into_iter()
                .partition(|c| self.connection_endpoint_ids(c).is_ok());
        self.connections = kept;
        if !dropped.is_empty() {
            for c in &dropped {
                log::error!("Dropped dangling connection {}", c.id);
            }
            self.touch();
        }
        dropped
    }
}
