//! Event routing for the flow editor.
//!
//! The rendering layer forwards raw pointer input tagged with the element it
//! happened on. [`EventRouter`] classifies it: element input becomes a
//! [`FlowEvent`] published on the [`EventBus`], canvas input goes straight to
//! the designer. Other UI components (toolbars, inspectors) subscribe to the
//! bus to react to graph edits.
//!
//! # Example
//!
//! ```
//! use flow_designer::{
//!     EditorConfig, ElementTarget, EventBus, EventRouter, FlowDesigner, PointerEvent,
//!     PointerGesture, RawInput, TemplateRegistry,
//! };
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let designer = Rc::new(RefCell::new(FlowDesigner::new(
//!     EditorConfig::default(),
//!     TemplateRegistry::with_logic_gates(),
//! )));
//! let bus = Rc::new(EventBus::new());
//! let router = EventRouter::new(bus.clone(), designer.clone());
//!
//! router.route(RawInput::new(
//!     ElementTarget::Canvas,
//!     PointerGesture::Down,
//!     PointerEvent::at(10.0, 10.0),
//! ));
//! assert!(designer.borrow().selection().is_empty());
//! ```

use crate::designer::FlowDesigner;
use crate::geometry::Offset;
use crate::graph::{BlockId, ConnectionId, PinId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Raw pointer input in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: i32,
    pub position: Offset,
}

impl PointerEvent {
    pub fn new(pointer_id: i32, position: Offset) -> Self {
        Self { pointer_id, position }
    }

    /// Primary pointer at `(x, y)`.
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(1, Offset::new(x, y))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Delete,
    Escape,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Block,
    /// A block's input/output terminal
    Pin,
    /// The path of a connection still being drawn
    Connecting,
    Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerGesture {
    Move,
    Over,
    Enter,
    Leave,
    Down,
    Up,
}

/// One domain event name per element kind and gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventName {
    pub element: ElementKind,
    pub gesture: PointerGesture,
}

impl EventName {
    pub const fn new(element: ElementKind, gesture: PointerGesture) -> Self {
        Self { element, gesture }
    }

    pub fn as_str(&self) -> &'static str {
        use ElementKind as E;
        use PointerGesture as G;
        match (self.element, self.gesture) {
            (E::Block, G::Move) => "blockPointerMove",
            (E::Block, G::Over) => "blockPointerOver",
            (E::Block, G::Enter) => "blockPointerEnter",
            (E::Block, G::Leave) => "blockPointerLeave",
            (E::Block, G::Down) => "blockPointerDown",
            (E::Block, G::Up) => "blockPointerUp",
            (E::Pin, G::Move) => "blockIOPointerMove",
            (E::Pin, G::Over) => "blockIOPointerOver",
            (E::Pin, G::Enter) => "blockIOPointerEnter",
            (E::Pin, G::Leave) => "blockIOPointerLeave",
            (E::Pin, G::Down) => "blockIOPointerDown",
            (E::Pin, G::Up) => "blockIOPointerUp",
            (E::Connecting, G::Move) => "connectingPointerMove",
            (E::Connecting, G::Over) => "connectingPointerOver",
            (E::Connecting, G::Enter) => "connectingPointerEnter",
            (E::Connecting, G::Leave) => "connectingPointerLeave",
            (E::Connecting, G::Down) => "connectingPointerDown",
            (E::Connecting, G::Up) => "connectingPointerUp",
            (E::Connection, G::Move) => "connectionPointerMove",
            (E::Connection, G::Over) => "connectionPointerOver",
            (E::Connection, G::Enter) => "connectionPointerEnter",
            (E::Connection, G::Leave) => "connectionPointerLeave",
            (E::Connection, G::Down) => "connectionPointerDown",
            (E::Connection, G::Up) => "connectionPointerUp",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The element a domain event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowTarget {
    Block(BlockId),
    Pin { block: BlockId, pin: PinId },
    Connecting,
    Connection(ConnectionId),
}

impl FlowTarget {
    pub fn kind(&self) -> ElementKind {
        match self {
            FlowTarget::Block(_) => ElementKind::Block,
            FlowTarget::Pin { .. } => ElementKind::Pin,
            FlowTarget::Connecting => ElementKind::Connecting,
            FlowTarget::Connection(_) => ElementKind::Connection,
        }
    }
}

/// A classified pointer event: what it touched plus the raw input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowEvent {
    pub gesture: PointerGesture,
    pub target: FlowTarget,
    pub pointer: PointerEvent,
}

impl FlowEvent {
    pub fn name(&self) -> EventName {
        EventName::new(self.target.kind(), self.gesture)
    }
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Element(ElementKind),
    Name(EventName),
}

impl EventFilter {
    pub fn matches(&self, event: &FlowEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Element(kind) => event.target.kind() == *kind,
            EventFilter::Name(name) => event.name() == *name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Box<dyn FnMut(&FlowEvent)>,
}

/// Synchronous publish/subscribe bus for [`FlowEvent`]s.
///
/// Handlers run in registration order. An event emitted while a dispatch is
/// running is queued and delivered after the current event has reached every
/// handler, so handlers never re-enter each other.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
    queue: RefCell<VecDeque<FlowEvent>>,
    removed: RefCell<Vec<SubscriptionId>>,
    /// Subscribers moved out of `subscribers` by the running dispatch
    in_flight: RefCell<Vec<SubscriptionId>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&FlowEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            filter,
            handler: Box::new(handler),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|s| s.id != id);
        if self.dispatching.get() {
            self.removed.borrow_mut().push(id);
        }
    }

    /// Live subscriptions, including from inside a handler.
    pub fn subscriber_count(&self) -> usize {
        let removed = self.removed.borrow();
        let in_flight = self.in_flight.borrow();
        let subscribers = self.subscribers.borrow();
        in_flight
            .iter()
            .chain(subscribers.iter().map(|s| &s.id))
            .filter(|id| !removed.contains(id))
            .count()
    }

    pub fn emit(&self, event: FlowEvent) {
        self.queue.borrow_mut().push_back(event);
        if self.dispatching.get() {
            return;
        }

        self.dispatching.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            self.dispatch(&event);
        }
        self.dispatching.set(false);

        let removed = std::mem::take(&mut *self.removed.borrow_mut());
        if !removed.is_empty() {
            self.subscribers.borrow_mut().retain(|s| !removed.contains(&s.id));
        }
    }

    fn dispatch(&self, event: &FlowEvent) {
        // Handlers may subscribe while we run; those land in the emptied list
        // and are merged back afterwards.
        let mut active = std::mem::take(&mut *self.subscribers.borrow_mut());
        *self.in_flight.borrow_mut() = active.iter().map(|s| s.id).collect();
        for subscriber in active.iter_mut() {
            if self.removed.borrow().contains(&subscriber.id) {
                continue;
            }
            if subscriber.filter.matches(event) {
                (subscriber.handler)(event);
            }
        }
        let mut subscribers = self.subscribers.borrow_mut();
        active.append(&mut subscribers);
        *subscribers = active;
        self.in_flight.borrow_mut().clear();
    }
}

/// What the rendering layer says an input happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementTarget {
    /// The canvas background
    Canvas,
    Block(BlockId),
    Pin { block: BlockId, pin: PinId },
    Connecting,
    Connection(ConnectionId),
}

/// Element-tagged input as forwarded by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInput {
    pub target: ElementTarget,
    pub gesture: PointerGesture,
    pub pointer: PointerEvent,
}

impl RawInput {
    pub fn new(target: ElementTarget, gesture: PointerGesture, pointer: PointerEvent) -> Self {
        Self {
            target,
            gesture,
            pointer,
        }
    }

    /// Classify into a domain event. Canvas input has no domain event.
    pub fn classify(&self) -> Option<FlowEvent> {
        let target = match self.target {
            ElementTarget::Canvas => return None,
            ElementTarget::Block(id) => FlowTarget::Block(id),
            ElementTarget::Pin { block, pin } => FlowTarget::Pin { block, pin },
            ElementTarget::Connecting => FlowTarget::Connecting,
            ElementTarget::Connection(id) => FlowTarget::Connection(id),
        };
        Some(FlowEvent {
            gesture: self.gesture,
            target,
            pointer: self.pointer,
        })
    }
}

/// Register the designer's pointer handlers on the bus.
///
/// Call once at startup. The handler borrows the designer mutably for each
/// event, so nobody may hold a borrow of it while emitting.
pub fn configure_pointer_events(
    bus: &EventBus,
    designer: Rc<RefCell<FlowDesigner>>,
) -> SubscriptionId {
    bus.subscribe(EventFilter::All, move |event| {
        designer.borrow_mut().handle_flow_event(event);
    })
}

/// Entry point for raw input from the rendering layer.
pub struct EventRouter {
    bus: Rc<EventBus>,
    designer: Rc<RefCell<FlowDesigner>>,
}

impl EventRouter {
    /// Create a router and register the designer's handlers on `bus`.
    pub fn new(bus: Rc<EventBus>, designer: Rc<RefCell<FlowDesigner>>) -> Self {
        configure_pointer_events(&bus, designer.clone());
        Self { bus, designer }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn route(&self, input: RawInput) {
        match input.classify() {
            Some(event) => self.bus.emit(event),
            None => self.route_canvas(input.gesture, input.pointer),
        }
    }

    fn route_canvas(&self, gesture: PointerGesture, pointer: PointerEvent) {
        let mut designer = self.designer.borrow_mut();
        match gesture {
            PointerGesture::Down => designer.canvas_pointer_down(pointer),
            PointerGesture::Move => designer.pointer_move(pointer),
            PointerGesture::Up => designer.pointer_up(pointer),
            PointerGesture::Leave => designer.pointer_leave(),
            PointerGesture::Enter | PointerGesture::Over => {}
        }
    }

    pub fn route_key(&self, key: &Key) {
        self.designer.borrow_mut().key_up(key);
    }
}
