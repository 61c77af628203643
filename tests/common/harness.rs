//! Test harness wiring a designer, bus and router the way a host would.
//!
//! Block A sits at (0, 0) with one digital output on its right edge; block B
//! sits at (200, 0) with one digital input on its left edge.

#![allow(dead_code)]

use super::EventRecorder;
use flow_designer::{
    BlockId, BlockSide, EditorConfig, ElementTarget, EventBus, EventRouter, FlowDesigner,
    FunctionTemplate, Key, Offset, PinDirection, PinId, PinTemplate, PointerEvent, PointerGesture,
    RawInput, SignalType, TemplateAttributes, TemplateRegistry,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Initialise logging once; `RUST_LOG=debug` shows designer transitions.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn single_pin(
    type_id: &str,
    attrs: &TemplateAttributes,
    side: BlockSide,
    direction: PinDirection,
    signal: SignalType,
) -> FunctionTemplate {
    let pin = PinTemplate::new("io", "", side, direction, signal);
    let mut template = FunctionTemplate::new(type_id, vec![pin]).with_label(type_id);
    if let Some(id) = attrs.id {
        template.id = id;
    }
    if let Some(label) = &attrs.label {
        template.label = label.clone();
    }
    template
}

/// Logic gates plus single-pin `source`/`sink` blocks and an analogue sink.
pub fn test_registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::with_logic_gates();
    registry
        .register("source", |attrs| {
            single_pin("source", attrs, BlockSide::Right, PinDirection::Output, SignalType::Digital)
        })
        .register("sink", |attrs| {
            single_pin("sink", attrs, BlockSide::Left, PinDirection::Input, SignalType::Digital)
        })
        .register("analogue_sink", |attrs| {
            single_pin(
                "analogue_sink",
                attrs,
                BlockSide::Left,
                PinDirection::Input,
                SignalType::Analogue,
            )
        });
    registry
}

pub struct FlowHarness {
    pub designer: Rc<RefCell<FlowDesigner>>,
    pub bus: Rc<EventBus>,
    pub router: EventRouter,
    pub recorder: EventRecorder,
    pub a: BlockId,
    pub b: BlockId,
}

impl FlowHarness {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default().with_strict_references(false))
    }

    pub fn with_config(config: EditorConfig) -> Self {
        init_logging();
        let mut designer = FlowDesigner::new(config, test_registry());
        let a = designer
            .add_block_from_template("source", &TemplateAttributes::with_label("A"), Offset::ZERO)
            .unwrap();
        let b = designer
            .add_block_from_template(
                "sink",
                &TemplateAttributes::with_label("B"),
                Offset::new(200.0, 0.0),
            )
            .unwrap();

        let recorder = EventRecorder::new();
        {
            let versions = recorder.versions.clone();
            designer.on_change(move |v| versions.borrow_mut().push(v));
        }

        let designer = Rc::new(RefCell::new(designer));
        let bus = Rc::new(EventBus::new());
        let router = EventRouter::new(bus.clone(), designer.clone());
        recorder.attach(&bus);

        Self {
            designer,
            bus,
            router,
            recorder,
            a,
            b,
        }
    }

    /// Add another block from the test registry.
    pub fn add_block(&self, type_id: &str, x: f32, y: f32) -> BlockId {
        self.designer
            .borrow_mut()
            .add_block_from_template(type_id, &TemplateAttributes::default(), Offset::new(x, y))
            .unwrap()
    }

    pub fn only_pin(&self, block: BlockId) -> PinId {
        self.designer.borrow().graph().block(block).unwrap().pins[0].id
    }

    /// Canvas position of a pin's centre.
    pub fn pin_center(&self, block: BlockId, pin: PinId) -> (f32, f32) {
        let designer = self.designer.borrow();
        let b = designer.graph().block(block).unwrap();
        let p = b.pin(pin).unwrap();
        (
            b.location.x + p.location.x + p.size.width / 2.0,
            b.location.y + p.location.y + p.size.height / 2.0,
        )
    }

    pub fn location(&self, block: BlockId) -> Offset {
        self.designer.borrow().graph().block(block).unwrap().location
    }

    // === Input simulation ===

    pub fn send(&self, target: ElementTarget, gesture: PointerGesture, x: f32, y: f32) {
        self.router
            .route(RawInput::new(target, gesture, PointerEvent::at(x, y)));
    }

    pub fn press_block(&self, block: BlockId, x: f32, y: f32) {
        self.send(ElementTarget::Block(block), PointerGesture::Down, x, y);
    }

    pub fn press_pin(&self, block: BlockId, pin: PinId) {
        let (x, y) = self.pin_center(block, pin);
        self.send(ElementTarget::Pin { block, pin }, PointerGesture::Down, x, y);
    }

    pub fn move_on_canvas(&self, x: f32, y: f32) {
        self.send(ElementTarget::Canvas, PointerGesture::Move, x, y);
    }

    pub fn release_on_canvas(&self, x: f32, y: f32) {
        self.send(ElementTarget::Canvas, PointerGesture::Up, x, y);
    }

    pub fn press_canvas(&self, x: f32, y: f32) {
        self.send(ElementTarget::Canvas, PointerGesture::Down, x, y);
    }

    pub fn leave_canvas(&self) {
        self.send(ElementTarget::Canvas, PointerGesture::Leave, 0.0, 0.0);
    }

    pub fn key(&self, key: Key) {
        self.router.route_key(&key);
    }

    /// Press on one pin, move over another and release there.
    pub fn drag_connection(&self, from: (BlockId, PinId), to: (BlockId, PinId)) {
        self.press_pin(from.0, from.1);
        let (x, y) = self.pin_center(to.0, to.1);
        self.send(ElementTarget::Connecting, PointerGesture::Move, x, y);
        self.send(
            ElementTarget::Pin {
                block: to.0,
                pin: to.1,
            },
            PointerGesture::Up,
            x,
            y,
        );
    }

    /// Connect A's output to B's input through pointer input.
    pub fn connect_a_to_b(&self) {
        self.drag_connection((self.a, self.only_pin(self.a)), (self.b, self.only_pin(self.b)));
    }
}
