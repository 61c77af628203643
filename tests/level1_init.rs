//! Level 1: Initialization Tests
//!
//! Designer construction, template instantiation, pin layout and identifier
//! round-trips.

mod common;

use approx::assert_relative_eq;
use common::harness::{test_registry, FlowHarness};
use flow_designer::{
    BlockSide, EditorConfig, FlowDesigner, FlowError, Offset, PinDirection, Size,
    TemplateAttributes, ZOrder,
};
use uuid::Uuid;

#[test]
fn test_harness_starts_idle_and_empty_selection() {
    let harness = FlowHarness::new();
    let designer = harness.designer.borrow();

    assert!(designer.is_idle());
    assert!(designer.selection().is_empty());
    assert_eq!(designer.graph().blocks().len(), 2);
    assert!(designer.graph().connections().is_empty());
    assert!(harness.recorder.names().is_empty());
}

#[test]
fn test_blocks_get_dense_ranks_in_insertion_order() {
    let harness = FlowHarness::new();
    harness.add_block("and", 0.0, 200.0);
    let designer = harness.designer.borrow();
    let ranks: Vec<i32> = designer.graph().blocks().iter().map(|b| b.z_order).collect();

    assert_eq!(ranks, vec![0, 1, 2]);
    assert!(ZOrder::is_dense(designer.graph().blocks()));
}

#[test]
fn test_default_block_size_and_pin_layout() {
    let harness = FlowHarness::new();
    let designer = harness.designer.borrow();
    let a = designer.graph().block(harness.a).unwrap();
    let b = designer.graph().block(harness.b).unwrap();

    assert_relative_eq!(a.size.width, 150.0);
    assert_relative_eq!(a.size.height, 40.0);
    assert_eq!(a.pins[0].location, Offset::new(148.0, 5.0));
    assert_eq!(b.pins[0].location, Offset::new(-8.0, 5.0));
    assert_relative_eq!(b.pins[0].size.width, 10.0);
}

#[test]
fn test_logic_gate_templates() {
    let mut designer = FlowDesigner::new(EditorConfig::default(), test_registry());
    let or = designer
        .add_block_from_template("or", &TemplateAttributes::default(), Offset::ZERO)
        .unwrap();
    let xor = designer
        .add_block_from_template("xor", &TemplateAttributes::default(), Offset::new(0.0, 100.0))
        .unwrap();

    let or = designer.graph().block(or).unwrap();
    assert_eq!(or.template.label, "OR");
    assert_eq!(or.template.category, "Logic");
    let inputs: Vec<_> = or.pins.iter().filter(|p| p.direction == PinDirection::Input).collect();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.iter().all(|p| p.side == BlockSide::Left));
    assert_eq!(inputs[1].location, Offset::new(-8.0, 20.0));

    let xor = designer.graph().block(xor).unwrap();
    assert_eq!(xor.template.label, "");
    assert_eq!(xor.pins.len(), 2);
}

#[test]
fn test_unknown_template_is_reported() {
    let mut designer = FlowDesigner::new(EditorConfig::default(), test_registry());
    let err = designer
        .add_block_from_template("mux", &TemplateAttributes::default(), Offset::ZERO)
        .unwrap_err();
    assert_eq!(err, FlowError::UnknownTemplate("mux".into()));
    assert!(designer.graph().blocks().is_empty());
}

#[test]
fn test_block_identifier_round_trip() {
    let mut designer = FlowDesigner::new(EditorConfig::default(), test_registry());
    let id = Uuid::new_v4();
    let attrs = TemplateAttributes {
        id: Some(id),
        ..TemplateAttributes::default()
    };
    let block = designer
        .add_block_from_template("and", &attrs, Offset::new(10.0, 10.0))
        .unwrap();

    assert_eq!(block, id);
    assert_eq!(designer.graph().block(id).unwrap().template.id, id);
}

#[test]
fn test_reused_block_identifier_is_rejected() {
    let mut designer = FlowDesigner::new(EditorConfig::default(), test_registry());
    let id = Uuid::new_v4();
    let attrs = TemplateAttributes {
        id: Some(id),
        ..TemplateAttributes::default()
    };
    let invert = designer
        .add_block_from_template("invert", &attrs, Offset::ZERO)
        .unwrap();
    let and = designer
        .add_block_from_template("and", &TemplateAttributes::default(), Offset::new(300.0, 0.0))
        .unwrap();
    let out = designer.graph().block(invert).unwrap().pins[1].id;
    let input = designer.graph().block(and).unwrap().pins[0].id;
    designer.add_connection(invert, out, and, input).unwrap();

    let err = designer
        .add_block_from_template("invert", &attrs, Offset::new(0.0, 300.0))
        .unwrap_err();

    assert_eq!(err, FlowError::DuplicateBlock(id));
    let graph = designer.graph();
    assert_eq!(graph.blocks().len(), 2);
    assert_eq!(graph.connections().len(), 1);
    assert_eq!(graph.block(id).unwrap().location, Offset::ZERO);
}

#[test]
fn test_connection_endpoints_round_trip() {
    let harness = FlowHarness::new();
    harness.connect_a_to_b();

    let designer = harness.designer.borrow();
    let graph = designer.graph();
    let connection = &graph.connections()[0];
    let ((sb, sp), (eb, ep)) = graph.connection_endpoint_ids(connection).unwrap();

    assert_eq!((sb, sp), (harness.a, harness.only_pin(harness.a)));
    assert_eq!((eb, ep), (harness.b, harness.only_pin(harness.b)));
}

#[test]
fn test_attributes_load_from_json() {
    let id = Uuid::new_v4();
    let attrs: TemplateAttributes =
        serde_json::from_str(&format!(r#"{{ "id": "{}", "label": "Gate 7" }}"#, id)).unwrap();
    assert_eq!(attrs.id, Some(id));
    assert_eq!(attrs.label.as_deref(), Some("Gate 7"));
    assert_eq!(attrs.description, None);
}

#[test]
fn test_default_grid() {
    let designer = FlowDesigner::default();
    // 600 / 20 rows plus 800 / 20 columns
    assert_eq!(designer.grid_lines().len(), 70);

    let mut small = FlowDesigner::default();
    small.set_view_size(Size::new(10.0, 10.0));
    assert_eq!(small.grid_lines().count(), 0);
}
