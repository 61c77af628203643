//! Level 2: Drag Tests
//!
//! Moving existing blocks, dragging new blocks in from a palette, and
//! cancelling drags.

mod common;

use common::harness::FlowHarness;
use flow_designer::{
    ElementTarget, GridSnap, Offset, PointerEvent, PointerGesture, Selection, TemplateAttributes,
};

#[test]
fn test_drag_preserves_grab_offset() {
    let harness = FlowHarness::new();
    harness.press_block(harness.a, 3.0, 3.0);
    harness.send(ElementTarget::Block(harness.a), PointerGesture::Move, 103.0, 53.0);

    assert_eq!(harness.location(harness.a), Offset::new(100.0, 50.0));

    harness.send(ElementTarget::Block(harness.a), PointerGesture::Up, 103.0, 53.0);
    let designer = harness.designer.borrow();
    assert!(designer.is_idle());
    assert_eq!(designer.graph().block(harness.a).unwrap().location, Offset::new(100.0, 50.0));
}

#[test]
fn test_canvas_moves_continue_a_drag() {
    let harness = FlowHarness::new();
    harness.press_block(harness.b, 210.0, 10.0);
    harness.move_on_canvas(250.0, 300.0);
    harness.move_on_canvas(260.0, 310.0);
    harness.release_on_canvas(260.0, 310.0);

    assert_eq!(harness.location(harness.b), Offset::new(250.0, 300.0));
}

#[test]
fn test_drag_selects_and_boosts_block() {
    let harness = FlowHarness::new();
    harness.press_block(harness.a, 5.0, 5.0);
    {
        let designer = harness.designer.borrow();
        assert_eq!(designer.selection(), Selection::Block(harness.a));
        let a = designer.graph().block(harness.a).unwrap();
        let b = designer.graph().block(harness.b).unwrap();
        assert!(a.selected);
        assert!(a.z() > b.z());
        assert_eq!(designer.dragging().unwrap().original_location, Offset::ZERO);
    }

    harness.release_on_canvas(5.0, 5.0);
    let designer = harness.designer.borrow();
    let a = designer.graph().block(harness.a).unwrap();
    assert_eq!(a.z_boost, 0);
    assert_eq!(a.z_order, 0);
}

#[test]
fn test_leaving_canvas_restores_block() {
    let harness = FlowHarness::new();
    harness.press_block(harness.a, 5.0, 5.0);
    harness.move_on_canvas(405.0, 405.0);
    assert_eq!(harness.location(harness.a), Offset::new(400.0, 400.0));

    harness.leave_canvas();
    assert_eq!(harness.location(harness.a), Offset::ZERO);
    assert!(harness.designer.borrow().is_idle());

    // Release after leaving does nothing
    harness.release_on_canvas(405.0, 405.0);
    assert_eq!(harness.location(harness.a), Offset::ZERO);
}

#[test]
fn test_snap_policy_hook() {
    let harness = FlowHarness::new();
    harness
        .designer
        .borrow_mut()
        .set_snap_policy(GridSnap { grid_size: 20.0 });
    harness.press_block(harness.a, 0.0, 0.0);
    harness.move_on_canvas(33.0, 47.0);
    assert_eq!(harness.location(harness.a), Offset::new(40.0, 40.0));
}

#[test]
fn test_palette_drop_commits_new_block() {
    let harness = FlowHarness::new();
    let id = harness
        .designer
        .borrow_mut()
        .begin_new_block_drag("and", &TemplateAttributes::default(), PointerEvent::at(75.0, 120.0))
        .unwrap();
    {
        let designer = harness.designer.borrow();
        assert!(designer.graph().block(id).is_err());
        let pending = designer.new_block().unwrap();
        assert!(pending.dragging_as_new);
        assert_eq!(pending.location, Offset::new(0.0, 100.0));
    }

    harness.move_on_canvas(75.0, 220.0);
    harness.release_on_canvas(75.0, 220.0);

    let designer = harness.designer.borrow();
    let block = designer.graph().block(id).unwrap();
    assert_eq!(block.location, Offset::new(0.0, 200.0));
    assert!(!block.dragging_as_new);
    assert_eq!(block.z_order, 2);
    assert_eq!(designer.selection(), Selection::Block(id));
}

#[test]
fn test_palette_drop_on_existing_block_is_discarded() {
    let harness = FlowHarness::new();
    let id = harness
        .designer
        .borrow_mut()
        .begin_new_block_drag("or", &TemplateAttributes::default(), PointerEvent::at(275.0, 20.0))
        .unwrap();
    harness.release_on_canvas(275.0, 20.0);

    let designer = harness.designer.borrow();
    assert!(designer.graph().block(id).is_err());
    assert_eq!(designer.graph().blocks().len(), 2);
    assert!(designer.new_block().is_none());
}

#[test]
fn test_palette_drag_cancelled_by_leave() {
    let harness = FlowHarness::new();
    harness
        .designer
        .borrow_mut()
        .begin_new_block_drag(
            "delay",
            &TemplateAttributes::default(),
            PointerEvent::at(400.0, 400.0),
        )
        .unwrap();
    assert_eq!(harness.designer.borrow().block_views().len(), 3);

    harness.leave_canvas();
    let designer = harness.designer.borrow();
    assert_eq!(designer.block_views().len(), 2);
    assert!(designer.new_block().is_none());
}

#[test]
fn test_leaving_canvas_abandons_connection() {
    let harness = FlowHarness::new();
    let b_in = harness.only_pin(harness.b);
    harness.press_pin(harness.a, harness.only_pin(harness.a));
    let (x, y) = harness.pin_center(harness.b, b_in);
    harness.move_on_canvas(x, y);
    assert!(harness.designer.borrow().connecting().is_some());

    harness.leave_canvas();
    assert!(harness.designer.borrow().is_idle());
    assert!(harness.designer.borrow().connecting_view().is_none());

    // Releasing over B's input afterwards connects nothing
    harness.send(
        ElementTarget::Pin {
            block: harness.b,
            pin: b_in,
        },
        PointerGesture::Up,
        x,
        y,
    );
    let designer = harness.designer.borrow();
    assert!(designer.is_idle());
    assert!(designer.graph().connections().is_empty());
}
