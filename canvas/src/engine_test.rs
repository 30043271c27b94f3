#![allow(clippy::float_cmp)]

use store::MemoryStore;

use super::*;
use crate::layer::ImageSource;
use crate::shape::ShapeKind;
use crate::testing::RecordingLayer;

// =============================================================
// Helpers
// =============================================================

fn blank() -> ImageSource {
    ImageSource { url: "blank.png".to_owned(), width: 800, height: 600 }
}

fn css() -> Size {
    Size::new(800.0, 600.0)
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn core() -> EditorCore<RecordingLayer> {
    let layer = || RecordingLayer::new(1, 1);
    let stack = LayerStack { base: layer(), preview: layer(), ink: layer(), overlay: layer() };
    let Ok(core) = EditorCore::new(stack, 1.0, EditorConfig::default()) else {
        panic!("recording layers never fail");
    };
    core
}

fn opened() -> EditorCore<RecordingLayer> {
    let mut c = core();
    c.open(Some(&blank()), None, None, css(), 0.0);
    c
}

fn stroke(c: &mut EditorCore<RecordingLayer>, points: &[Point], now_ms: f64) -> Vec<Action> {
    let Some((first, rest)) = points.split_first() else {
        panic!("need at least one point");
    };
    c.on_pointer_down(*first, Some(1));
    for p in rest {
        c.on_pointer_move(*p);
    }
    let last = rest.last().unwrap_or(first);
    c.on_pointer_up(*last, now_ms)
}

fn has_action(actions: &[Action], want: &Action) -> bool {
    actions.iter().any(|a| a == want)
}

fn edit_requested(actions: &[Action]) -> Option<TextId> {
    actions.iter().find_map(|a| match a {
        Action::EditTextRequested { id } => Some(*id),
        _ => None,
    })
}

// =============================================================
// Open
// =============================================================

#[test]
fn out_of_range_config_is_rejected() {
    let layer = || RecordingLayer::new(1, 1);
    let stack = LayerStack { base: layer(), preview: layer(), ink: layer(), overlay: layer() };
    let config = EditorConfig { history_cap: 0, ..EditorConfig::default() };
    match EditorCore::new(stack, 1.0, config) {
        Err(EditorError::Config(ConfigError::Invalid { field, .. })) => assert_eq!(field, "history_cap"),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("history_cap 0 should be rejected"),
    }
}

#[test]
fn open_sizes_surface_and_seeds_history() {
    let mut c = core();
    let actions = c.open(Some(&blank()), None, None, css(), 0.0);
    assert_eq!(c.surface().size(), Size::new(800.0, 600.0));
    assert_eq!(c.history().len(), 1);
    assert!(has_action(&actions, &Action::HistoryChanged { can_undo: false, can_redo: false }));
    assert!(has_action(&actions, &Action::SetCursor("crosshair")));
}

#[test]
fn open_without_image_starts_blank() {
    let mut c = core();
    c.open(None, None, None, css(), 0.0);
    assert_eq!(c.history().len(), 1);
    assert!(c.surface().layers().base.marks().is_empty());
}

#[test]
fn reopening_resets_previous_target() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    c.tick(200.0);
    c.select_tool(Tool::Eraser);
    c.set_notes("old".to_owned());

    c.open(Some(&blank()), None, None, css(), 500.0);
    assert_eq!(c.history().len(), 1);
    assert!(!c.history().can_undo());
    assert_eq!(c.tools().active(), Tool::Pen);
    assert!(c.surface().stroke_layer().marks().is_empty());
    assert_eq!(c.notes(), "");
}

// =============================================================
// Drawing and history
// =============================================================

#[test]
fn pen_stroke_adds_one_entry_after_debounce() {
    let mut c = opened();
    let actions = stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    assert!(has_action(&actions, &Action::ReleasePointer(1)));
    assert_eq!(c.history().len(), 1);
    assert!(c.history().has_pending());

    assert!(c.tick(50.0).is_empty());
    let actions = c.tick(110.0);
    assert!(has_action(&actions, &Action::HistoryChanged { can_undo: true, can_redo: false }));
    assert_eq!(c.history().len(), 2);
}

#[test]
fn pointer_down_requests_capture() {
    let mut c = opened();
    let actions = c.on_pointer_down(pt(5.0, 5.0), Some(9));
    assert!(has_action(&actions, &Action::CapturePointer(9)));
    assert_eq!(c.gesture().captured_pointer(), Some(9));
}

#[test]
fn strokes_inside_the_window_merge() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(50.0, 50.0)], 10.0);
    stroke(&mut c, &[pt(60.0, 10.0), pt(90.0, 50.0)], 60.0);
    c.tick(500.0);
    assert_eq!(c.history().len(), 2);
}

#[test]
fn pen_tap_leaves_history_alone() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0)], 10.0);
    c.tick(500.0);
    assert_eq!(c.history().len(), 1);
    assert!(!c.history().has_pending());
}

#[test]
fn second_pointer_is_ignored() {
    let mut c = opened();
    c.on_pointer_down(pt(10.0, 10.0), Some(1));
    assert!(c.on_pointer_down(pt(20.0, 20.0), Some(2)).is_empty());
    assert_eq!(c.gesture().captured_pointer(), Some(1));
}

#[test]
fn undo_and_redo_restore_ink() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    c.tick(200.0);
    assert_eq!(c.surface().stroke_layer().marks().len(), 1);

    let actions = c.undo();
    assert!(has_action(&actions, &Action::HistoryChanged { can_undo: false, can_redo: true }));
    assert!(c.surface().stroke_layer().marks().is_empty());

    c.redo();
    assert_eq!(c.surface().stroke_layer().marks().len(), 1);
    assert!(!c.history().can_redo());
}

#[test]
fn undo_commits_pending_stroke_first() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    c.undo();
    assert_eq!(c.history().len(), 2);
    assert!(c.surface().stroke_layer().marks().is_empty());
}

#[test]
fn shape_drag_is_undoable() {
    let mut c = opened();
    c.select_tool(Tool::Shape);
    c.tools_mut().set_shape_kind(ShapeKind::Rectangle);
    stroke(&mut c, &[pt(100.0, 100.0), pt(200.0, 150.0)], 10.0);
    assert_eq!(c.surface().shapes().len(), 1);
    assert_eq!(c.surface().shapes().as_slice()[0].kind, ShapeKind::Rectangle);

    c.tick(200.0);
    c.undo();
    assert!(c.surface().shapes().is_empty());
}

#[test]
fn eraser_grazing_a_thick_outline_removes_the_shape() {
    let mut c = opened();
    c.select_tool(Tool::Shape);
    c.tools_mut().set_shape_kind(ShapeKind::Ellipse);
    assert_eq!(c.tools_mut().set_size(9.0), Some(9.0));
    stroke(&mut c, &[pt(100.0, 100.0), pt(300.0, 300.0)], 10.0);
    assert_eq!(c.surface().shapes().len(), 1);

    // The centerline sits at x = 300; the painted edge reaches 304.5.
    c.select_tool(Tool::Eraser);
    assert_eq!(c.tools_mut().set_size(4.0), Some(4.0));
    stroke(&mut c, &[pt(305.0, 150.0), pt(305.0, 200.0), pt(305.0, 250.0)], 300.0);
    assert!(c.surface().shapes().is_empty());
    assert!(c.surface().layers().ink.marks().iter().all(|m| m == "erase"));
    let Ok(bundle) = c.export() else {
        panic!("recording layers never fail");
    };
    assert!(bundle.shapes.is_empty());
    assert!(!bundle.composited.contains("stroke:"));
}

#[test]
fn highlighter_toggles_preview_opacity() {
    let mut c = opened();
    c.select_tool(Tool::Highlighter);
    let down = c.on_pointer_down(pt(10.0, 10.0), Some(1));
    assert!(has_action(&down, &Action::SetPreviewOpacity(0.18)));
    c.on_pointer_move(pt(80.0, 10.0));
    let up = c.on_pointer_up(pt(80.0, 10.0), 10.0);
    assert!(has_action(&up, &Action::SetPreviewOpacity(1.0)));
    assert!(c.history().has_pending());
}

#[test]
fn escape_cancels_and_releases() {
    let mut c = opened();
    c.select_tool(Tool::Shape);
    c.on_pointer_down(pt(10.0, 10.0), Some(3));
    c.on_pointer_move(pt(90.0, 90.0));
    let actions = c.on_key_down("Escape");
    assert!(has_action(&actions, &Action::ReleasePointer(3)));
    assert!(c.gesture().is_idle());
    assert!(c.surface().shapes().is_empty());
    assert!(c.on_key_down("a").is_empty());
}

#[test]
fn clear_all_wipes_ink_and_history() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    c.select_tool(Tool::Shape);
    stroke(&mut c, &[pt(100.0, 100.0), pt(200.0, 150.0)], 300.0);
    c.tick(1000.0);

    c.clear_all(2000.0);
    assert_eq!(c.history().len(), 1);
    assert!(c.surface().shapes().is_empty());
    assert!(c.surface().stroke_layer().marks().is_empty());
}

// =============================================================
// Tools
// =============================================================

#[test]
fn tool_switch_drops_gesture_and_ring() {
    let mut c = opened();
    c.select_tool(Tool::Eraser);
    c.on_pointer_move(pt(50.0, 50.0));
    assert!(c.surface().eraser_cursor_visible());

    let actions = c.select_tool(Tool::Pen);
    assert!(!c.surface().eraser_cursor_visible());
    assert!(has_action(&actions, &Action::SetCursor("crosshair")));
    assert!(c.select_tool(Tool::Pen).is_empty());
}

#[test]
fn leaving_hides_eraser_ring() {
    let mut c = opened();
    c.select_tool(Tool::Eraser);
    c.on_pointer_move(pt(50.0, 50.0));
    assert!(has_action(&c.on_pointer_leave(), &Action::RenderNeeded));
    assert!(!c.surface().eraser_cursor_visible());
    assert!(c.on_pointer_leave().is_empty());
}

// =============================================================
// Text boxes
// =============================================================

fn place_text(c: &mut EditorCore<RecordingLayer>) -> TextId {
    c.select_tool(Tool::Text);
    let actions = c.on_pointer_down(pt(100.0, 100.0), Some(1));
    assert!(has_action(&actions, &Action::TextBoxesChanged));
    let Some(id) = edit_requested(&actions) else {
        panic!("placing a box should request editing");
    };
    assert!(c.set_text(&id, "Crack".to_owned(), 40.0));
    id
}

#[test]
fn click_on_box_requests_edit() {
    let mut c = opened();
    let id = place_text(&mut c);
    c.on_pointer_down(pt(120.0, 110.0), Some(2));
    let actions = c.on_pointer_up(pt(121.0, 111.0), 10.0);
    assert_eq!(edit_requested(&actions), Some(id));
    assert!(has_action(&actions, &Action::ReleasePointer(2)));
}

#[test]
fn dragging_box_moves_it() {
    let mut c = opened();
    let id = place_text(&mut c);
    c.on_pointer_down(pt(120.0, 110.0), Some(2));
    let moved = c.on_pointer_move(pt(220.0, 210.0));
    assert!(has_action(&moved, &Action::TextBoxesChanged));
    let actions = c.on_pointer_up(pt(220.0, 210.0), 10.0);
    assert_eq!(edit_requested(&actions), None);

    let Some(b) = c.surface().texts().get(&id) else {
        panic!("box should still exist");
    };
    assert_eq!((b.x, b.y), (200.0, 200.0));
}

#[test]
fn eraser_removes_text_box() {
    let mut c = opened();
    place_text(&mut c);
    c.select_tool(Tool::Eraser);
    let actions = c.on_pointer_down(pt(200.0, 120.0), Some(1));
    assert!(has_action(&actions, &Action::TextBoxesChanged));
    assert!(c.surface().texts().is_empty());
}

#[test]
fn undo_brings_back_an_erased_text_box() {
    let mut c = opened();
    let id = place_text(&mut c);
    c.tick(200.0);
    assert_eq!(c.history().len(), 2);

    c.select_tool(Tool::Eraser);
    c.on_pointer_down(pt(200.0, 120.0), Some(1));
    c.on_pointer_up(pt(200.0, 120.0), 300.0);
    assert!(c.surface().texts().is_empty());
    c.tick(600.0);
    assert_eq!(c.history().len(), 3);

    let actions = c.undo();
    assert!(has_action(&actions, &Action::TextBoxesChanged));
    assert!(c.surface().texts().get(&id).is_some());

    c.redo();
    assert!(c.surface().texts().is_empty());
}

#[test]
fn undoing_a_later_stroke_keeps_the_text_box() {
    let mut c = opened();
    let id = place_text(&mut c);
    c.tick(200.0);
    c.select_tool(Tool::Pen);
    stroke(&mut c, &[pt(400.0, 400.0), pt(500.0, 500.0)], 300.0);
    c.tick(600.0);

    c.undo();
    assert!(c.surface().stroke_layer().marks().is_empty());
    assert!(c.surface().texts().get(&id).is_some());
}

#[test]
fn delete_text_reports_change_once() {
    let mut c = opened();
    let id = place_text(&mut c);
    assert_eq!(c.delete_text(&id), vec![Action::TextBoxesChanged]);
    assert!(c.delete_text(&id).is_empty());
}

// =============================================================
// Save / export / persist
// =============================================================

#[test]
fn save_carries_ink_shapes_texts_and_notes() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    place_text(&mut c);
    c.set_notes("north wall".to_owned());

    let record = c.save();
    assert_eq!(record.ink_url.as_deref(), Some("data:test,stroke:#ff3b30"));
    assert_eq!(record.composed_url.as_deref(), Some("data:test,image:blank.png|stroke:#ff3b30"));
    assert_eq!(record.texts.len(), 1);
    assert_eq!(record.texts[0].w, 360.0);
    assert_eq!(record.notes, "north wall");
}

#[test]
fn blank_ink_is_not_saved() {
    let c = opened();
    assert_eq!(c.save().ink_url, None);
}

#[test]
fn reopening_a_record_restores_shapes_and_texts() {
    let mut c = opened();
    c.select_tool(Tool::Shape);
    stroke(&mut c, &[pt(100.0, 100.0), pt(200.0, 150.0)], 10.0);
    place_text(&mut c);
    let record = c.save();

    let mut fresh = core();
    fresh.open(Some(&blank()), None, Some(&record), css(), 0.0);
    assert_eq!(fresh.surface().shapes().len(), 1);
    assert_eq!(fresh.surface().texts().len(), 1);
    assert_eq!(fresh.history().len(), 1);
}

#[test]
fn export_bundles_backing_size() {
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    let Ok(bundle) = c.export() else {
        panic!("export should succeed");
    };
    assert_eq!((bundle.width, bundle.height), (800.0, 600.0));
    assert_eq!(bundle.ink, "data:test,stroke:#ff3b30");
    assert!(bundle.composited.starts_with("data:test,image:blank.png"));
}

#[tokio::test]
async fn persist_round_trips_through_store() {
    let store = MemoryStore::new();
    let mut c = opened();
    stroke(&mut c, &[pt(10.0, 10.0), pt(100.0, 100.0)], 10.0);
    assert_eq!(c.persist(&store, "JL_annotation_a_v1").await, SaveStatus::Saved);
    assert!(!c.history().has_pending());

    let record = EditorCore::<RecordingLayer>::fetch_record(&store, "JL_annotation_a_v1").await;
    assert_eq!(record.and_then(|r| r.ink_url), Some("data:test,stroke:#ff3b30".to_owned()));
}

#[tokio::test]
async fn save_failure_is_reported_once() {
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let mut c = opened();
    assert_eq!(c.persist(&store, "k").await, SaveStatus::Failed { notify: true });
    assert_eq!(c.persist(&store, "k").await, SaveStatus::Failed { notify: false });
}

#[tokio::test]
async fn missing_record_fetches_none() {
    let store = MemoryStore::new();
    assert_eq!(EditorCore::<RecordingLayer>::fetch_record(&store, "nothing").await, None);
}
