#![forbid(unsafe_code)]

//! Integration tests for the grid against a real frame.
//!
//! These tests drive the grid the way a host does:
//! - render into a frame with a hit grid
//! - hit-test pointer events and feed them back to the state
//! - re-render and inspect the buffer

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use gridline_core::event::{Modifiers, MouseButton, MouseEvent, MouseEventKind};
use gridline_core::geometry::Rect;
use gridline_core::kind::RowKind;
use gridline_render::frame::{Frame, HitId};
use gridline_widgets::StatefulWidget;
use gridline_widgets::columns::{ColumnDef, ColumnRegistry};
use gridline_widgets::grid::{Grid, GridConfig, GridOutcome, GridState};
use gridline_widgets::selection::SelectAllState;
use gridline_widgets::sort::{SortDescriptor, SortDirection};
use gridline_widgets::tree::{Row, RowId};
use tracing::{Level, info};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::INFO)
        .try_init();
}

fn buffer_checksum(frame: &Frame) -> u64 {
    let mut hasher = DefaultHasher::new();
    for y in 0..frame.buffer.height() {
        for x in 0..frame.buffer.width() {
            if let Some(cell) = frame.buffer.get(x, y) {
                cell.ch.hash(&mut hasher);
                cell.fg.0.hash(&mut hasher);
                cell.bg.0.hash(&mut hasher);
                cell.attrs.bits().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

fn schema() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("name", "Name")
            .with_sort_key("name")
            .with_size_hint(10),
        ColumnDef::new("status", "Status").with_size_hint(6),
    ]
}

fn traces(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| Row::new(format!("r{i}")).with_field("name", format!("row {i}")))
        .collect()
}

fn session(id: &str, calls: usize) -> Row {
    let children = (0..calls)
        .map(|i| {
            Row::new(format!("{id}-c{i}"))
                .with_kind(RowKind::Llm)
                .with_field("name", format!("call {i}"))
        })
        .collect();
    Row::new(id)
        .with_field("name", id)
        .with_children(children)
}

fn render(grid: &Grid, state: &mut GridState, frame: &mut Frame) {
    frame.clear();
    let area = Rect::from_size(frame.buffer.width(), frame.buffer.height());
    grid.render(area, frame, state);
}

fn pointer(state: &mut GridState, frame: &Frame, event: MouseEvent) -> Vec<GridOutcome> {
    state.handle_mouse(&event, frame.hit_test(event.x, event.y))
}

fn click(state: &mut GridState, frame: &Frame, x: u16, y: u16, mods: Modifiers) -> Vec<GridOutcome> {
    let down = MouseEvent::click(x, y).with_modifiers(mods);
    let mut out = pointer(state, frame, down);
    out.extend(pointer(
        state,
        frame,
        MouseEvent::new(MouseEventKind::Up(MouseButton::Left), x, y),
    ));
    out
}

fn ids(list: &[&str]) -> Vec<RowId> {
    list.iter().map(|s| RowId::from(*s)).collect()
}

// ─── Scrolling ────────────────────────────────────────────────────

#[test]
fn wheel_scrolls_large_dataset() {
    init_tracing();
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(10_000));
    let mut frame = Frame::with_hit_grid(30, 11);

    render(&grid, &mut state, &mut frame);
    assert_eq!(frame.buffer.row_text(1), " ☐ row 0");
    assert_eq!(frame.buffer.row_text(10), " ☐ row 9");

    pointer(&mut state, &frame, MouseEvent::new(MouseEventKind::ScrollDown, 5, 5));
    render(&grid, &mut state, &mut frame);
    assert_eq!(frame.buffer.row_text(1), " ☐ row 3");

    pointer(&mut state, &frame, MouseEvent::new(MouseEventKind::ScrollUp, 5, 5));
    pointer(&mut state, &frame, MouseEvent::new(MouseEventKind::ScrollUp, 5, 5));
    render(&grid, &mut state, &mut frame);
    assert_eq!(frame.buffer.row_text(1), " ☐ row 0");

    let window = state.last_window();
    info!(
        render_start = window.render_start,
        render_end = window.render_end,
        "window after scroll"
    );
    assert!(window.rendered_len() <= 10 + 2 * state.config().overscan);
}

#[test]
fn scroll_into_view_reaches_the_end() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(500));
    let mut frame = Frame::with_hit_grid(30, 6);
    render(&grid, &mut state, &mut frame);

    state.scroll_into_view(499);
    render(&grid, &mut state, &mut frame);
    assert_eq!(frame.buffer.row_text(5), " ☐ row 499");
    assert_eq!(frame.buffer.row_text(1), " ☐ row 495");
}

// ─── Selection flows ─────────────────────────────────────────────

#[test]
fn click_range_then_select_all_through_hits() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(6));
    let mut frame = Frame::with_hit_grid(30, 8);
    render(&grid, &mut state, &mut frame);

    // Plain click on a leaf activates it and anchors later ranges.
    let out = click(&mut state, &frame, 5, 2, Modifiers::NONE);
    assert!(matches!(
        out.first(),
        Some(GridOutcome::Activate { row_id, index: 1, .. }) if row_id.as_str() == "r1"
    ));

    let out = click(&mut state, &frame, 5, 4, Modifiers::SHIFT);
    assert_eq!(out, vec![GridOutcome::SelectionChanged(ids(&["r1", "r2", "r3"]))]);
    render(&grid, &mut state, &mut frame);
    assert_eq!(state.select_all_state(), SelectAllState::Indeterminate);
    assert!(frame.buffer.row_text(0).starts_with(" ▣"));

    // Header checkbox: partial selection becomes full selection.
    let out = click(&mut state, &frame, 1, 0, Modifiers::NONE);
    assert_eq!(out.first(), Some(&GridOutcome::SelectAll(true)));
    render(&grid, &mut state, &mut frame);
    assert_eq!(state.selected_ids().len(), 6);
    assert!(frame.buffer.row_text(0).starts_with(" ☑"));

    // Second press clears.
    let out = click(&mut state, &frame, 1, 0, Modifiers::NONE);
    assert_eq!(out.first(), Some(&GridOutcome::SelectAll(false)));
    assert!(state.selected_ids().is_empty());
}

#[test]
fn ctrl_click_toggles_without_activating() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(3));
    let mut frame = Frame::with_hit_grid(30, 5);
    render(&grid, &mut state, &mut frame);

    let out = click(&mut state, &frame, 6, 3, Modifiers::CTRL);
    assert_eq!(out, vec![GridOutcome::SelectionChanged(ids(&["r2"]))]);
    let out = click(&mut state, &frame, 6, 3, Modifiers::SUPER);
    assert_eq!(out, vec![GridOutcome::SelectionChanged(Vec::new())]);
}

// ─── Tree flows ──────────────────────────────────────────────────

#[test]
fn expanding_a_session_shifts_rows_below() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(vec![session("s1", 2), session("s2", 1)]);
    let mut frame = Frame::with_hit_grid(40, 8);
    render(&grid, &mut state, &mut frame);
    assert_eq!(state.rendered_ids(), ids(&["s1", "s2"]).as_slice());

    let out = click(&mut state, &frame, 8, 1, Modifiers::NONE);
    assert_eq!(
        out,
        vec![GridOutcome::ExpansionToggled {
            row_id: Some(RowId::from("s1")),
            expanded: true,
        }]
    );
    render(&grid, &mut state, &mut frame);
    assert_eq!(
        state.rendered_ids(),
        ids(&["s1", "s1-c0", "s1-c1", "s2"]).as_slice()
    );
    assert!(frame.buffer.row_text(4).contains("s2"));

    // Shift-range across the expanded subtree follows display order.
    click(&mut state, &frame, 5, 2, Modifiers::NONE);
    let out = click(&mut state, &frame, 5, 4, Modifiers::SHIFT);
    assert_eq!(
        out,
        vec![GridOutcome::SelectionChanged(ids(&["s1-c0", "s1-c1", "s2"]))]
    );
}

// ─── Sorting ─────────────────────────────────────────────────────

#[test]
fn sort_menu_emits_descending_intent() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(5));
    let mut frame = Frame::with_hit_grid(30, 8);
    render(&grid, &mut state, &mut frame);

    // Header label press + release opens the menu below the header.
    assert!(click(&mut state, &frame, 4, 0, Modifiers::NONE).is_empty());
    render(&grid, &mut state, &mut frame);
    assert!(frame.buffer.row_text(2).contains("▼ Descending"));

    let out = click(&mut state, &frame, 5, 2, Modifiers::NONE);
    let [GridOutcome::Sort(intent)] = out.as_slice() else {
        panic!("expected a sort intent, got {out:?}");
    };
    assert_eq!(intent.sort_key, "name");
    assert_eq!(intent.direction, SortDirection::Descending);
    assert!(state.sort_menu().is_none());

    // The host applies the intent; the indicator follows.
    state.set_sort(Some(SortDescriptor::new("name", SortDirection::Descending)));
    render(&grid, &mut state, &mut frame);
    assert!(frame.buffer.row_text(0).contains('▼'));
}

// ─── Links, hit ownership, determinism ──────────────────────────

#[test]
fn row_links_cover_the_whole_row() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()))
        .with_row_link(|row| Some(format!("https://traces.local/{}", row.id)));
    state.set_rows(traces(2));
    let mut frame = Frame::with_hit_grid(30, 4);
    render(&grid, &mut state, &mut frame);

    assert_eq!(frame.link_at(5, 2), Some("https://traces.local/r1"));
    assert_eq!(frame.link_at(15, 1), Some("https://traces.local/r0"));
    assert_eq!(frame.link_at(5, 0), None);
}

#[test]
fn hits_from_other_widgets_are_ignored() {
    let grid = Grid::new().hit_id(HitId::new(7));
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(2));
    let mut frame = Frame::with_hit_grid(30, 4);
    render(&grid, &mut state, &mut frame);

    let (_, region, data) = frame.hit_test(5, 1).expect("row hit");
    let foreign = Some((HitId::new(8), region, data));
    assert!(state.handle_mouse(&MouseEvent::click(5, 1), foreign).is_empty());
    let own = Some((HitId::new(7), region, data));
    assert!(!state.handle_mouse(&MouseEvent::click(5, 1), own).is_empty());
}

#[test]
fn rendering_is_deterministic() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(vec![session("s1", 3), session("s2", 0)]);
    state.toggle_expansion("s1");
    let mut a = Frame::with_hit_grid(40, 10);
    let mut b = Frame::with_hit_grid(40, 10);
    render(&grid, &mut state, &mut a);
    render(&grid, &mut state, &mut b);
    assert_eq!(buffer_checksum(&a), buffer_checksum(&b));
    assert_eq!(a.buffer.to_text(), b.buffer.to_text());
}

#[test]
fn zero_area_render_is_noop() {
    let grid = Grid::new();
    let mut state = GridState::new(GridConfig::default(), ColumnRegistry::new(schema()));
    state.set_rows(traces(3));
    let mut frame = Frame::with_hit_grid(10, 4);
    grid.render(Rect::new(0, 0, 0, 0), &mut frame, &mut state);
    assert_eq!(frame.buffer.to_text().trim(), "");
}
