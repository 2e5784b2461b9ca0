//! Tests for responsive column hiding.

mod common;

use common::{Fixture, rows};
use horizon_grid::{GridSettings, Observable, ResizeState};
use serde_json::json;

#[test]
fn test_revealed_cells_bound_after_resize() {
    let fixture = Fixture::responsive(&[1]);
    let state = Observable::new(ResizeState::default());
    let grid = fixture
        .init(
            GridSettings::new(rows(json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}])))
                .resize(state.clone()),
        )
        .unwrap();
    // column "b" is collapsed: one header cell and one cell per row
    assert_eq!(grid.bound_cells(), 3);

    fixture.plugin().reveal_column(1);

    assert_eq!(
        state.get(),
        ResizeState {
            columns: vec!["a".to_string(), "b".to_string()],
            hidden_columns: vec![false, false],
        }
    );
    // rebinding waits for the task queue
    assert_eq!(grid.bound_cells(), 3);
    assert_eq!(fixture.tasks.pending_count(), 1);

    fixture.tasks.process_all();
    assert_eq!(grid.bound_cells(), 6);
    assert_eq!(fixture.host.renders_of(r#"<span data-bind="text:b"></span>"#), 2);
}

#[test]
fn test_resize_state_serializes_camel_case() {
    let state = ResizeState {
        columns: vec!["a".to_string()],
        hidden_columns: vec![true],
    };
    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        json!({"columns": ["a"], "hiddenColumns": [true]})
    );
}

#[test]
fn test_resize_ignored_without_state() {
    let fixture = Fixture::responsive(&[0]);
    let grid = fixture
        .init(GridSettings::new(rows(json!([{"a": 1, "b": 2}]))))
        .unwrap();
    assert_eq!(grid.bound_cells(), 2);

    fixture.plugin().reveal_column(0);
    assert_eq!(fixture.tasks.pending_count(), 0);
    // an explicit rebind still picks up the revealed cells
    grid.rebind().unwrap();
    assert_eq!(grid.bound_cells(), 4);
}

#[test]
fn test_hidden_columns_ignored_by_responsive() {
    let fixture = Fixture::responsive(&[]);
    let grid = fixture
        .init(GridSettings::new(rows(json!([{"a": 1, "b": 2}]))))
        .unwrap();
    let plugin = fixture.plugin();
    let responsive = plugin.responsive.clone().expect("responsive capability");

    assert_eq!(responsive.ignored.lock().get(&1), Some(&false));
    grid.columns()[1].visible().set(false);
    assert_eq!(responsive.ignored.lock().get(&1), Some(&true));
    grid.columns()[1].visible().set(true);
    assert_eq!(responsive.ignored.lock().get(&1), Some(&false));
}

#[test]
fn test_resize_after_dispose_is_ignored() {
    let fixture = Fixture::responsive(&[1]);
    let grid = fixture
        .init(
            GridSettings::new(rows(json!([{"a": 1, "b": 2}])))
                .resize(Observable::new(ResizeState::default())),
        )
        .unwrap();
    grid.dispose();

    fixture.plugin().reveal_column(1);
    fixture.tasks.process_all();
    assert_eq!(grid.bound_cells(), 0);
}
