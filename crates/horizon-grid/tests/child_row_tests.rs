//! Tests for expanding and collapsing child rows.

mod common;

use std::sync::Arc;

use common::{Fixture, rows};
use horizon_grid::host::{Animation, ContextData};
use horizon_grid::{ChildRowOptions, ChildRowState, GridError, GridSettings, IdGenerator, Row};
use parking_lot::Mutex;
use serde_json::json;

type Events = Arc<Mutex<Vec<String>>>;

fn recorded(events: &Events, label: &'static str) -> impl Fn(&Row) + Send + Sync + 'static {
    let events = events.clone();
    move |_: &Row| events.lock().push(label.to_string())
}

fn details(events: &Events) -> ChildRowOptions {
    ChildRowOptions::new(r#"<p data-bind="text:details.name"></p>"#)
        .name("details")
        .after_show(recorded(events, "after_show"))
        .before_hide(recorded(events, "before_hide"))
        .after_hide(recorded(events, "after_hide"))
}

#[test]
fn test_show_and_hide() {
    let fixture = Fixture::new();
    let events: Events = Arc::default();
    let data = rows(json!([{"name": "Ann"}, {"name": "Bob"}]));
    let grid = fixture
        .init(GridSettings::new(data.clone()).child(details(&events)))
        .unwrap();
    let plugin = fixture.plugin();
    plugin.clear_log();

    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hidden);
    assert!(grid.show_children(&data[0]).unwrap());
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Shown);
    assert_eq!(grid.child_state(&data[1]), ChildRowState::Hidden);

    let nodes = plugin.child_nodes(&data[0]);
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].style("display").is_none());

    assert!(grid.hide_children(&data[0]).unwrap());
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hidden);
    assert!(plugin.child_nodes(&data[0]).is_empty());
    assert_eq!(plugin.log(), vec!["show_child", "hide_child"]);
    assert_eq!(*events.lock(), vec!["after_show", "before_hide", "after_hide"]);
}

#[test]
fn test_show_is_idempotent() {
    let fixture = Fixture::new();
    let events: Events = Arc::default();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(GridSettings::new(data.clone()).child(details(&events)))
        .unwrap();
    let plugin = fixture.plugin();
    plugin.clear_log();

    assert!(grid.show_children(&data[0]).unwrap());
    assert!(!grid.show_children(&data[0]).unwrap());
    assert_eq!(plugin.log(), vec!["show_child"]);
    assert_eq!(*events.lock(), vec!["after_show"]);
}

#[test]
fn test_hide_when_hidden_is_noop() {
    let fixture = Fixture::new();
    let events: Events = Arc::default();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(GridSettings::new(data.clone()).child(details(&events)))
        .unwrap();
    let plugin = fixture.plugin();
    plugin.clear_log();

    assert!(!grid.hide_children(&data[0]).unwrap());
    assert!(plugin.log().is_empty());
    assert!(events.lock().is_empty());
}

#[test]
fn test_panels_bound_under_their_names() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(
            GridSettings::new(data.clone())
                .alias("person")
                .child(ChildRowOptions::new("<p>first</p>").name("notes"))
                .child(
                    ChildRowOptions::new("<p>second</p>")
                        .name("audit")
                        .before_show(|row: &Row| Some(json!({"of": row.value("name")}))),
                ),
        )
        .unwrap();

    grid.show_children(&data[0]).unwrap();
    assert_eq!(fixture.plugin().child_nodes(&data[0]).len(), 2);

    let applied = fixture.host.applied.lock().clone();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].alias.as_deref(), Some("notes"));
    assert!(matches!(&applied[0].data, ContextData::Row(row) if *row == data[0]));
    assert_eq!(applied[1].alias.as_deref(), Some("audit"));
    assert!(matches!(&applied[1].data, ContextData::Value(value) if *value == json!({"of": "Ann"})));
    // the row stays reachable from the overridden scope
    assert_eq!(applied[1].row.as_ref(), Some(&data[0]));
}

#[test]
fn test_unnamed_panels_named_per_grid() {
    let aliases = |settings: GridSettings, row: &Row| {
        let fixture = Fixture::new();
        let grid = fixture.init(settings).unwrap();
        assert!(grid.plugin().is_some());
        grid.show_children(row).unwrap();
        fixture
            .host
            .applied
            .lock()
            .iter()
            .map(|applied| applied.alias.clone().unwrap_or_default())
            .collect::<Vec<_>>()
    };

    let data = rows(json!([{"name": "Ann"}]));
    let first = aliases(
        GridSettings::new(data.clone()).child("<p>a</p>").child("<p>b</p>"),
        &data[0],
    );
    let second = aliases(GridSettings::new(data.clone()).child("<p>a</p>"), &data[0]);
    assert_eq!(first, vec!["child_0", "child_1"]);
    assert_eq!(second, vec!["child_0"]);

    let custom = aliases(
        GridSettings::new(data.clone())
            .child_ids(IdGenerator::new("panel_"))
            .child("<p>a</p>"),
        &data[0],
    );
    assert_eq!(custom, vec!["panel_0"]);
}

#[test]
fn test_animated_transitions() {
    let fixture = Fixture::animated();
    let events: Events = Arc::default();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(
            GridSettings::new(data.clone()).child(details(&events).animate(Animation {
                duration_ms: 150,
                ..Animation::default()
            })),
        )
        .unwrap();
    let plugin = fixture.plugin();

    grid.show_children(&data[0]).unwrap();
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Showing);
    assert_eq!(fixture.animator.running(), 1);
    assert!(events.lock().is_empty());
    // transitions in progress are left alone
    assert_eq!(grid.toggle_children(&data[0]).unwrap(), ChildRowState::Showing);
    assert!(!grid.hide_children(&data[0]).unwrap());

    assert_eq!(fixture.animator.finish_all(), vec!["reveal"]);
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Shown);
    assert!(plugin.child_nodes(&data[0])[0].style("display").is_none());

    plugin.clear_log();
    grid.hide_children(&data[0]).unwrap();
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hiding);
    assert!(plugin.log().is_empty());

    assert_eq!(fixture.animator.finish_all(), vec!["conceal"]);
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hidden);
    assert_eq!(plugin.log(), vec!["hide_child"]);
    assert_eq!(*events.lock(), vec!["after_show", "before_hide", "after_hide"]);
}

#[test]
fn test_animation_without_animator_shows_immediately() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(
            GridSettings::new(data.clone())
                .child(ChildRowOptions::new("<p>slow</p>").animate(Animation::default())),
        )
        .unwrap();

    grid.show_children(&data[0]).unwrap();
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Shown);
    let nodes = fixture.plugin().child_nodes(&data[0]);
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].style("display").is_none());
    assert_eq!(fixture.animator.running(), 0);
}

#[test]
fn test_toggle() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(GridSettings::new(data.clone()).child("<p>more</p>"))
        .unwrap();

    assert_eq!(grid.toggle_children(&data[0]).unwrap(), ChildRowState::Shown);
    assert_eq!(grid.toggle_children(&data[0]).unwrap(), ChildRowState::Hidden);
}

#[test]
fn test_grid_without_children() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture.init(GridSettings::new(data.clone())).unwrap();

    assert!(grid.show_children(&data[0]).unwrap());
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Shown);
    assert!(fixture.plugin().child_nodes(&data[0]).is_empty());
    assert!(fixture.host.applied.lock().is_empty());
}

#[test]
fn test_departed_row_forgets_children() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}, {"name": "Bob"}]));
    let model = horizon_grid::DataModel::new(data.clone());
    let grid = fixture
        .init(GridSettings::new(model.clone()).child("<p>more</p>"))
        .unwrap();

    grid.show_children(&data[0]).unwrap();
    let cleaned = fixture.host.cleaned();
    model.rows().remove(&data[0]);

    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hidden);
    // one child panel plus the row's single cell
    assert_eq!(fixture.host.cleaned(), cleaned + 2);
}

#[test]
fn test_children_unavailable_after_dispose() {
    let fixture = Fixture::new();
    let data = rows(json!([{"name": "Ann"}]));
    let grid = fixture
        .init(GridSettings::new(data.clone()).child("<p>more</p>"))
        .unwrap();
    grid.show_children(&data[0]).unwrap();

    grid.dispose();
    assert_eq!(grid.show_children(&data[0]), Err(GridError::Disposed));
    assert_eq!(grid.hide_children(&data[0]), Err(GridError::Disposed));
    assert_eq!(grid.toggle_children(&data[0]), Err(GridError::Disposed));
    assert_eq!(grid.child_state(&data[0]), ChildRowState::Hidden);
}
