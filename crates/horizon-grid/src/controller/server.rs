//! Server-request flow.
//!
//! In server mode the table plugin asks for each page through its request
//! callback. The adapter translates the request into the data model's query
//! parameters; the data model's refresh then performs the actual request, and
//! the resulting row replacement answers the plugin (see `rows.rs`).

use std::sync::Arc;

use horizon_grid_core::logging::targets;
use serde_json::{Map, Value, json};

use crate::column::ColumnModel;
use crate::host::{ServerCallback, ServerColumn, ServerRequest};
use crate::options::OrderEntry;
use crate::value::structurally_equal;

use super::{GridShared, GridState, PendingRequest};

/// Active per-column searches as `[{"column": name, "value": text}]`.
pub fn normalize_filters(columns: &[ServerColumn]) -> Value {
    Value::Array(
        columns
            .iter()
            .filter(|column| !column.search_value.is_empty())
            .map(|column| json!({"column": column.name, "value": column.search_value}))
            .collect(),
    )
}

/// Sort keys as `{name: {"direction": "ASC" | "DEC", "type": tag}}`.
///
/// Keys referring to unknown column positions are skipped.
pub fn order_descriptor(order: &[OrderEntry], columns: &[Arc<ColumnModel>]) -> Value {
    let mut descriptor = Map::new();
    for (index, direction) in order {
        if let Some(column) = columns.get(*index) {
            descriptor.insert(
                column.name().to_string(),
                json!({"direction": direction.as_str(), "type": column.kind().tag()}),
            );
        }
    }
    Value::Object(descriptor)
}

impl GridShared {
    pub(super) fn server_request(&self, request: ServerRequest, callback: ServerCallback) {
        match self.state() {
            GridState::Live => {}
            GridState::Disposed => return,
            GridState::Uninitialized | GridState::Bound => {
                // Requests issued while attaching are served once the grid is live.
                *self.queued.lock() = Some((request, callback));
                return;
            }
        }

        tracing::debug!(
            target: targets::SERVER,
            draw = request.draw,
            start = request.start,
            length = request.length,
            "table requested a page"
        );

        let superseded = self.pending.lock().replace(PendingRequest {
            draw: request.draw,
            callback,
        });
        if let Some(previous) = superseded {
            tracing::debug!(target: targets::SERVER, draw = previous.draw, "request superseded");
        }

        let filters = normalize_filters(&request.columns);
        let order = order_descriptor(&request.order, &self.columns);
        let model = &self.data_model;

        let changed = model.batch(|| {
            if !structurally_equal(&model.filters().get(), &filters) {
                model.filters().set(filters);
            }
            model.start().set(request.start);
            model.count().set(request.length);
            model.search().set(request.search.clone());
            if !structurally_equal(&model.order().get(), &order) {
                model.order().set(order);
            }
        });

        if !changed {
            model.refresh();
        }
    }
}
