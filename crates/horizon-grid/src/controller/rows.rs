//! Row mutation flow: keeps the table plugin in step with the row collection.

use std::sync::Arc;

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::targets;

use crate::host::{ServerPage, TablePlugin};
use crate::row::{Row, diff_rows};

use super::{GridShared, GridState};

impl GridShared {
    /// Before-change: remember what the plugin currently holds.
    pub(super) fn rows_changing(&self, old: &[Row]) {
        *self.snapshot.lock() = Some(old.to_vec());
    }

    /// After-change: push the difference to the plugin.
    pub(super) fn rows_changed(&self, rows: &[Row]) {
        if self.state() != GridState::Live {
            return;
        }
        let Some(plugin) = self.plugin().cloned() else {
            return;
        };

        let snapshot = self.snapshot.lock().take();
        let previous = snapshot.unwrap_or_else(|| self.shown.lock().clone());
        *self.shown.lock() = rows.to_vec();

        let diff = diff_rows(&previous, rows);
        for row in &diff.removed {
            self.release_row(row);
        }

        if self.server_side {
            self.forward_page(&plugin, rows);
            return;
        }

        let _perf = PerfSpan::new("grid_row_sync");
        tracing::debug!(
            target: targets::CONTROLLER,
            removed = diff.removed.len(),
            added = diff.added.len(),
            "syncing rows"
        );
        if !diff.removed.is_empty() {
            plugin.remove_rows(&diff.removed);
        }
        if !diff.added.is_empty() {
            plugin.add_rows(&diff.added);
        }
        plugin.draw();
    }

    /// Hand a server page to the waiting request, or draw it directly.
    fn forward_page(&self, plugin: &Arc<dyn TablePlugin>, rows: &[Row]) {
        let _perf = PerfSpan::new("grid_server_page");
        let total = self.data_model.server_total().get().unwrap_or(rows.len());
        let mut page = ServerPage {
            draw: 0,
            data: rows.to_vec(),
            records_total: total,
            records_filtered: total,
        };

        let pending = self.pending.lock().take();
        match pending {
            Some(request) => {
                page.draw = request.draw;
                tracing::debug!(target: targets::SERVER, draw = page.draw, rows = rows.len(), "answering request");
                (request.callback)(page);
            }
            None => plugin.draw_page(page),
        }

        self.rebind_header(plugin);
    }

    /// Drop everything held for a row that left the grid.
    pub(super) fn release_row(&self, row: &Row) {
        for model in &self.selection {
            model.on_unregister(row);
        }
        if let Some(children) = self.children.get() {
            children.forget(row);
        }

        let nodes = self.bindings.lock().clear_row(row.id());
        for node in &nodes {
            self.host.clean_node(node);
        }

        self.data_model.forget(row);
        self.row_contexts.lock().remove(&row.id());
        self.realized.lock().remove(&row.id());
    }
}
