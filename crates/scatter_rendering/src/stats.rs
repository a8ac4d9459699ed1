//! Aggregate statistics across drawers.
//!
//! Drawers register with a [`DrawerRegistry`] on enable, publish a
//! [`DrawerReport`] after every update and unregister on disable. The
//! registry is an ordinary object passed by reference; callers decide its
//! lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Identifier handed out by [`DrawerRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawerId(u64);

/// Latest figures published by one drawer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawerReport {
    /// Drawer is enabled with a valid configuration.
    pub active: bool,
    /// Duration of the last update in milliseconds.
    pub exec_time_ms: f64,
    /// Mesh triangle count times draw count.
    pub triangles: u64,
}

/// Registry of live drawers.
#[derive(Debug, Default)]
pub struct DrawerRegistry {
    entries: RwLock<Vec<(DrawerId, DrawerReport)>>,
    next_id: AtomicU64,
}

impl DrawerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a drawer with an inactive report.
    pub fn register(&self) -> DrawerId {
        let id = DrawerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, DrawerReport::default()));
        id
    }

    /// Removes a drawer. Returns false if it was not registered.
    pub fn unregister(&self, id: DrawerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Replaces a drawer's report. Returns false if it is not registered.
    pub fn report(&self, id: DrawerId, report: DrawerReport) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, slot)) => {
                *slot = report;
                true
            }
            None => false,
        }
    }

    /// Number of registered drawers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of every report in registration order.
    #[must_use]
    pub fn reports(&self) -> Vec<(DrawerId, DrawerReport)> {
        self.entries.read().clone()
    }

    /// Sum over active drawers.
    #[must_use]
    pub fn totals(&self) -> DrawerReport {
        self.entries
            .read()
            .iter()
            .filter(|(_, report)| report.active)
            .fold(DrawerReport::default(), |mut total, (_, report)| {
                total.active = true;
                total.exec_time_ms += report.exec_time_ms;
                total.triangles += report.triangles;
                total
            })
    }

    /// Human-readable summary, one line per active drawer, then the number
    /// of inactive drawers (if any) and the totals.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let entries = self.entries.read();
        let mut lines = Vec::with_capacity(entries.len() + 2);
        let mut disabled = 0;
        let mut total_ms = 0.0;
        let mut total_tris = 0;

        for (index, (_, report)) in entries.iter().enumerate() {
            if report.active {
                total_ms += report.exec_time_ms;
                total_tris += report.triangles;
                lines.push(format!(
                    "{index}. EXEC: {:.2} ms \t TRIS: {}",
                    report.exec_time_ms,
                    format_triangles(report.triangles)
                ));
            } else {
                disabled += 1;
            }
        }

        if disabled > 0 {
            lines.push(format!("Disabled count : {disabled}"));
        }
        lines.push(format!(
            "(totals) EXEC: {total_ms:.2} ms \t TRIS: {}",
            format_triangles(total_tris)
        ));
        lines
    }
}

/// Formats a triangle count as `1.2m`, `3.4k` or the plain number.
#[must_use]
pub fn format_triangles(value: u64) -> String {
    let value_f = value as f64;
    if value_f > 1e6 {
        format!("{:.1}m", value_f / 1e6)
    } else if value_f > 1e3 {
        format!("{:.1}k", value_f / 1e3)
    } else {
        value.to_string()
    }
}
