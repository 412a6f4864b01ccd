//! Per-run bookkeeping of generated, declined and pending tables.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedModel {
    pub table: String,
    pub dest: PathBuf,
}

/// State for one top-level generation call.
///
/// `created` and `skipped` never share a table, and no class is assigned to
/// two tables. A run is finished only once the queue has been drained.
#[derive(Debug, Default)]
pub struct GenerationRegistry {
    created: BTreeMap<String, String>,
    /// class -> table, the reverse of `created`.
    owners: BTreeMap<String, String>,
    skipped: BTreeSet<String>,
    queued: VecDeque<QueuedModel>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_created(&mut self, table: &str, class_name: &str) {
        self.skipped.remove(table);
        self.owners
            .entry(class_name.to_string())
            .or_insert_with(|| table.to_string());
        self.created
            .insert(table.to_string(), class_name.to_string());
    }

    /// No-op for a table that already has a class.
    pub fn mark_skipped(&mut self, table: &str) {
        if !self.created.contains_key(table) {
            self.skipped.insert(table.to_string());
        }
    }

    pub fn enqueue(&mut self, table: &str, dest: PathBuf) {
        self.queued.push_back(QueuedModel {
            table: table.to_string(),
            dest,
        });
    }

    /// Pop queued entries in FIFO order. Entries are removed as they are yielded.
    pub fn drain_queue(&mut self) -> QueueDrain<'_> {
        QueueDrain {
            queue: &mut self.queued,
        }
    }

    pub fn is_known(&self, table: &str) -> bool {
        self.created.contains_key(table) || self.skipped.contains(table) || self.is_queued(table)
    }

    pub fn created_class(&self, table: &str) -> Option<&str> {
        self.created.get(table).map(String::as_str)
    }

    /// Table that `class_name` was created for in this run.
    pub fn class_owner(&self, class_name: &str) -> Option<&str> {
        self.owners.get(class_name).map(String::as_str)
    }

    pub fn is_skipped(&self, table: &str) -> bool {
        self.skipped.contains(table)
    }

    pub fn is_queued(&self, table: &str) -> bool {
        self.queued.iter().any(|q| q.table == table)
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }
}

pub struct QueueDrain<'a> {
    queue: &'a mut VecDeque<QueuedModel>,
}

impl Iterator for QueueDrain<'_> {
    type Item = QueuedModel;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}
