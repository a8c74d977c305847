use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

/// Downstream consumer of per-trial data forwarded by a cursor.
pub trait DataSink {
    /// Records `value` under `key` for the current trial.
    fn add_data(&mut self, key: &str, value: Value);
}

impl<F> DataSink for F
where
    F: FnMut(&str, Value),
{
    fn add_data(&mut self, key: &str, value: Value) {
        self(key, value)
    }
}

/// In-memory sink; clones share the same buffer so a caller can keep a
/// handle while the cursor owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Rc<RefCell<Vec<(String, Value)>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out every recorded entry in arrival order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.entries.borrow().clone()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DataSink for MemorySink {
    fn add_data(&mut self, key: &str, value: Value) {
        self.entries.borrow_mut().push((key.to_string(), value));
    }
}
