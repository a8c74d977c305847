//! Stateful single-pass traversal of a [`SequenceMatrix`].

use std::fmt;
use std::iter::FusedIterator;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use trial_core::errors::{ErrorInfo, TrialError};
use trial_core::{Condition, ConditionList, Method, RngHandle};

use crate::sequence::{SequenceBuilder, SequenceMatrix};
use crate::sink::DataSink;

/// Default handler name.
pub const DEFAULT_NAME: &str = "trials";

/// Outcome of [`TrialCursor::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The next trial in traversal order.
    Trial(Condition),
    /// Every repetition has been emitted.
    Done,
}

impl Step {
    /// Returns `true` for [`Step::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }

    /// Converts into the emitted condition, if any.
    pub fn into_trial(self) -> Option<Condition> {
        match self {
            Step::Trial(condition) => Some(condition),
            Step::Done => None,
        }
    }
}

/// Lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    /// `advance` has never been called.
    NotStarted,
    /// At least one trial emitted, repetitions remain.
    Active,
    /// Terminal.
    Finished,
}

/// Serializable view of a cursor position and the trial it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorSnapshot {
    pub name: String,
    pub state: CursorState,
    pub n_stim: usize,
    pub n_reps: usize,
    pub n_total: usize,
    pub n_remaining: i64,
    pub this_rep_n: i64,
    pub this_trial_n: i64,
    pub this_n: i64,
    pub this_index: usize,
    pub order: Option<usize>,
    pub ran: bool,
    pub trial: Option<Condition>,
}

/// Cursor over the trials of one loop.
///
/// The only mutating operation is [`TrialCursor::advance`]; a cursor is
/// never rewound, so one instance covers exactly one pass over its
/// [`SequenceMatrix`]. Counters keep the `-1` "before first trial" origin:
/// while the cursor is not finished, `this_n + n_remaining == n_total - 1`.
pub struct TrialCursor {
    name: String,
    conditions: ConditionList,
    matrix: SequenceMatrix,
    n_remaining: i64,
    this_rep_n: i64,
    this_trial_n: i64,
    this_n: i64,
    this_index: usize,
    current: Option<usize>,
    order: Option<usize>,
    ran: bool,
    finished: bool,
    sink: Option<Box<dyn DataSink>>,
}

impl TrialCursor {
    /// Wraps a prebuilt matrix; its width must match the condition count.
    pub fn new(conditions: ConditionList, matrix: SequenceMatrix) -> Result<Self, TrialError> {
        if matrix.n_stim() != conditions.len() {
            return Err(TrialError::Configuration(
                ErrorInfo::new(
                    "matrix-shape-mismatch",
                    "sequence width does not match the number of conditions",
                )
                .with_context("n_stim", matrix.n_stim().to_string())
                .with_context("conditions", conditions.len().to_string()),
            ));
        }
        Ok(Self {
            name: DEFAULT_NAME.to_string(),
            n_remaining: matrix.n_total() as i64,
            conditions,
            matrix,
            this_rep_n: 0,
            this_trial_n: -1,
            this_n: -1,
            this_index: 0,
            current: None,
            order: None,
            ran: false,
            finished: false,
            sink: None,
        })
    }

    /// Builds the matrix for `conditions` and wraps it.
    pub fn build(
        conditions: ConditionList,
        n_reps: usize,
        method: Method,
        rng: &mut RngHandle,
    ) -> Result<Self, TrialError> {
        let matrix = SequenceBuilder::new(conditions.len(), n_reps, method).build(rng)?;
        Self::new(conditions, matrix)
    }

    /// Renames the handler.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attaches a data sink, replacing any previous one.
    pub fn with_sink(mut self, sink: Box<dyn DataSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attaches a data sink in place.
    pub fn attach_sink(&mut self, sink: Box<dyn DataSink>) {
        self.sink = Some(sink);
    }

    /// Moves to the next trial of the traversal order.
    pub fn advance(&mut self) -> Step {
        if self.finished {
            return Step::Done;
        }
        self.this_trial_n += 1;
        self.this_n += 1;
        self.n_remaining -= 1;

        if self.this_trial_n == self.matrix.n_stim() as i64 {
            self.this_trial_n = 0;
            self.this_rep_n += 1;
        }

        if self.this_rep_n >= self.matrix.n_reps() as i64 {
            self.current = None;
            self.finished = true;
            debug!(name = %self.name, trials = self.this_n, "trial loop finished");
            return Step::Done;
        }

        let rep = self.this_rep_n as usize;
        let trial = self.this_trial_n as usize;
        self.this_index = self.matrix.rows()[rep][trial];
        self.current = Some(self.this_index);
        self.ran = true;
        self.order = Some(self.this_n as usize);
        Step::Trial(self.conditions.as_slice()[self.this_index].clone())
    }

    /// Condition at `this_index`; before the first advance this is the first condition.
    pub fn get_current_trial(&self) -> &Condition {
        &self.conditions.as_slice()[self.this_index]
    }

    /// Trial emitted by the last advance, `None` before the first or after finishing.
    pub fn trial(&self) -> Option<&Condition> {
        self.current.and_then(|index| self.conditions.get(index))
    }

    /// Looks `n` positions away from `this_index` in the condition list.
    ///
    /// This is a flat lookup in list order, not in traversal order.
    /// Returns `None` when `this_index + n` falls outside the list or
    /// `n` exceeds the remaining trial count.
    pub fn get_future_trial(&self, n: i64) -> Option<&Condition> {
        if n > self.n_remaining {
            return None;
        }
        let target = (self.this_index as i64).checked_add(n)?;
        let target = usize::try_from(target).ok()?;
        self.conditions.get(target)
    }

    /// Looks `|n|` positions back; `get_earlier_trial(-1)` and `(1)` agree.
    pub fn get_earlier_trial(&self, n: i64) -> Option<&Condition> {
        let back = match n.checked_abs() {
            Some(abs) => -abs,
            None => i64::MIN,
        };
        self.get_future_trial(back)
    }

    /// Field names of the first condition.
    pub fn get_attributes(&self) -> Vec<String> {
        self.conditions.attributes()
    }

    /// Raw index of the condition considered current.
    pub fn get_trial_index(&self) -> usize {
        self.this_index
    }

    /// Overrides which condition is current without touching the counters.
    pub fn set_trial_index(&mut self, index: usize) -> Result<(), TrialError> {
        if index >= self.conditions.len() {
            return Err(TrialError::Configuration(
                ErrorInfo::new("trial-index-range", "trial index outside the condition list")
                    .with_context("index", index.to_string())
                    .with_context("n_stim", self.conditions.len().to_string()),
            ));
        }
        self.this_index = index;
        Ok(())
    }

    /// Forwards to the attached sink; no-op without one.
    pub fn add_data(&mut self, key: &str, value: Value) {
        if let Some(sink) = self.sink.as_mut() {
            sink.add_data(key, value);
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CursorState {
        if self.finished {
            CursorState::Finished
        } else if self.this_n < 0 {
            CursorState::NotStarted
        } else {
            CursorState::Active
        }
    }

    /// Returns `true` once the cursor has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of conditions.
    pub fn n_stim(&self) -> usize {
        self.matrix.n_stim()
    }

    /// Number of repetitions.
    pub fn n_reps(&self) -> usize {
        self.matrix.n_reps()
    }

    /// Total number of trials.
    pub fn n_total(&self) -> usize {
        self.matrix.n_total()
    }

    /// Trials left to emit after the current one.
    pub fn n_remaining(&self) -> i64 {
        self.n_remaining
    }

    /// Zero-based repetition counter.
    pub fn this_rep_n(&self) -> i64 {
        self.this_rep_n
    }

    /// Zero-based trial counter within the repetition, `-1` before the first advance.
    pub fn this_trial_n(&self) -> i64 {
        self.this_trial_n
    }

    /// Zero-based count of emitted trials, `-1` before the first advance.
    pub fn this_n(&self) -> i64 {
        self.this_n
    }

    /// Position of the last emitted trial in the overall order.
    pub fn order(&self) -> Option<usize> {
        self.order
    }

    /// Returns `true` once at least one trial has been emitted.
    pub fn ran(&self) -> bool {
        self.ran
    }

    /// Conditions this cursor draws from.
    pub fn conditions(&self) -> &ConditionList {
        &self.conditions
    }

    /// The traversal order.
    pub fn matrix(&self) -> &SequenceMatrix {
        &self.matrix
    }

    /// Captures the current position.
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            name: self.name.clone(),
            state: self.state(),
            n_stim: self.n_stim(),
            n_reps: self.n_reps(),
            n_total: self.n_total(),
            n_remaining: self.n_remaining,
            this_rep_n: self.this_rep_n,
            this_trial_n: self.this_trial_n,
            this_n: self.this_n,
            this_index: self.this_index,
            order: self.order,
            ran: self.ran,
            trial: self.trial().cloned(),
        }
    }
}

impl fmt::Debug for TrialCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrialCursor")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("this_rep_n", &self.this_rep_n)
            .field("this_trial_n", &self.this_trial_n)
            .field("this_n", &self.this_n)
            .field("this_index", &self.this_index)
            .field("n_remaining", &self.n_remaining)
            .finish_non_exhaustive()
    }
}

impl Iterator for TrialCursor {
    type Item = Condition;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().into_trial()
    }
}

impl FusedIterator for TrialCursor {}
