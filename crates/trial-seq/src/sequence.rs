use rand::seq::SliceRandom;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use trial_core::errors::{ErrorInfo, TrialError};
use trial_core::{Method, RngHandle};

/// Repetition-structured traversal order: one row of condition indices per repetition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceMatrix {
    method: Method,
    n_stim: usize,
    n_reps: usize,
    rows: Vec<Vec<usize>>,
}

impl SequenceMatrix {
    /// Wraps externally produced rows after checking their shape and balance.
    ///
    /// Every row must hold `n_stim` indices below `n_stim`, and across all rows
    /// each index must appear exactly once per repetition.
    pub fn from_rows(
        method: Method,
        n_stim: usize,
        rows: Vec<Vec<usize>>,
    ) -> Result<Self, TrialError> {
        ensure_stimuli(n_stim)?;
        let n_reps = rows.len();
        let mut counts = vec![0usize; n_stim];
        for (rep, row) in rows.iter().enumerate() {
            if row.len() != n_stim {
                return Err(TrialError::Configuration(
                    ErrorInfo::new("matrix-row-length", "sequence row has the wrong length")
                        .with_context("repetition", rep.to_string())
                        .with_context("expected", n_stim.to_string())
                        .with_context("found", row.len().to_string()),
                ));
            }
            for &index in row {
                match counts.get_mut(index) {
                    Some(count) => *count += 1,
                    None => {
                        return Err(TrialError::Configuration(
                            ErrorInfo::new("matrix-index-range", "sequence index out of range")
                                .with_context("repetition", rep.to_string())
                                .with_context("index", index.to_string()),
                        ))
                    }
                }
            }
        }
        if let Some(index) = counts.iter().position(|&count| count != n_reps) {
            return Err(TrialError::Configuration(
                ErrorInfo::new("matrix-unbalanced", "condition index is not repeated evenly")
                    .with_context("index", index.to_string())
                    .with_context("count", counts[index].to_string())
                    .with_context("expected", n_reps.to_string()),
            ));
        }
        Ok(Self {
            method,
            n_stim,
            n_reps,
            rows,
        })
    }

    /// Method the matrix was built with.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Number of conditions per repetition.
    pub fn n_stim(&self) -> usize {
        self.n_stim
    }

    /// Number of repetitions (rows).
    pub fn n_reps(&self) -> usize {
        self.n_reps
    }

    /// Total number of trials, `n_reps * n_stim`.
    pub fn n_total(&self) -> usize {
        self.n_reps * self.n_stim
    }

    /// Rows in repetition order.
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Condition index scheduled at `(rep, trial)`.
    pub fn get(&self, rep: usize, trial: usize) -> Option<usize> {
        self.rows.get(rep).and_then(|row| row.get(trial)).copied()
    }

    /// Row-major traversal order.
    pub fn flatten(&self) -> Vec<usize> {
        self.rows.iter().flatten().copied().collect()
    }

    /// Stable SHA-256 digest of the method, shape and every index.
    pub fn fingerprint(&self) -> Result<String, TrialError> {
        let bytes = serde_json::to_vec(self).map_err(|err| {
            TrialError::Configuration(
                ErrorInfo::new("fingerprint-encode", "failed to encode sequence matrix")
                    .with_cause(err),
            )
        })?;
        Ok(format!("{:x}", Sha256::digest(bytes)))
    }
}

/// Builds [`SequenceMatrix`] values for a fixed loop shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceBuilder {
    /// Number of conditions.
    pub n_stim: usize,
    /// Number of repetitions.
    pub n_reps: usize,
    /// Ordering method.
    pub method: Method,
}

impl SequenceBuilder {
    /// Creates a builder for `n_stim` conditions repeated `n_reps` times.
    pub fn new(n_stim: usize, n_reps: usize, method: Method) -> Self {
        Self {
            n_stim,
            n_reps,
            method,
        }
    }

    /// Builds with a fresh generator seeded from `seed`, or from entropy when absent.
    pub fn build_seeded(&self, seed: Option<u64>) -> Result<SequenceMatrix, TrialError> {
        let mut rng = RngHandle::from_optional_seed(seed);
        self.build(&mut rng)
    }

    /// Builds the matrix drawing every shuffle from `rng`.
    pub fn build(&self, rng: &mut RngHandle) -> Result<SequenceMatrix, TrialError> {
        ensure_stimuli(self.n_stim)?;
        let indices: Vec<usize> = (0..self.n_stim).collect();
        let rows = match self.method {
            Method::Sequential => vec![indices; self.n_reps],
            Method::Random => (0..self.n_reps)
                .map(|_| {
                    let mut row = indices.clone();
                    row.shuffle(rng);
                    row
                })
                .collect(),
            Method::FullRandom => {
                let mut flat: Vec<usize> = indices
                    .iter()
                    .copied()
                    .cycle()
                    .take(self.n_stim * self.n_reps)
                    .collect();
                flat.shuffle(rng);
                flat.chunks(self.n_stim).map(<[usize]>::to_vec).collect()
            }
        };
        debug!(
            method = %self.method,
            n_stim = self.n_stim,
            n_reps = self.n_reps,
            seed = ?rng.seed(),
            "built trial sequence"
        );
        Ok(SequenceMatrix {
            method: self.method,
            n_stim: self.n_stim,
            n_reps: self.n_reps,
            rows,
        })
    }
}

fn ensure_stimuli(n_stim: usize) -> Result<(), TrialError> {
    if n_stim == 0 {
        return Err(TrialError::Configuration(
            ErrorInfo::new("empty-sequence", "a sequence needs at least one condition")
                .with_hint("normalize the condition list before building"),
        ));
    }
    Ok(())
}
