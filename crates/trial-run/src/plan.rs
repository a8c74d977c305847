use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trial_core::errors::{ErrorInfo, TrialError};
use trial_core::{derive_substream_seed, Condition, Method};
use trial_import::Selection;

/// YAML run plan: an experiment made of one or more trial loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    /// Experiment name used in logs and summaries.
    #[serde(default = "default_plan_name")]
    pub name: String,
    /// Master seed; loops without their own seed derive one from it.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Loops executed in order.
    #[serde(default)]
    pub loops: Vec<LoopConfig>,
}

fn default_plan_name() -> String {
    "experiment".to_string()
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            name: default_plan_name(),
            seed: None,
            loops: Vec::new(),
        }
    }
}

/// One trial loop of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Handler name.
    #[serde(default = "default_loop_name")]
    pub name: String,
    /// Number of repetitions of the condition list.
    #[serde(default = "default_n_reps")]
    pub n_reps: usize,
    /// Ordering method.
    #[serde(default)]
    pub method: Method,
    /// Loop seed overriding the derived one.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where the conditions come from; absent means one empty condition.
    #[serde(default)]
    pub conditions: Option<ConditionSource>,
}

fn default_loop_name() -> String {
    trial_seq::DEFAULT_NAME.to_string()
}

fn default_n_reps() -> usize {
    1
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: default_loop_name(),
            n_reps: default_n_reps(),
            method: Method::default(),
            seed: None,
            conditions: None,
        }
    }
}

impl LoopConfig {
    /// Seed used for this loop: its own, else substream `index` of the master seed.
    pub fn resolved_seed(&self, master_seed: Option<u64>, index: usize) -> Option<u64> {
        self.seed
            .or_else(|| master_seed.map(|seed| derive_substream_seed(seed, index as u64)))
    }
}

/// Inline conditions or a condition table resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionSource {
    /// Conditions written directly in the plan.
    Inline(Vec<Condition>),
    /// Conditions imported from a table.
    Resource {
        /// Resource name, resolved by the resource store.
        resource: String,
        /// Optional row selection.
        #[serde(default)]
        selection: Option<Selection>,
    },
}

impl RunPlan {
    /// Parses and validates a YAML plan.
    pub fn from_yaml_str(raw: &str) -> Result<Self, TrialError> {
        let plan: RunPlan = serde_yaml::from_str(raw).map_err(|err| {
            TrialError::Configuration(
                ErrorInfo::new("plan-parse", "failed to parse run plan").with_cause(err),
            )
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reads, parses and validates the plan at `path`.
    pub fn load(path: &Path) -> Result<Self, TrialError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            TrialError::Configuration(
                ErrorInfo::new("plan-read", "failed to read run plan")
                    .with_context("path", path.display().to_string())
                    .with_cause(err),
            )
        })?;
        Self::from_yaml_str(&raw).map_err(|err| match err {
            TrialError::Configuration(info) => TrialError::Configuration(
                info.with_context("path", path.display().to_string()),
            ),
            other => other,
        })
    }

    /// Checks that the plan has loops with distinct, non-empty names.
    pub fn validate(&self) -> Result<(), TrialError> {
        if self.loops.is_empty() {
            return Err(TrialError::configuration(
                "plan-empty",
                "run plan declares no loops",
            ));
        }
        let mut seen = BTreeSet::new();
        for config in &self.loops {
            if config.name.trim().is_empty() {
                return Err(TrialError::configuration(
                    "loop-name-empty",
                    "loop name cannot be empty",
                ));
            }
            if !seen.insert(config.name.as_str()) {
                return Err(TrialError::Configuration(
                    ErrorInfo::new("loop-name-duplicate", "loop names must be unique")
                        .with_context("loop", config.name.clone()),
                ));
            }
        }
        Ok(())
    }
}
