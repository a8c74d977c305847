use serde::Serialize;
use tracing::info;
use trial_core::errors::TrialError;
use trial_core::{ConditionList, Method, RngHandle};
use trial_import::{ConditionImporter, ResourceStore};
use trial_seq::{Step, TrialCursor};

use crate::plan::{ConditionSource, LoopConfig, RunPlan};

/// A loop ready to be driven, with the provenance of its order.
#[derive(Debug)]
pub struct PreparedLoop {
    pub cursor: TrialCursor,
    pub seed: Option<u64>,
    pub fingerprint: String,
}

/// Outcome of driving one loop to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopSummary {
    pub name: String,
    pub method: Method,
    pub n_stim: usize,
    pub n_reps: usize,
    pub n_total: usize,
    pub trials: usize,
    pub seed: Option<u64>,
    pub fingerprint: String,
}

/// Outcome of a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub seed: Option<u64>,
    pub loops: Vec<LoopSummary>,
}

/// Resolves conditions and builds a cursor for every loop of `plan`.
pub fn prepare_loops<S: ResourceStore>(
    plan: &RunPlan,
    importer: &ConditionImporter<S>,
) -> Result<Vec<PreparedLoop>, TrialError> {
    plan.loops
        .iter()
        .enumerate()
        .map(|(index, config)| prepare_loop(config, plan.seed, index, importer))
        .collect()
}

fn prepare_loop<S: ResourceStore>(
    config: &LoopConfig,
    master_seed: Option<u64>,
    index: usize,
    importer: &ConditionImporter<S>,
) -> Result<PreparedLoop, TrialError> {
    let conditions = match &config.conditions {
        None => ConditionList::sentinel(),
        Some(ConditionSource::Inline(conditions)) => ConditionList::new(conditions.clone()),
        Some(ConditionSource::Resource {
            resource,
            selection,
        }) => ConditionList::new(importer.import_conditions(resource, selection.as_ref())?),
    };
    let seed = config.resolved_seed(master_seed, index);
    let mut rng = RngHandle::from_optional_seed(seed);
    let cursor = TrialCursor::build(conditions, config.n_reps, config.method, &mut rng)?
        .with_name(config.name.clone());
    let fingerprint = cursor.matrix().fingerprint()?;
    info!(
        name = %config.name,
        method = %config.method,
        n_stim = cursor.n_stim(),
        n_reps = cursor.n_reps(),
        seed = ?seed,
        "prepared trial loop"
    );
    Ok(PreparedLoop {
        cursor,
        seed,
        fingerprint,
    })
}

/// Pulls trials one at a time until the cursor reports completion.
///
/// `on_trial` sees the cursor positioned on each emitted trial; an error
/// stops the loop early and is returned unchanged.
pub fn drive_loop<E>(
    prepared: PreparedLoop,
    mut on_trial: impl FnMut(&mut TrialCursor) -> Result<(), E>,
) -> Result<LoopSummary, E> {
    let PreparedLoop {
        mut cursor,
        seed,
        fingerprint,
    } = prepared;
    let mut trials = 0;
    while let Step::Trial(_) = cursor.advance() {
        trials += 1;
        on_trial(&mut cursor)?;
    }
    info!(name = %cursor.name(), trials, "trial loop complete");
    Ok(LoopSummary {
        name: cursor.name().to_string(),
        method: cursor.matrix().method(),
        n_stim: cursor.n_stim(),
        n_reps: cursor.n_reps(),
        n_total: cursor.n_total(),
        trials,
        seed,
        fingerprint,
    })
}
