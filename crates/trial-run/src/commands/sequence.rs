use std::error::Error;

use clap::Args;
use serde_json::json;
use trial_core::Method;
use trial_seq::SequenceBuilder;

use crate::print_json;

#[derive(Args, Debug)]
pub struct SequenceArgs {
    /// Number of conditions.
    #[arg(long)]
    pub n_stim: usize,
    /// Number of repetitions.
    #[arg(long, default_value_t = 1)]
    pub n_reps: usize,
    /// Ordering method: sequential, random or full_random.
    #[arg(long, default_value = "random")]
    pub method: String,
    /// Seed for a reproducible order; omitted means entropy.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &SequenceArgs) -> Result<(), Box<dyn Error>> {
    let method: Method = args.method.parse()?;
    let matrix = SequenceBuilder::new(args.n_stim, args.n_reps, method).build_seeded(args.seed)?;
    print_json(&json!({
        "method": method,
        "n_stim": matrix.n_stim(),
        "n_reps": matrix.n_reps(),
        "seed": args.seed,
        "fingerprint": matrix.fingerprint()?,
        "rows": matrix.rows(),
    }))
}
