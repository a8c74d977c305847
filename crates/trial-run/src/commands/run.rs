use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;
use trial_import::{ConditionImporter, DirectoryResources};
use trial_run::{drive_loop, prepare_loops, RunPlan, RunSummary};

use crate::print_json;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML run plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Directory condition resources are resolved against (defaults to the plan's directory).
    #[arg(long)]
    pub resources: Option<PathBuf>,
    /// JSON-lines output for trial snapshots (defaults to stdout).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let plan = RunPlan::load(&args.plan)?;
    let root = args
        .resources
        .clone()
        .unwrap_or_else(|| plan_dir(&args.plan));
    let importer = ConditionImporter::new(DirectoryResources::new(root));
    let prepared = prepare_loops(&plan, &importer)?;

    let mut writer: Box<dyn Write> = match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut summary = RunSummary {
        name: plan.name.clone(),
        seed: plan.seed,
        loops: Vec::with_capacity(prepared.len()),
    };
    for prepared_loop in prepared {
        let loop_summary = drive_loop(prepared_loop, |cursor| -> Result<(), Box<dyn Error>> {
            serde_json::to_writer(&mut writer, &cursor.snapshot())?;
            writer.write_all(b"\n")?;
            Ok(())
        })?;
        summary.loops.push(loop_summary);
    }
    writer.flush()?;
    drop(writer);

    info!(plan = %summary.name, loops = summary.loops.len(), "run plan complete");
    if args.out.is_some() {
        print_json(&summary)?;
    }
    Ok(())
}

fn plan_dir(plan: &Path) -> PathBuf {
    plan.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
