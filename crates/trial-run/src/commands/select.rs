use std::error::Error;

use clap::Args;
use serde_json::json;
use trial_import::{parse_selection, Selection};

use crate::print_json;

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Selection expression, e.g. `0:10`, `1:2:9` or `1,5,-1`.
    #[arg(long, allow_hyphen_values = true)]
    pub selection: String,
    /// Number of data rows the selection applies to.
    #[arg(long)]
    pub len: usize,
}

pub fn run(args: &SelectArgs) -> Result<(), Box<dyn Error>> {
    let selection = Selection::Expr(args.selection.clone());
    let indices = parse_selection(&selection, args.len)?;
    print_json(&json!({
        "selection": args.selection,
        "len": args.len,
        "indices": indices,
    }))
}
