use std::path::Path;

use super::{build_orchestrator, load_config};
use crate::output::{print_catalog, print_json};

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(load_config(path)?)?;
    let rt = tokio::runtime::Runtime::new()?;
    let files = rt.block_on(orchestrator.catalog())?;

    if json {
        print_json(&files)?;
    } else {
        print_catalog(&files);
    }
    Ok(())
}
