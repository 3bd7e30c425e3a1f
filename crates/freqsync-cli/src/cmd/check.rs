use std::path::Path;

use super::{build_orchestrator, load_config, shutdown_token};
use crate::output::{print_json, print_report, print_verdicts};

pub fn run(path: &Path, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(load_config(path)?)?;
    let rt = tokio::runtime::Runtime::new()?;

    if dry_run {
        let verdicts = rt.block_on(orchestrator.detect_only())?;
        if json {
            print_json(&verdicts)?;
        } else {
            print_verdicts(&verdicts);
            let stale = verdicts.iter().filter(|v| v.needs_update).count();
            println!();
            println!("{stale} of {} file(s) would be updated.", verdicts.len());
        }
        return Ok(());
    }

    let report = rt.block_on(async {
        let cancel = shutdown_token();
        orchestrator.run_cycle(&cancel).await
    })?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    let restart_failed = report.restart.as_ref().is_some_and(|r| !r.succeeded);
    if report.summary.failed_count > 0 || restart_failed {
        anyhow::bail!(
            "{} update(s) failed{}",
            report.summary.failed_count,
            if restart_failed { ", service restart failed" } else { "" }
        );
    }
    Ok(())
}
