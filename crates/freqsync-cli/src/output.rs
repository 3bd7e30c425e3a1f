use freqsync_core::hash::short_hash;
use freqsync_core::types::{CycleReport, DetectionStrategy, TrackedFile, Verdict};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()));
    println!("{}", line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        println!("{}", line(row.clone()));
    }
}

/// Versions are shown verbatim, digests shortened.
pub fn signature(strategy: DetectionStrategy, value: Option<&str>) -> String {
    match (strategy, value) {
        (_, None) => "-".to_string(),
        (DetectionStrategy::Version, Some(v)) => v.to_string(),
        (DetectionStrategy::Hash, Some(h)) => short_hash(h).to_string(),
    }
}

pub fn print_catalog(files: &[TrackedFile]) {
    if files.is_empty() {
        println!("No tracked files.");
        return;
    }
    let rows: Vec<Vec<String>> = files
        .iter()
        .map(|f| {
            vec![
                f.name.clone(),
                f.kind.to_string(),
                format!("{:?}", f.strategy()).to_lowercase(),
                f.local_path.display().to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "KIND", "CHECK", "LOCAL PATH"], &rows);
}

pub fn print_verdicts(verdicts: &[Verdict]) {
    if verdicts.is_empty() {
        println!("No tracked files.");
        return;
    }
    let rows: Vec<Vec<String>> = verdicts
        .iter()
        .map(|v| {
            vec![
                v.file.name.clone(),
                signature(v.strategy, v.local_signature.as_deref()),
                signature(v.strategy, v.remote_signature.as_deref()),
                if v.needs_update { "stale" } else { "ok" }.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "LOCAL", "REMOTE", "STATUS"], &rows);
}

pub fn print_report(report: &CycleReport) {
    print_verdicts(&report.verdicts);

    if !report.results.is_empty() {
        println!();
        for r in &report.results {
            match &r.error {
                None => println!(
                    "  updated: {} ({} bytes)",
                    r.file.name,
                    r.bytes_written.unwrap_or(0)
                ),
                Some(e) => println!("  failed:  {}: {e}", r.file.name),
            }
        }
    }

    if let Some(restart) = &report.restart {
        println!();
        match (&restart.failed_step, &restart.error) {
            (Some(step), Some(e)) => println!("Restart failed at {step}: {e}"),
            _ => println!("Service restarted in {} ms.", restart.duration_ms),
        }
    }

    let s = &report.summary;
    println!();
    println!(
        "{} files, {} stale, {} updated, {} failed.",
        s.total_files, s.stale_count, s.updated_count, s.failed_count
    );
    if report.cancelled {
        println!("Cycle interrupted by shutdown; remaining updates were skipped.");
    }
}
