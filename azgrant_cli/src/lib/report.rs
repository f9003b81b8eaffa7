//! Tenant report command execution.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use time::macros::format_description;

use azgrant_core::logging::info;
use azgrant_core::report::{render_csv, ReportCompiler};
use azgrant_core::DirectoryAudit;

use crate::connect;

pub(super) async fn report(profile: &str, output: Option<PathBuf>) -> Result<()> {
    let directory = connect(profile).await?;
    let compiler = ReportCompiler::new(&directory);

    let principals = directory
        .list_all_principals()
        .await
        .context("enumerating service principals")?;
    info!("found {} service principals", principals.len());

    let bar = ProgressBar::new(principals.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len}")?);

    // One row at a time; the audit fan-out is intentionally sequential.
    let mut rows = Vec::with_capacity(principals.len());
    for principal in &principals {
        rows.push(compiler.compile_row(principal).await);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let path = match output {
        Some(path) => path,
        None => default_report_path()?,
    };
    fs::write(&path, render_csv(&rows)).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn default_report_path() -> Result<PathBuf> {
    let stamp = time::OffsetDateTime::now_utc().format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;
    Ok(PathBuf::from(format!("service_principals_{stamp}.csv")))
}
