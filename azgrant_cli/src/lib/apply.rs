//! Grant/revoke command execution: plan, confirm, execute, report.

use anyhow::{bail, Result};
use indexmap::IndexSet;
use inquire::Confirm;

use azgrant_core::config::AzGrantConfig;
use azgrant_core::logging::info;
use azgrant_core::lookup::DirectoryLookup;
use azgrant_core::reconcile::{AssignmentReconciler, Mode};
use azgrant_core::wellknown;

use crate::connect;

pub(super) async fn apply(
    profile: &str,
    principal_name: &str,
    permissions: Option<Vec<String>>,
    resource_arg: &str,
    mode: Mode,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let config = AzGrantConfig::load_optional()?;
    // Resolve the resource argument before signing in so a typo'd alias
    // fails fast.
    let app_id = wellknown::resolve_resource_arg(resource_arg, &config.resource_aliases()?)?;

    // IndexSet keeps the operator's order while dropping duplicates.
    let desired: IndexSet<String> = match permissions {
        Some(list) => list.into_iter().collect(),
        None => wellknown::DEFAULT_PERMISSIONS
            .iter()
            .map(|p| p.to_string())
            .collect(),
    };

    let directory = connect(profile).await?;
    let lookup = DirectoryLookup::new(&directory);
    let principal = lookup.find_principal_by_name(principal_name).await?;
    let resource = lookup.find_resource_by_app_id(&app_id).await?;

    let reconciler = AssignmentReconciler::new(&directory);
    let plan = reconciler.plan(&principal, &resource, &desired, mode).await?;
    println!("{plan}");

    if dry_run {
        info!("dry run - no changes applied");
        return Ok(());
    }

    if plan.has_changes() && !yes {
        let confirmed = Confirm::new("Apply these changes?")
            .with_default(false)
            .prompt()?;
        if !confirmed {
            println!("Aborted - no changes applied.");
            return Ok(());
        }
    }

    let outcomes = reconciler.execute(plan).await;
    for outcome in &outcomes {
        println!("{outcome}");
    }

    let failures = outcomes.iter().filter(|o| o.is_failure()).count();
    if failures > 0 {
        bail!(
            "{failures} of {} permissions were skipped or failed",
            outcomes.len()
        );
    }
    Ok(())
}
