//! SharePoint site grant command execution.

use anyhow::Result;
use colored::Colorize;
use inquire::Confirm;

use azgrant_core::logging::info;
use azgrant_core::lookup::DirectoryLookup;

use crate::connect;

pub(super) async fn grant_site(
    profile: &str,
    principal_name: &str,
    site_url: &str,
    roles: &[String],
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let directory = connect(profile).await?;
    let lookup = DirectoryLookup::new(&directory);
    let principal = lookup.find_principal_by_name(principal_name).await?;

    println!(
        "{}",
        format!(
            "+ site grant: {} on {} for {}",
            roles.join(", "),
            site_url,
            principal.display_name
        )
        .green()
    );

    if dry_run {
        info!("dry run - no changes applied");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new("Apply this grant?")
            .with_default(false)
            .prompt()?;
        if !confirmed {
            println!("Aborted - no changes applied.");
            return Ok(());
        }
    }

    let grant = directory
        .grant_site_permission(&principal, site_url, roles)
        .await?;
    info!(
        "granted roles [{}] (permission id {})",
        grant.roles.join(", "),
        grant.id
    );
    Ok(())
}
