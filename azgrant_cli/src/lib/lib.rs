//! Full CLI library for azgrant
//!

#![deny(missing_docs)]

mod apply;
mod cmd;
mod report;
mod site;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use azgrant_core::{config::fetch_credentials, logging, project, reconcile::Mode};
use azgrant_msgraph::{GraphCredentials, GraphRestConfig, MsGraphDirectory};

use cmd::{AzGrantArgs, AzGrantCommand};

/// Main CLI entrypoint.
pub async fn cli() -> Result<()> {
    let args = AzGrantArgs::parse();
    logging::setup(args.log_level);

    match args.command {
        AzGrantCommand::Grant {
            principal,
            permissions,
            resource,
            dry_run,
            yes,
        } => {
            apply::apply(
                &args.profile,
                &principal,
                permissions,
                &resource,
                Mode::Grant,
                dry_run,
                yes,
            )
            .await
        }

        AzGrantCommand::Revoke {
            principal,
            permissions,
            resource,
            dry_run,
            yes,
        } => {
            apply::apply(
                &args.profile,
                &principal,
                permissions,
                &resource,
                Mode::Revoke,
                dry_run,
                yes,
            )
            .await
        }

        AzGrantCommand::Report { output } => report::report(&args.profile, output).await,

        AzGrantCommand::GrantSite {
            principal,
            site,
            roles,
            dry_run,
            yes,
        } => site::grant_site(&args.profile, &principal, &site, &roles, dry_run, yes).await,
    }
}

/// Sign in to Microsoft Graph with the named credentials profile.
pub(crate) async fn connect(profile: &str) -> Result<MsGraphDirectory> {
    let profiles = fetch_credentials(project::credentials_cfg_path()).context(
        "reading credentials - create ~/.azgrant/credentials.yaml with a profile for your \
        app registration",
    )?;
    let profile_map = profiles
        .get(profile)
        .ok_or_else(|| anyhow!("no credentials profile named '{profile}'"))?;
    let credentials = GraphCredentials::from_map(profile_map)?;
    MsGraphDirectory::new(
        credentials,
        GraphRestConfig {
            retry: true,
            ..Default::default()
        },
    )
    .await
    .context("signing in to Microsoft Graph")
}
