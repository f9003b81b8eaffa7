//! Commands for the azgrant CLI
//!

use std::path::PathBuf;

use clap::{self, Parser, Subcommand};

use azgrant_core::logging::LevelFilter;

/// azgrant: idempotent application-permission management for a Microsoft Entra tenant
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct AzGrantArgs {
    #[clap(subcommand)]
    pub(crate) command: AzGrantCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
    /// Credentials profile from ~/.azgrant/credentials.yaml
    #[clap(global = true, short, long, default_value = "default")]
    pub(crate) profile: String,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum AzGrantCommand {
    /// Grant application permissions to a principal
    Grant {
        /// Display name of the principal being granted to
        principal: String,
        /// Permission names to grant (defaults to Sites.Selected)
        #[clap(short = 'P', long, use_value_delimiter = true, value_delimiter = ',')]
        permissions: Option<Vec<String>>,
        /// The resource API exposing the permissions: an alias (graph,
        /// sharepoint, exchange, or one from azgrant.yaml) or an
        /// application id GUID
        #[clap(short, long, default_value = "graph")]
        resource: String,
        /// Show the plan without applying it
        #[clap(long, value_parser, default_value = "false")]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[clap(short, long, value_parser, default_value = "false")]
        yes: bool,
    },
    /// Revoke application permissions from a principal
    Revoke {
        /// Display name of the principal being revoked from
        principal: String,
        /// Permission names to revoke (defaults to Sites.Selected)
        #[clap(short = 'P', long, use_value_delimiter = true, value_delimiter = ',')]
        permissions: Option<Vec<String>>,
        /// The resource API exposing the permissions: an alias or an
        /// application id GUID
        #[clap(short, long, default_value = "graph")]
        resource: String,
        /// Show the plan without applying it
        #[clap(long, value_parser, default_value = "false")]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[clap(short, long, value_parser, default_value = "false")]
        yes: bool,
    },
    /// Inventory every service principal in the tenant to a CSV file
    Report {
        /// Output file (defaults to service_principals_<timestamp>.csv)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Grant roles on a single SharePoint site to a principal
    GrantSite {
        /// Display name of the principal being granted to
        principal: String,
        /// Site URL, e.g. https://contoso.sharepoint.com/sites/ops
        #[clap(short, long)]
        site: String,
        /// Site roles to grant
        #[clap(short = 'R', long, use_value_delimiter = true, value_delimiter = ',', default_values_t = vec!["read".to_owned()])]
        roles: Vec<String>,
        /// Show the grant without applying it
        #[clap(long, value_parser, default_value = "false")]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[clap(short, long, value_parser, default_value = "false")]
        yes: bool,
    },
}
