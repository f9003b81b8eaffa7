//! Project configuration and credential profiles.
//!

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::directory::types::ApplicationId;
use crate::logging::debug;
use crate::project;

/// Struct representing the azgrant.yaml file.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AzGrantConfig {
    /// Default tenant id, when the credentials profile doesn't name one.
    #[serde(default)]
    pub tenant: Option<String>,
    /// Extra resource aliases (alias -> application id GUID) on top of
    /// the built-in catalog.
    #[serde(default)]
    pub resources: HashMap<String, String>,
}

impl AzGrantConfig {
    /// Use the default filepath to ingest the config.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<AzGrantConfig> {
        let config_raw = fs::read_to_string(&path).context("Reading file")?;
        let mut config =
            yaml::from_str::<AzGrantConfig>(&config_raw).context("Deserializing config")?;
        config.pop().ok_or_else(|| anyhow!["failed"])
    }

    /// Read `azgrant.yaml` from the working directory, or fall back to an
    /// empty config when there isn't one.
    pub fn load_optional() -> Result<AzGrantConfig> {
        let path = project::azgrant_cfg_path_local();
        if path.exists() {
            Self::read_from_file(path)
        } else {
            debug!("no azgrant.yaml found, using built-in defaults");
            Ok(Default::default())
        }
    }

    /// Parse the configured aliases into application IDs, rejecting bad
    /// GUIDs up front.
    pub fn resource_aliases(&self) -> Result<HashMap<String, ApplicationId>> {
        self.resources
            .iter()
            .map(|(alias, guid)| {
                let app_id = ApplicationId::from_str(guid)
                    .with_context(|| format!("resource alias '{alias}' is not a GUID: {guid}"))?;
                Ok((alias.to_lowercase(), app_id))
            })
            .collect()
    }
}

/// Alias for HashMap to hold credentials information.
pub type CredentialsMap = HashMap<String, String>;

/// Fetch the credential profiles from the azgrant credentials file.
pub fn fetch_credentials(path: std::path::PathBuf) -> Result<HashMap<String, CredentialsMap>> {
    debug!("Trying to read credentials from {:?}", path);
    let credentials_raw = fs::read_to_string(path)?;
    let mut config = yaml::from_str::<HashMap<String, CredentialsMap>>(&credentials_raw)?;

    config
        .pop()
        .ok_or_else(|| anyhow!["failed to generate credentials"])
}
