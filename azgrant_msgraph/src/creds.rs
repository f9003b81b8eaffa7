use std::collections::HashSet;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use azgrant_core::config::CredentialsMap;

use crate::consts;

/// Credentials for authenticating to Microsoft Graph with the
/// client-credentials grant.
///
/// The user sets these up by creating an app registration with a client
/// secret and pasting the values into a profile in their
/// ~/.azgrant/credentials.yaml.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct GraphCredentials {
    pub(crate) tenant_id: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    /// Login authority override, used to point tests at a mock server.
    pub(crate) authority: Option<String>,
    /// Graph endpoint override, used to point tests at a mock server.
    pub(crate) endpoint: Option<String>,
}

impl GraphCredentials {
    /// Build credentials from a named profile's key/value map.
    pub fn from_map(credentials: &CredentialsMap) -> Result<Self> {
        let mut creds = GraphCredentials::default();
        let mut required_fields = HashSet::from([
            "tenant_id".to_owned(),
            "client_id".to_owned(),
            "client_secret".to_owned(),
        ]);

        for (k, v) in credentials.iter() {
            match k.as_ref() {
                "tenant_id" => creds.tenant_id = v.to_string(),
                "client_id" => creds.client_id = v.to_string(),
                "client_secret" => creds.client_secret = v.to_string(),
                "authority" => creds.authority = Some(v.to_string()),
                "endpoint" => creds.endpoint = Some(v.to_string()),
                _ => (),
            }

            required_fields.remove(k);
        }

        if !required_fields.is_empty() {
            return Err(anyhow![
                "Graph credentials missing required fields: {:#?}",
                required_fields
            ]);
        }
        Ok(creds)
    }

    /// Perform simple field validation to catch bad input.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.tenant_id.is_empty() || self.client_id.is_empty() || self.client_secret.is_empty()
        {
            return Err(anyhow!(
                "Credentials are missing. Please make sure your credentials.yaml profile has \
                tenant_id, client_id, and client_secret set."
            ));
        }
        Ok(())
    }

    /// The login authority, defaulting to the public cloud.
    pub(crate) fn authority(&self) -> &str {
        self.authority.as_deref().unwrap_or(consts::DEFAULT_AUTHORITY)
    }

    /// The Graph endpoint (including API version), defaulting to v1.0 on
    /// the public cloud.
    pub(crate) fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(consts::DEFAULT_GRAPH_ENDPOINT)
    }

    /// The OAuth scope for the client-credentials grant: `.default` on
    /// the Graph origin.
    pub(crate) fn scope(&self) -> String {
        let root = self
            .endpoint()
            .strip_suffix("/v1.0")
            .unwrap_or_else(|| self.endpoint());
        format!("{root}/.default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn complete_profiles_load() {
        let map = HashMap::from([
            ("tenant_id".to_owned(), "t".to_owned()),
            ("client_id".to_owned(), "c".to_owned()),
            ("client_secret".to_owned(), "s".to_owned()),
        ]);
        let creds = GraphCredentials::from_map(&map).unwrap();
        assert_eq!(creds.authority(), consts::DEFAULT_AUTHORITY);
        assert_eq!(creds.scope(), "https://graph.microsoft.com/.default");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let map = HashMap::from([("tenant_id".to_owned(), "t".to_owned())]);
        assert!(GraphCredentials::from_map(&map).is_err());
    }

    #[test]
    fn overrides_redirect_scope_and_authority() {
        let map = HashMap::from([
            ("tenant_id".to_owned(), "t".to_owned()),
            ("client_id".to_owned(), "c".to_owned()),
            ("client_secret".to_owned(), "s".to_owned()),
            ("authority".to_owned(), "http://127.0.0.1:9999".to_owned()),
            ("endpoint".to_owned(), "http://127.0.0.1:9999/v1.0".to_owned()),
        ]);
        let creds = GraphCredentials::from_map(&map).unwrap();
        assert_eq!(creds.authority(), "http://127.0.0.1:9999");
        assert_eq!(creds.scope(), "http://127.0.0.1:9999/.default");
    }
}
