//! The single SharePoint site-permission grant call.
//!
//! Resolves a human-pasted site URL to a Graph site id, then grants the
//! principal's application identity the requested roles on that site.
//! Intentionally one call deep: no site-permission model beyond this.

use serde::{Deserialize, Serialize};

use azgrant_core::directory::types::Principal;
use azgrant_core::error::DirectoryError;

use crate::directory::MsGraphDirectory;

#[derive(Debug, Deserialize)]
struct Site {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewSitePermission {
    roles: Vec<String>,
    granted_to_identities: Vec<IdentitySet>,
}

#[derive(Debug, Serialize)]
struct IdentitySet {
    application: AppIdentity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppIdentity {
    id: String,
    display_name: String,
}

/// The permission object Graph returns from a site grant.
#[derive(Debug, Deserialize)]
pub struct SitePermissionGrant {
    /// Server-assigned permission id.
    pub id: String,
    /// The roles actually granted.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl MsGraphDirectory {
    /// Grant `roles` on the site at `site_url` to `principal`'s
    /// application identity.
    pub async fn grant_site_permission(
        &self,
        principal: &Principal,
        site_url: &str,
        roles: &[String],
    ) -> Result<SitePermissionGrant, DirectoryError> {
        let (hostname, server_relative_path) = split_site_url(site_url)?;

        // "GET /sites/{hostname}:{server-relative-path}" resolves the
        // composite site id.
        let site: Site = self
            .rest
            .get(&format!("/sites/{hostname}:{server_relative_path}"))
            .await?;

        let body = NewSitePermission {
            roles: roles.to_vec(),
            granted_to_identities: vec![IdentitySet {
                application: AppIdentity {
                    id: principal.app_id.to_string(),
                    display_name: principal.display_name.clone(),
                },
            }],
        };
        self.rest
            .post(&format!("/sites/{}/permissions", site.id), &body)
            .await
    }
}

/// Split a site URL like `https://contoso.sharepoint.com/sites/ops` into
/// its hostname and server-relative path.
fn split_site_url(site_url: &str) -> Result<(String, String), DirectoryError> {
    let parsed = reqwest::Url::parse(site_url).map_err(|e| DirectoryError::NotFound {
        kind: "site url",
        name: format!("{site_url} ({e})"),
    })?;
    let hostname = parsed
        .host_str()
        .ok_or_else(|| DirectoryError::NotFound {
            kind: "site url",
            name: site_url.to_owned(),
        })?
        .to_owned();
    let path = parsed.path().trim_end_matches('/');
    if path.is_empty() {
        return Err(DirectoryError::NotFound {
            kind: "site url",
            name: site_url.to_owned(),
        });
    }
    Ok((hostname, path.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_urls_split_into_host_and_path() {
        let (host, path) = split_site_url("https://contoso.sharepoint.com/sites/ops").unwrap();
        assert_eq!(host, "contoso.sharepoint.com");
        assert_eq!(path, "/sites/ops");
    }

    #[test]
    fn bare_hostnames_are_rejected() {
        assert!(split_site_url("https://contoso.sharepoint.com/").is_err());
        assert!(split_site_url("not a url").is_err());
    }

    #[test]
    fn grant_body_matches_the_wire_shape() {
        let body = NewSitePermission {
            roles: vec!["read".to_owned()],
            granted_to_identities: vec![IdentitySet {
                application: AppIdentity {
                    id: "app-id".to_owned(),
                    display_name: "adf-01".to_owned(),
                },
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["roles"][0], "read");
        assert_eq!(value["grantedToIdentities"][0]["application"]["id"], "app-id");
        assert_eq!(
            value["grantedToIdentities"][0]["application"]["displayName"],
            "adf-01"
        );
    }
}
