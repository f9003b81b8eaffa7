//! Well-known resource applications and default permission lists.
//!
//! First-party API application IDs are tenant-independent constants.
//! They live here as configuration data so the reconciler can be pointed
//! at other resource APIs without touching its logic.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use uuid::uuid;

use crate::directory::types::ApplicationId;
use crate::error::DirectoryError;

/// Microsoft Graph.
pub const GRAPH_APP_ID: ApplicationId =
    ApplicationId(uuid!("00000003-0000-0000-c000-000000000000"));
/// SharePoint Online.
pub const SHAREPOINT_APP_ID: ApplicationId =
    ApplicationId(uuid!("00000003-0000-0ff1-ce00-000000000000"));
/// Exchange Online.
pub const EXCHANGE_APP_ID: ApplicationId =
    ApplicationId(uuid!("00000002-0000-0ff1-ce00-000000000000"));

/// The alias used when no `--resource` argument is given.
pub const DEFAULT_RESOURCE_ALIAS: &str = "graph";

/// The permissions granted when none are given on the command line.
pub const DEFAULT_PERMISSIONS: [&str; 1] = ["Sites.Selected"];

lazy_static! {
    /// The built-in alias catalog. Extended, never overridden, by aliases
    /// from the project config.
    static ref BUILTIN_ALIASES: HashMap<&'static str, ApplicationId> = HashMap::from([
        ("graph", GRAPH_APP_ID),
        ("sharepoint", SHAREPOINT_APP_ID),
        ("exchange", EXCHANGE_APP_ID),
    ]);
}

/// Resolve a `--resource` argument: first as a built-in alias, then as a
/// config-supplied alias, then as a literal GUID.
pub fn resolve_resource_arg(
    arg: &str,
    extra_aliases: &HashMap<String, ApplicationId>,
) -> Result<ApplicationId, DirectoryError> {
    let alias = arg.to_lowercase();
    if let Some(app_id) = BUILTIN_ALIASES.get(alias.as_str()) {
        return Ok(*app_id);
    }
    if let Some(app_id) = extra_aliases.get(alias.as_str()) {
        return Ok(*app_id);
    }
    ApplicationId::from_str(arg).map_err(|_| DirectoryError::NotFound {
        kind: "resource alias or application id",
        name: arg.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_aliases_resolve_case_insensitively() {
        let extra = HashMap::new();
        assert_eq!(resolve_resource_arg("graph", &extra).unwrap(), GRAPH_APP_ID);
        assert_eq!(resolve_resource_arg("Graph", &extra).unwrap(), GRAPH_APP_ID);
        assert_eq!(
            resolve_resource_arg("sharepoint", &extra).unwrap(),
            SHAREPOINT_APP_ID
        );
    }

    #[test]
    fn config_aliases_extend_the_catalog() {
        let extra = HashMap::from([(
            "ourapi".to_owned(),
            ApplicationId(uuid!("11111111-2222-3333-4444-555555555555")),
        )]);
        assert_eq!(
            resolve_resource_arg("ourapi", &extra).unwrap().to_string(),
            "11111111-2222-3333-4444-555555555555"
        );
    }

    #[test]
    fn literal_guids_parse() {
        let extra = HashMap::new();
        let resolved =
            resolve_resource_arg("00000003-0000-0000-c000-000000000000", &extra).unwrap();
        assert_eq!(resolved, GRAPH_APP_ID);
    }

    #[test]
    fn garbage_is_not_found() {
        let extra = HashMap::new();
        assert!(matches!(
            resolve_resource_arg("not-a-guid", &extra),
            Err(DirectoryError::NotFound { .. })
        ));
    }
}
