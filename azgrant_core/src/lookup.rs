//! Translation of human-supplied identifiers into directory object ids.
//!
//! Display names are not unique in a directory, so every name-based
//! lookup applies a strict zero/one/many contract: zero matches is
//! `NotFound`, more than one is `Ambiguous`. The first result is never
//! silently picked.

use crate::directory::types::{AppRole, ApplicationId, Principal, Resource};
use crate::directory::DirectoryApi;
use crate::error::DirectoryError;

/// Resolves names and well-known ids against an authenticated directory
/// client. The client is an explicit constructor parameter, never ambient
/// state.
pub struct DirectoryLookup<'a> {
    directory: &'a (dyn DirectoryApi + Send + Sync),
}

impl<'a> DirectoryLookup<'a> {
    /// Wrap an authenticated directory client.
    pub fn new(directory: &'a (dyn DirectoryApi + Send + Sync)) -> Self {
        Self { directory }
    }

    /// Find the single principal with the given display name.
    pub async fn find_principal_by_name(&self, name: &str) -> Result<Principal, DirectoryError> {
        let mut matches = self.directory.principals_by_name(name).await?;
        match matches.len() {
            0 => Err(DirectoryError::NotFound {
                kind: "service principal",
                name: name.to_owned(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(DirectoryError::Ambiguous {
                name: name.to_owned(),
                count,
            }),
        }
    }

    /// Find the tenant's service principal for a well-known application ID,
    /// with its full app-role catalog. Application IDs are globally
    /// constant for first-party APIs, so this is effectively a read of a
    /// fixed value.
    pub async fn find_resource_by_app_id(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Resource, DirectoryError> {
        let mut matches = self.directory.resources_by_app_id(app_id).await?;
        match matches.len() {
            0 => Err(DirectoryError::NotFound {
                kind: "resource application",
                name: app_id.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(DirectoryError::Ambiguous {
                name: app_id.to_string(),
                count,
            }),
        }
    }
}

/// Find the app role named `permission` on `resource`, restricted to roles
/// grantable to applications. A permission that exists only as a delegated
/// grant must not resolve - that filter is correctness-critical, not an
/// optimization.
pub fn resolve_app_role<'r>(
    resource: &'r Resource,
    permission: &str,
) -> Result<&'r AppRole, DirectoryError> {
    resource
        .app_roles
        .iter()
        .find(|role| role.value.as_deref() == Some(permission) && role.allows_applications())
        .ok_or_else(|| DirectoryError::RoleNotFound {
            permission: permission.to_owned(),
            resource: resource.display_name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_util::{resource_with_role, FakeDirectory};
    use crate::directory::types::AppRole;
    use uuid::Uuid;

    #[tokio::test]
    async fn missing_principal_is_not_found() {
        let directory = FakeDirectory::new().with_principal("P1", "adf-01");
        let lookup = DirectoryLookup::new(&directory);
        let err = lookup.find_principal_by_name("adf-02").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_display_names_are_ambiguous() {
        let directory = FakeDirectory::new()
            .with_principal("P1", "adf-01")
            .with_principal("P2", "adf-01");
        let lookup = DirectoryLookup::new(&directory);
        let err = lookup.find_principal_by_name("adf-01").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Ambiguous { count: 2, .. }));
    }

    #[tokio::test]
    async fn unique_principal_resolves() {
        let directory = FakeDirectory::new().with_principal("P1", "adf-01");
        let lookup = DirectoryLookup::new(&directory);
        let principal = lookup.find_principal_by_name("adf-01").await.unwrap();
        assert_eq!(principal.id, "P1".into());
    }

    #[tokio::test]
    async fn resource_lookup_by_app_id() {
        let resource = resource_with_role("G1", Uuid::new_v4(), "Sites.Selected");
        let app_id = resource.app_id;
        let directory = FakeDirectory::new().with_resource(resource);
        let lookup = DirectoryLookup::new(&directory);
        let found = lookup.find_resource_by_app_id(&app_id).await.unwrap();
        assert_eq!(found.id, "G1".into());
        assert_eq!(found.app_roles.len(), 1);
    }

    #[test]
    fn delegated_only_roles_never_resolve() {
        let mut resource = resource_with_role("G1", Uuid::new_v4(), "Sites.Selected");
        resource.app_roles.push(AppRole {
            id: Uuid::new_v4(),
            value: Some("User.Read".to_owned()),
            allowed_member_types: vec!["User".to_owned()],
        });

        // Exact value match, but the member-type filter must reject it.
        let err = resolve_app_role(&resource, "User.Read").unwrap_err();
        assert!(matches!(err, DirectoryError::RoleNotFound { .. }));

        assert!(resolve_app_role(&resource, "Sites.Selected").is_ok());
    }

    #[test]
    fn unknown_permission_is_role_not_found() {
        let resource = resource_with_role("G1", Uuid::new_v4(), "Sites.Selected");
        let err = resolve_app_role(&resource, "Mail.Send").unwrap_err();
        assert!(
            matches!(err, DirectoryError::RoleNotFound { ref permission, .. } if permission == "Mail.Send")
        );
    }
}
