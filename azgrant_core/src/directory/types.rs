//! Typed records for directory objects.
//!
//! Field names follow the Graph wire format (camelCase) so connector
//! crates can deserialize responses straight into these types.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The member type an app role must allow for a non-interactive grant.
pub const APPLICATION_MEMBER_TYPE: &str = "Application";

/// An opaque, directory-assigned object identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId(s.to_owned())
    }
}

/// The server-assigned id of an app-role assignment. Distinct from
/// [`ObjectId`]: it identifies the grant edge, not a directory object,
/// and is unknown until a create round-trips.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[serde(transparent)]
pub struct AssignmentId(pub String);

impl Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssignmentId {
    fn from(s: &str) -> Self {
        AssignmentId(s.to_owned())
    }
}

/// A client/application ID. A different namespace from [`ObjectId`]:
/// application IDs are GUIDs, shared across tenants for first-party APIs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(ApplicationId)
    }
}

/// A security identity that can be granted permissions.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// The directory's opaque object id. Stable for the principal's life.
    pub id: ObjectId,
    /// Human-chosen name. Not guaranteed unique in a directory.
    #[serde(default)]
    pub display_name: String,
    /// The backing application's client id.
    pub app_id: ApplicationId,
}

/// A service principal representing an API surface. Read-only from this
/// system's perspective.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The directory's opaque object id.
    pub id: ObjectId,
    /// The well-known application id identifying the API.
    pub app_id: ApplicationId,
    /// Display name, used in messages only.
    #[serde(default)]
    pub display_name: String,
    /// The permission catalog the resource exposes.
    #[serde(default)]
    pub app_roles: Vec<AppRole>,
}

/// A single grantable application permission exposed by a [`Resource`].
/// Looked up, never created.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRole {
    /// Resource-local role id.
    pub id: Uuid,
    /// Symbolic name, e.g. "Sites.Selected". Null for some built-in roles.
    #[serde(default)]
    pub value: Option<String>,
    /// Which member types may hold the role. Must contain "Application"
    /// for a non-interactive grant.
    #[serde(default)]
    pub allowed_member_types: Vec<String>,
}

impl AppRole {
    /// Whether the role can be held by an application identity.
    pub fn allows_applications(&self) -> bool {
        self.allowed_member_types
            .iter()
            .any(|t| t == APPLICATION_MEMBER_TYPE)
    }
}

/// A directed grant edge: "principal P holds role R on resource X".
/// The tuple (principal, resource, role) is the natural key; the `id`
/// is storage-only.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleAssignment {
    /// Server-assigned id, used only for deletes.
    pub id: AssignmentId,
    /// The grantee's object id.
    pub principal_id: ObjectId,
    /// The API provider's object id.
    pub resource_id: ObjectId,
    /// The granted role's id.
    pub app_role_id: Uuid,
    /// Grantee display name, when the backend includes it.
    #[serde(default)]
    pub principal_display_name: Option<String>,
    /// Resource display name, when the backend includes it.
    #[serde(default)]
    pub resource_display_name: Option<String>,
}

impl AppRoleAssignment {
    /// Whether this assignment grants `role_id` on `resource_id`. Matching
    /// is always on the semantic key, never on the server-assigned `id`.
    pub fn matches(&self, resource_id: &ObjectId, role_id: &Uuid) -> bool {
        self.resource_id == *resource_id && self.app_role_id == *role_id
    }
}

/// The request body for an assignment create. Exactly the three key
/// fields, constructed once and serialized, never an ad-hoc JSON map.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppRoleAssignment {
    /// The grantee's object id.
    pub principal_id: ObjectId,
    /// The API provider's object id.
    pub resource_id: ObjectId,
    /// The role to grant.
    pub app_role_id: Uuid,
}

impl NewAppRoleAssignment {
    /// Build the create body for granting `role` on `resource` to `principal`.
    pub fn new(principal: &Principal, resource: &Resource, role: &AppRole) -> Self {
        Self {
            principal_id: principal.id.clone(),
            resource_id: resource.id.clone(),
            app_role_id: role.id,
        }
    }
}

/// A key credential (certificate) on a service principal.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCredential {
    /// Friendly name, if set.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Expiry timestamp.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date_time: Option<OffsetDateTime>,
}

/// A password credential (client secret) on a service principal.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCredential {
    /// Friendly name, if set.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Expiry timestamp.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date_time: Option<OffsetDateTime>,
}

/// The full service-principal record the tenant report consumes.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalDetails {
    /// The directory's opaque object id.
    pub id: ObjectId,
    /// The backing application's client id.
    pub app_id: ApplicationId,
    /// Human-chosen name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// "Application", "ManagedIdentity", "Legacy", etc.
    #[serde(default)]
    pub service_principal_type: Option<String>,
    /// Whether sign-in is enabled for the principal.
    #[serde(default)]
    pub account_enabled: Option<bool>,
    /// When the principal was created.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_date_time: Option<OffsetDateTime>,
    /// Which account types can sign in to the backing application.
    #[serde(default)]
    pub sign_in_audience: Option<String>,
    /// Homepage URL, if registered.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Certificates, with expiries.
    #[serde(default)]
    pub key_credentials: Vec<KeyCredential>,
    /// Client secrets, with expiries.
    #[serde(default)]
    pub password_credentials: Vec<PasswordCredential>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assignment_serializes_exactly_three_fields() {
        let new = NewAppRoleAssignment {
            principal_id: "P1".into(),
            resource_id: "G1".into(),
            app_role_id: Uuid::nil(),
        };
        let body = serde_json::to_value(&new).unwrap();
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["principalId"], "P1");
        assert_eq!(obj["resourceId"], "G1");
        assert_eq!(obj["appRoleId"], Uuid::nil().to_string());
    }

    #[test]
    fn assignment_deserializes_from_wire_names() {
        let raw = r#"{
            "id": "A1",
            "principalId": "P1",
            "resourceId": "G1",
            "appRoleId": "00000000-0000-0000-0000-000000000001",
            "resourceDisplayName": "Microsoft Graph"
        }"#;
        let a: AppRoleAssignment = serde_json::from_str(raw).unwrap();
        assert_eq!(a.id, "A1".into());
        assert_eq!(a.principal_id, "P1".into());
        assert_eq!(a.resource_display_name.as_deref(), Some("Microsoft Graph"));
    }

    #[test]
    fn matches_uses_the_semantic_key() {
        let role = Uuid::new_v4();
        let a = AppRoleAssignment {
            id: "irrelevant".into(),
            principal_id: "P1".into(),
            resource_id: "G1".into(),
            app_role_id: role,
            ..Default::default()
        };
        assert!(a.matches(&"G1".into(), &role));
        assert!(!a.matches(&"G2".into(), &role));
        assert!(!a.matches(&"G1".into(), &Uuid::new_v4()));
    }
}
