//! The abstract directory contract.
//!
//! The lookup, reconciliation, and report components are written against
//! these traits rather than against a concrete HTTP client. The
//! `azgrant_msgraph` crate provides the Microsoft Graph implementation;
//! tests use an in-memory fake.

use async_trait::async_trait;

use crate::error::DirectoryError;

pub mod types;

pub(crate) mod test_util;

use types::{
    AppRoleAssignment, ApplicationId, AssignmentId, NewAppRoleAssignment, ObjectId, Principal,
    PrincipalDetails, Resource,
};

/// The read/write surface the reconciliation core needs from a directory.
#[async_trait]
pub trait DirectoryApi {
    /// List the principals whose display name exactly matches `display_name`.
    /// Returns every match; the zero/one/many contract is applied by
    /// [`crate::lookup::DirectoryLookup`].
    async fn principals_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Principal>, DirectoryError>;

    /// List the service principals registered for the given application ID,
    /// including their full app-role catalogs.
    async fn resources_by_app_id(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Vec<Resource>, DirectoryError>;

    /// List the app-role assignments held by a principal. Always scoped to
    /// the assignee, never to the resource.
    async fn assignments_for_principal(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError>;

    /// Create an assignment from the three-field request body.
    async fn create_assignment(
        &self,
        new: &NewAppRoleAssignment,
    ) -> Result<AppRoleAssignment, DirectoryError>;

    /// Delete an assignment by its server-assigned id.
    async fn delete_assignment(
        &self,
        principal_id: &ObjectId,
        assignment_id: &AssignmentId,
    ) -> Result<(), DirectoryError>;
}

/// The read-only surface the tenant report needs from a directory.
#[async_trait]
pub trait DirectoryAudit {
    /// Enumerate every service principal in the tenant. Key and password
    /// credentials arrive inline on each record.
    async fn list_all_principals(&self) -> Result<Vec<PrincipalDetails>, DirectoryError>;

    /// Display names of a principal's owners.
    async fn owners(&self, principal_id: &ObjectId) -> Result<Vec<String>, DirectoryError>;

    /// The most recent sign-in for the application, if the tenant exposes
    /// sign-in activity reports.
    async fn last_sign_in(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Option<time::OffsetDateTime>, DirectoryError>;

    /// Assignments where the principal is the grantee.
    async fn assignments_held(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError>;

    /// Assignments the principal has issued to others (the principal acting
    /// as the resource).
    async fn assignments_issued(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError>;
}
