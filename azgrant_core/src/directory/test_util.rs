//! Utilities for testing
//!
#![cfg(test)]

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{
    AppRole, AppRoleAssignment, ApplicationId, AssignmentId, NewAppRoleAssignment, ObjectId,
    Principal, PrincipalDetails, Resource,
};
use super::{DirectoryApi, DirectoryAudit};
use crate::error::DirectoryError;

/// An in-memory directory that records every mutation so tests can count
/// the API calls a reconcile run actually issued.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub(crate) principals: Vec<Principal>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) assignments: Mutex<Vec<AppRoleAssignment>>,
    pub(crate) create_calls: Mutex<usize>,
    pub(crate) delete_calls: Mutex<usize>,
    /// When set, every create fails with this error.
    pub(crate) fail_creates: Option<DirectoryError>,
}

impl FakeDirectory {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub(crate) fn with_principal(mut self, id: &str, name: &str) -> Self {
        self.principals.push(Principal {
            id: id.into(),
            display_name: name.to_owned(),
            app_id: ApplicationId(Uuid::new_v4()),
        });
        self
    }

    pub(crate) fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub(crate) fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    pub(crate) fn delete_calls(&self) -> usize {
        *self.delete_calls.lock().unwrap()
    }

    pub(crate) fn assignment_count(&self) -> usize {
        self.assignments.lock().unwrap().len()
    }
}

/// A resource with a single application role, for grant tests.
pub(crate) fn resource_with_role(
    object_id: &str,
    role_id: Uuid,
    permission: &str,
) -> Resource {
    Resource {
        id: object_id.into(),
        app_id: ApplicationId(Uuid::new_v4()),
        display_name: "Fake API".to_owned(),
        app_roles: vec![AppRole {
            id: role_id,
            value: Some(permission.to_owned()),
            allowed_member_types: vec!["Application".to_owned()],
        }],
    }
}

#[async_trait]
impl DirectoryApi for FakeDirectory {
    async fn principals_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Principal>, DirectoryError> {
        Ok(self
            .principals
            .iter()
            .filter(|p| p.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn resources_by_app_id(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Vec<Resource>, DirectoryError> {
        Ok(self
            .resources
            .iter()
            .filter(|r| r.app_id == *app_id)
            .cloned()
            .collect())
    }

    async fn assignments_for_principal(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.principal_id == *principal_id)
            .cloned()
            .collect())
    }

    async fn create_assignment(
        &self,
        new: &NewAppRoleAssignment,
    ) -> Result<AppRoleAssignment, DirectoryError> {
        *self.create_calls.lock().unwrap() += 1;
        if let Some(err) = &self.fail_creates {
            return Err(err.clone());
        }
        let created = AppRoleAssignment {
            id: AssignmentId(format!("assignment-{}", Uuid::new_v4())),
            principal_id: new.principal_id.clone(),
            resource_id: new.resource_id.clone(),
            app_role_id: new.app_role_id,
            ..Default::default()
        };
        self.assignments.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_assignment(
        &self,
        _principal_id: &ObjectId,
        assignment_id: &AssignmentId,
    ) -> Result<(), DirectoryError> {
        *self.delete_calls.lock().unwrap() += 1;
        let mut assignments = self.assignments.lock().unwrap();
        let before = assignments.len();
        assignments.retain(|a| a.id != *assignment_id);
        if assignments.len() == before {
            return Err(DirectoryError::Api {
                status: 404,
                code: "Request_ResourceNotFound".to_owned(),
                message: format!("no assignment {assignment_id}"),
            });
        }
        Ok(())
    }
}

/// A fixed-content audit surface for report tests.
#[derive(Default)]
pub(crate) struct FakeAudit {
    pub(crate) principals: Vec<PrincipalDetails>,
    pub(crate) owners: Vec<String>,
    pub(crate) last_sign_in: Option<OffsetDateTime>,
    pub(crate) held: Vec<AppRoleAssignment>,
    pub(crate) issued: Vec<AppRoleAssignment>,
    /// When set, owner lookups fail with this error.
    pub(crate) fail_owners: Option<DirectoryError>,
}

#[async_trait]
impl DirectoryAudit for FakeAudit {
    async fn list_all_principals(&self) -> Result<Vec<PrincipalDetails>, DirectoryError> {
        Ok(self.principals.clone())
    }

    async fn owners(&self, _principal_id: &ObjectId) -> Result<Vec<String>, DirectoryError> {
        if let Some(err) = &self.fail_owners {
            return Err(err.clone());
        }
        Ok(self.owners.clone())
    }

    async fn last_sign_in(
        &self,
        _app_id: &ApplicationId,
    ) -> Result<Option<OffsetDateTime>, DirectoryError> {
        Ok(self.last_sign_in)
    }

    async fn assignments_held(
        &self,
        _principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        Ok(self.held.clone())
    }

    async fn assignments_issued(
        &self,
        _principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        Ok(self.issued.clone())
    }
}
