//! The `DirectoryApi` implementation over Graph's servicePrincipals
//! endpoints.

use async_trait::async_trait;

use azgrant_core::directory::types::{
    AppRoleAssignment, ApplicationId, AssignmentId, NewAppRoleAssignment, ObjectId, Principal,
    Resource,
};
use azgrant_core::error::DirectoryError;
use azgrant_core::DirectoryApi;

use crate::creds::GraphCredentials;
use crate::rest::{encode_filter, escape_odata_literal, GraphRestClient, GraphRestConfig};

/// An authenticated Microsoft Graph directory client.
pub struct MsGraphDirectory {
    pub(crate) rest: GraphRestClient,
}

impl MsGraphDirectory {
    /// Sign in and wrap a Graph client. Sign-in failure surfaces as
    /// [`DirectoryError::Auth`] before any directory call is attempted.
    pub async fn new(
        credentials: GraphCredentials,
        config: GraphRestConfig,
    ) -> Result<Self, DirectoryError> {
        Ok(Self {
            rest: GraphRestClient::new(credentials, config).await?,
        })
    }
}

#[async_trait]
impl DirectoryApi for MsGraphDirectory {
    async fn principals_by_name(
        &self,
        display_name: &str,
    ) -> Result<Vec<Principal>, DirectoryError> {
        let filter = format!(
            "displayName eq '{}'",
            escape_odata_literal(display_name)
        );
        self.rest
            .get_list(&format!(
                "/servicePrincipals?$filter={}&$select=id,displayName,appId",
                encode_filter(&filter)
            ))
            .await
    }

    async fn resources_by_app_id(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Vec<Resource>, DirectoryError> {
        let filter = format!("appId eq '{app_id}'");
        self.rest
            .get_list(&format!(
                "/servicePrincipals?$filter={}",
                encode_filter(&filter)
            ))
            .await
    }

    async fn assignments_for_principal(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        self.rest
            .get_list(&format!(
                "/servicePrincipals/{principal_id}/appRoleAssignments"
            ))
            .await
    }

    async fn create_assignment(
        &self,
        new: &NewAppRoleAssignment,
    ) -> Result<AppRoleAssignment, DirectoryError> {
        self.rest
            .post(
                &format!(
                    "/servicePrincipals/{}/appRoleAssignments",
                    new.principal_id
                ),
                new,
            )
            .await
    }

    async fn delete_assignment(
        &self,
        principal_id: &ObjectId,
        assignment_id: &AssignmentId,
    ) -> Result<(), DirectoryError> {
        self.rest
            .delete(&format!(
                "/servicePrincipals/{principal_id}/appRoleAssignments/{assignment_id}"
            ))
            .await
    }
}
