//! The `DirectoryAudit` implementation backing the tenant report.

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;

use azgrant_core::directory::types::{
    AppRoleAssignment, ApplicationId, ObjectId, PrincipalDetails,
};
use azgrant_core::error::DirectoryError;
use azgrant_core::DirectoryAudit;

use crate::directory::MsGraphDirectory;
use crate::rest::{encode_filter, escape_odata_literal};

/// An owner entry: users carry a userPrincipalName, other directory
/// objects only a display name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerRecord {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    user_principal_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInActivityRecord {
    #[serde(default)]
    last_sign_in_activity: Option<ActivityStamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityStamp {
    #[serde(default, with = "time::serde::rfc3339::option")]
    last_sign_in_date_time: Option<OffsetDateTime>,
}

#[async_trait]
impl DirectoryAudit for MsGraphDirectory {
    async fn list_all_principals(&self) -> Result<Vec<PrincipalDetails>, DirectoryError> {
        self.rest.get_list("/servicePrincipals?$top=100").await
    }

    async fn owners(&self, principal_id: &ObjectId) -> Result<Vec<String>, DirectoryError> {
        let owners: Vec<OwnerRecord> = self
            .rest
            .get_list(&format!("/servicePrincipals/{principal_id}/owners"))
            .await?;
        Ok(owners
            .into_iter()
            .filter_map(|o| o.user_principal_name.or(o.display_name))
            .collect())
    }

    async fn last_sign_in(
        &self,
        app_id: &ApplicationId,
    ) -> Result<Option<OffsetDateTime>, DirectoryError> {
        let filter = format!("appId eq '{}'", escape_odata_literal(&app_id.to_string()));
        let activities: Vec<SignInActivityRecord> = self
            .rest
            .get_list(&format!(
                "/reports/servicePrincipalSignInActivities?$filter={}",
                encode_filter(&filter)
            ))
            .await?;
        Ok(activities
            .into_iter()
            .filter_map(|a| a.last_sign_in_activity.and_then(|s| s.last_sign_in_date_time))
            .max())
    }

    async fn assignments_held(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        self.rest
            .get_list(&format!(
                "/servicePrincipals/{principal_id}/appRoleAssignments"
            ))
            .await
    }

    async fn assignments_issued(
        &self,
        principal_id: &ObjectId,
    ) -> Result<Vec<AppRoleAssignment>, DirectoryError> {
        self.rest
            .get_list(&format!(
                "/servicePrincipals/{principal_id}/appRoleAssignedTo"
            ))
            .await
    }
}
