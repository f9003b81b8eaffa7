//! Microsoft Graph connector for azgrant.
//!
//! Binds the abstract directory contract from `azgrant_core` to the
//! Graph v1.0 REST API: client-credentials sign-in at construction,
//! OData list/error envelopes with `@odata.nextLink` paging, and the
//! single SharePoint site-permission grant call.

mod audit;
mod consts;
mod creds;
mod directory;
mod rest;
mod sites;

pub use creds::GraphCredentials;
pub use directory::MsGraphDirectory;
pub use rest::GraphRestConfig;
pub use sites::SitePermissionGrant;
