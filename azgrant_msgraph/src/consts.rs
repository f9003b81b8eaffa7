pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

pub const AUTH_HEADER: &str = "Authorization";
pub const ACCEPT_HEADER: &str = "Accept";
pub const USER_AGENT_HEADER: &str = "User-Agent";
pub const USER_AGENT: &str = "azgrant";

/// Per-request transport deadline, seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
