//! Rest API interface for Microsoft Graph
//!

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use azgrant_core::error::DirectoryError;

use crate::{consts, creds::GraphCredentials};

/// The OData list envelope Graph wraps collection responses in.
#[derive(Debug, Deserialize)]
pub(crate) struct ODataList<T> {
    pub(crate) value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub(crate) next_link: Option<String>,
}

/// The OData error envelope Graph wraps failures in.
#[derive(Debug, Deserialize)]
struct ODataErrorEnvelope {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

/// The token endpoint's success body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The token endpoint's failure body.
#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

/// Knobs for the underlying HTTP client.
#[derive(Default)]
pub struct GraphRestConfig {
    /// Enable/disable retry logic.
    pub retry: bool,
    /// Per-request deadline override. Defaults to
    /// [`consts::REQUEST_TIMEOUT_SECS`].
    pub timeout: Option<Duration>,
}

/// Wrapper struct for http functionality. Signs in with the
/// client-credentials grant during construction; holds one token for the
/// client's life (no caching or refresh).
pub(crate) struct GraphRestClient {
    credentials: GraphCredentials,
    http_client: ClientWithMiddleware,
    token: String,
}

impl GraphRestClient {
    pub(crate) async fn new(
        credentials: GraphCredentials,
        config: GraphRestConfig,
    ) -> Result<Self, DirectoryError> {
        credentials
            .validate()
            .map_err(|e| DirectoryError::Auth(e.to_string()))?;

        let inner = reqwest::Client::builder()
            .gzip(true)
            .timeout(
                config
                    .timeout
                    .unwrap_or(Duration::from_secs(consts::REQUEST_TIMEOUT_SECS)),
            )
            .build()
            .map_err(|e| DirectoryError::transport(e.to_string()))?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let mut client_builder = ClientBuilder::new(inner);
        if config.retry {
            client_builder =
                client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy))
        }
        let http_client = client_builder.build();

        let token = Self::sign_in(&http_client, &credentials).await?;
        Ok(Self {
            credentials,
            http_client,
            token,
        })
    }

    /// Client-credentials sign-in. Any failure here is fatal: no
    /// directory call can succeed without a token.
    async fn sign_in(
        client: &ClientWithMiddleware,
        credentials: &GraphCredentials,
    ) -> Result<String, DirectoryError> {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            credentials.authority(),
            credentials.tenant_id
        );
        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", &credentials.scope()),
            ("grant_type", "client_credentials"),
        ];

        let response = client
            .post(&token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DirectoryError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return match response.json::<TokenError>().await {
                Ok(body) => Err(DirectoryError::Auth(format!(
                    "{}: {}",
                    body.error,
                    body.error_description.unwrap_or_default()
                ))),
                Err(_) => Err(DirectoryError::Auth(format!(
                    "token endpoint returned {status}"
                ))),
            };
        }

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| DirectoryError::Auth(format!("malformed token response: {e}")))?;
        Ok(body.access_token)
    }

    /// Build an absolute URL from a path relative to the Graph endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.endpoint(), path)
    }

    fn add_headers(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(consts::AUTH_HEADER, format!("Bearer {}", self.token))
            .header(consts::ACCEPT_HEADER, "application/json")
            .header(consts::USER_AGENT_HEADER, consts::USER_AGENT)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response, DirectoryError> {
        let response = req.send().await.map_err(map_transport_error)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// GET a single typed object.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DirectoryError> {
        self.get_absolute(&self.url(path)).await
    }

    async fn get_absolute<T: DeserializeOwned>(&self, url: &str) -> Result<T, DirectoryError> {
        let response = self
            .execute(self.add_headers(self.http_client.get(url)))
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::transport(format!("malformed response body: {e}")))
    }

    /// GET a collection, following `@odata.nextLink` until the directory
    /// stops paging.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, DirectoryError> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path));
        while let Some(url) = next {
            let page: ODataList<T> = self.get_absolute(&url).await?;
            items.extend(page.value);
            // nextLink is absolute, ready to follow as-is.
            next = page.next_link;
        }
        Ok(items)
    }

    /// POST a typed body, parsing a typed response.
    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DirectoryError> {
        let response = self
            .execute(self.add_headers(self.http_client.post(self.url(path)).json(body)))
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::transport(format!("malformed response body: {e}")))
    }

    /// DELETE, expecting an empty success response (204).
    pub(crate) async fn delete(&self, path: &str) -> Result<(), DirectoryError> {
        self.execute(self.add_headers(self.http_client.delete(self.url(path))))
            .await?;
        Ok(())
    }
}

/// Map transport-level failures: an elapsed deadline becomes `Timeout`,
/// anything else a synthetic `Api` error with status 0.
fn map_transport_error(err: reqwest_middleware::Error) -> DirectoryError {
    match err {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => DirectoryError::Timeout,
        other => DirectoryError::transport(other.to_string()),
    }
}

/// Parse the OData error envelope off a failed response, degrading
/// gracefully when the body isn't one.
async fn error_from_response(response: reqwest::Response) -> DirectoryError {
    let status = response.status().as_u16();
    match response.json::<ODataErrorEnvelope>().await {
        Ok(envelope) => DirectoryError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => DirectoryError::Api {
            status,
            code: "unknown".to_owned(),
            message: "response body was not an OData error".to_owned(),
        },
    }
}

/// Percent-encode an OData `$filter` expression for use in a URL. String
/// literals inside the expression must already be escaped with
/// [`escape_odata_literal`].
pub(crate) fn encode_filter(expression: &str) -> String {
    urlencoding::encode(expression).into_owned()
}

/// Escape a string literal for use inside an OData `$filter` expression.
pub(crate) fn escape_odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}
