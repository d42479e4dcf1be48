use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ClientError;
use crate::error::NOT_AUTHORIZED;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some("UNAUTHORIZED") || self.message.contains(NOT_AUTHORIZED)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

/// Moves one GraphQL request to a server and back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: GraphQLRequest) -> Result<GraphQLResponse, ClientError>;
}

/// GraphQL over HTTP. Cookies set by the server (the session) are replayed
/// on later requests. GraphQL errors arrive in a 200 body; any other status
/// is a transport error.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl HttpTransport {
    pub fn new(endpoint: url::Url) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: GraphQLRequest) -> Result<GraphQLResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
