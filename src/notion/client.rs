//! Notion API client
//!
//! Creates pages from formatted blocks and looks up the databases an
//! integration token has been shared with. Every call carries the caller's
//! bearer token; the client itself holds no credentials.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::Settings;
use crate::notion::blocks::{BlockObject, DocumentBlock, RichText};
use crate::{NotescribeError, Result};

const SERVICE: &str = "Notion";

/// Per-user bearer credential for the Notion API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create a page titled `title` under `database_id` containing `blocks`.
    async fn create_page(
        &self,
        database_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
        token: &AccessToken,
    ) -> Result<()>;
}

/// A database the token can write pages into.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSummary {
    pub id: String,
    #[serde(default)]
    pub title: Vec<TitleText>,
    #[serde(default)]
    pub icon: Option<Icon>,
}

impl DatabaseSummary {
    pub fn title_text(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Icon {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

pub struct NotionClient {
    http: Client,
    endpoint: String,
}

impl NotionClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_str(settings.notion.api_version.trim()).map_err(|e| {
                NotescribeError::Config(format!("Invalid notion.api_version: {}", e))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.notion.timeout_secs))
            .build()
            .map_err(|e| {
                NotescribeError::Config(format!("Failed to build Notion HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: settings.notion.endpoint.trim().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Check that a token is accepted by the API.
    pub async fn verify_token(&self, token: &AccessToken) -> Result<()> {
        require_token(token)?;

        let response = self
            .http
            .get(self.url("users/me"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// List the databases shared with the token's integration.
    pub async fn search_databases(&self, token: &AccessToken) -> Result<Vec<DatabaseSummary>> {
        require_token(token)?;

        let body = SearchRequest {
            filter: SearchFilter {
                value: "database",
                property: "object",
            },
        };
        let response = self
            .http
            .post(self.url("search"))
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.bytes().await?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| NotescribeError::malformed(SERVICE, e))?;
        Ok(parsed.results)
    }
}

#[async_trait]
impl Publisher for NotionClient {
    async fn create_page(
        &self,
        database_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
        token: &AccessToken,
    ) -> Result<()> {
        if database_id.trim().is_empty() {
            return Err(NotescribeError::Validation(
                "No Notion database id supplied".to_string(),
            ));
        }
        require_token(token)?;

        let page = CreatePageRequest::new(database_id, title, blocks);
        let response = self
            .http
            .post(self.url("pages"))
            .bearer_auth(token.as_str())
            .json(&page)
            .send()
            .await?;
        check_status(response).await?;

        tracing::debug!("Created Notion page '{}' with {} blocks", title, blocks.len());
        Ok(())
    }
}

fn require_token(token: &AccessToken) -> Result<()> {
    if token.is_empty() {
        return Err(NotescribeError::Validation(
            "No Notion access token supplied".to_string(),
        ));
    }
    Ok(())
}

/// Pass through 2xx responses; turn anything else into a provider error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let error: NotionApiError = serde_json::from_slice(&body).map_err(|e| {
        NotescribeError::malformed(
            SERVICE,
            format!("status {} with unreadable error body: {}", status, e),
        )
    })?;

    tracing::debug!(
        "Notion returned {} (object={:?}, code={:?}, validation_error={:?})",
        status,
        error.object,
        error.code,
        error.validation_error
    );
    Err(NotescribeError::provider(SERVICE, error.message))
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePageRequest<'a> {
    parent: Parent<'a>,
    properties: PageProperties,
    children: Vec<BlockObject>,
}

impl<'a> CreatePageRequest<'a> {
    pub(crate) fn new(database_id: &'a str, title: &str, blocks: &[DocumentBlock]) -> Self {
        Self {
            parent: Parent {
                kind: "database_id",
                database_id,
            },
            properties: PageProperties {
                name: TitleProperty {
                    title: vec![RichText::plain(title)],
                },
            },
            children: blocks.iter().map(BlockObject::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Parent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    database_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PageProperties {
    #[serde(rename = "Name")]
    name: TitleProperty,
}

#[derive(Debug, Serialize)]
struct TitleProperty {
    title: Vec<RichText>,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    filter: SearchFilter,
}

#[derive(Debug, Serialize)]
struct SearchFilter {
    value: &'static str,
    property: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<DatabaseSummary>,
}

#[derive(Debug, Deserialize)]
struct NotionApiError {
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    validation_error: Option<String>,
    message: String,
}
