//! Google Drive v3 storage backend
//!
//! Talks to the Drive REST API with a bearer token. Obtaining and refreshing
//! the token is the caller's business. List calls follow `nextPageToken`
//! until the listing is exhausted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_core::query::escape_literal;
use dw_core::{BackendError, ChangeRecord, FileQuery, FolderId, StorageBackend};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Public Drive v3 endpoint
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMeta {
    id: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifiedFile {
    id: String,
    name: String,
    web_view_link: Option<String>,
    modified_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList<T> {
    #[serde(default = "Vec::new")]
    files: Vec<T>,
    next_page_token: Option<String>,
}

pub struct DriveBackend {
    client: Client,
    api_base: String,
    access_token: String,
}

impl DriveBackend {
    pub fn new(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Run a `files.list` search and collect every page
    async fn list<T: DeserializeOwned>(&self, q: &str, fields: &str) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/files", self.api_base);
        let fields = format!("nextPageToken,files({})", fields);
        let mut page_token: Option<String> = None;
        let mut items = Vec::new();

        loop {
            let mut params = vec![
                ("q", q),
                ("fields", fields.as_str()),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| BackendError::Http(e.to_string()))?;

            let page: FileList<T> = decode(check_status(resp).await?).await?;
            items.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }
}

/// Turn a non-success response into `BackendError::Status`
async fn check_status(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    resp.json()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl StorageBackend for DriveBackend {
    fn name(&self) -> &str {
        "drive"
    }

    async fn resolve_folder(&self, id: &FolderId) -> Result<FolderId, BackendError> {
        let url = format!("{}/files/{}", self.api_base, id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id,mimeType"), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(id.clone()));
        }

        let meta: FileMeta = decode(check_status(resp).await?).await?;
        if meta.mime_type != FOLDER_MIME_TYPE {
            return Err(BackendError::NotAFolder(id.clone()));
        }
        Ok(FolderId::new(meta.id))
    }

    async fn child_folders(&self, id: &FolderId) -> Result<Vec<FolderId>, BackendError> {
        let q = format!(
            "'{}' in parents and mimeType = '{}' and trashed = false",
            escape_literal(id.as_str()),
            FOLDER_MIME_TYPE
        );
        let entries: Vec<FolderEntry> = self.list(&q, "id").await?;
        Ok(entries.into_iter().map(|e| FolderId::new(e.id)).collect())
    }

    async fn query_files(&self, query: &FileQuery) -> Result<Vec<ChangeRecord>, BackendError> {
        let q = query.to_drive_query();
        debug!("Drive query: {}", q);

        let files: Vec<ModifiedFile> = self
            .list(&q, "id,name,webViewLink,modifiedTime")
            .await?;

        Ok(files
            .into_iter()
            .map(|f| {
                let url = f
                    .web_view_link
                    .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", f.id));
                ChangeRecord::new(f.name, url, f.modified_time)
            })
            .collect())
    }
}
