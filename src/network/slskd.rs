//! [`PeerNetwork`] backed by a running slskd daemon.
//!
//! slskd keeps the Soulseek session and the credentials; this adapter only
//! speaks its REST API (`/api/v0`). Completed downloads land in slskd's own
//! download directory, under the name of the remote parent directory, and
//! are moved to the requested destination once the transfer reports success.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    config::{self, ConfigError},
    types::{PeerResult, SharedFile},
    utils,
};

use super::{NetworkError, PeerNetwork, SearchHandle, TransferHandle, TransferState};

const API_PREFIX: &str = "api/v0";
const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
const LOGIN_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerState {
    #[serde(default)]
    is_connected: bool,
    #[serde(default)]
    is_logged_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    username: String,
    #[serde(default)]
    upload_speed: Option<u64>,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    filename: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    filename: &'a str,
    size: u64,
}

#[derive(Debug, Default, Deserialize)]
struct UserTransfers {
    #[serde(default)]
    directories: Vec<TransferDirectory>,
}

#[derive(Debug, Default, Deserialize)]
struct TransferDirectory {
    #[serde(default)]
    files: Vec<TransferFile>,
}

#[derive(Debug, Deserialize)]
struct TransferFile {
    #[serde(default)]
    id: Option<String>,
    filename: String,
    state: String,
}

/// Maps slskd's flag-style transfer state (e.g. `"Completed, Succeeded"`).
fn parse_transfer_state(state: &str) -> TransferState {
    if state.contains("Succeeded") {
        TransferState::Completed
    } else if state.starts_with("Completed") {
        TransferState::Failed(state.to_string())
    } else if state.contains("InProgress") || state.contains("Initializing") {
        TransferState::InProgress
    } else {
        TransferState::Queued
    }
}

#[derive(Clone)]
pub struct SlskdClient {
    http: Client,
    base_url: String,
    api_key: String,
    downloads_dir: PathBuf,
    /// File sizes seen in search results, keyed by (username, remote path).
    /// slskd wants the size when a download is queued.
    sizes: Arc<Mutex<HashMap<(String, String), u64>>>,
}

impl SlskdClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            downloads_dir: downloads_dir.into(),
            sizes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Builds a client from `SLSKD_URL`, `SLSKD_API_KEY` and
    /// `SLSKD_DOWNLOADS_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            config::slskd_url()?,
            config::slskd_api_key()?,
            config::slskd_downloads_dir()?,
        ))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{base}/{prefix}/{path}",
            base = self.base_url,
            prefix = API_PREFIX,
            path = path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("X-API-Key", &self.api_key)
    }

    async fn server_state(&self) -> Result<ServerState, NetworkError> {
        let response = self
            .authorized(self.http.get(self.url("server")))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ServerState>().await?)
    }

    /// Where slskd leaves a completed download of `remote_path`.
    fn completed_path(&self, remote_path: &str) -> PathBuf {
        let mut path = self.downloads_dir.clone();
        if let Some(parent) = utils::remote_parent_name(remote_path) {
            path.push(parent);
        }
        path.push(utils::remote_file_name(remote_path));
        path
    }
}

#[async_trait]
impl PeerNetwork for SlskdClient {
    async fn start(&self) -> Result<(), NetworkError> {
        self.authorized(self.http.get(self.url("application")))
            .send()
            .await
            .map_err(|e| NetworkError::Unavailable(e.to_string()))?
            .error_for_status()?;
        Ok(())
    }

    async fn login(&self) -> Result<(), NetworkError> {
        let state = self.server_state().await?;
        if state.is_logged_in {
            return Ok(());
        }

        if !state.is_connected {
            self.authorized(self.http.put(self.url("server")))
                .send()
                .await?
                .error_for_status()?;
        }

        let client = self;
        let logged_in = utils::poll_until(LOGIN_TIMEOUT, LOGIN_POLL, move || async move {
            match client.server_state().await {
                Ok(state) if state.is_logged_in => Some(()),
                _ => None,
            }
        })
        .await;

        logged_in.ok_or(NetworkError::NotLoggedIn)
    }

    async fn stop(&self) -> Result<(), NetworkError> {
        // The session belongs to the daemon; leave it connected.
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Box<dyn SearchHandle>, NetworkError> {
        let created = self
            .authorized(self.http.post(self.url("searches")))
            .json(&SearchRequest { search_text: query })
            .send()
            .await?
            .error_for_status()?
            .json::<SearchCreated>()
            .await?;

        Ok(Box::new(SlskdSearch {
            client: self.clone(),
            id: created.id,
        }))
    }

    async fn download(
        &self,
        username: &str,
        remote_path: &str,
        destination: &Path,
    ) -> Result<Box<dyn TransferHandle>, NetworkError> {
        let size = self
            .sizes
            .lock()
            .await
            .get(&(username.to_string(), remote_path.to_string()))
            .copied()
            .unwrap_or(0);

        let path = format!(
            "transfers/downloads/{user}",
            user = urlencoding::encode(username)
        );
        self.authorized(self.http.post(self.url(&path)))
            .json(&[DownloadRequest {
                filename: remote_path,
                size,
            }])
            .send()
            .await?
            .error_for_status()?;

        Ok(Box::new(SlskdTransfer {
            client: self.clone(),
            username: username.to_string(),
            remote_path: remote_path.to_string(),
            destination: destination.to_path_buf(),
            transfer_id: Mutex::new(None),
            moved: Mutex::new(false),
        }))
    }
}

struct SlskdSearch {
    client: SlskdClient,
    id: String,
}

#[async_trait]
impl SearchHandle for SlskdSearch {
    async fn results(&self) -> Result<Vec<PeerResult>, NetworkError> {
        let path = format!("searches/{id}/responses", id = self.id);
        let responses = self
            .client
            .authorized(self.client.http.get(self.client.url(&path)))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SearchResponse>>()
            .await?;

        let mut sizes = self.client.sizes.lock().await;
        let results = responses
            .into_iter()
            .map(|response| {
                for file in &response.files {
                    if let Some(size) = file.size {
                        sizes.insert((response.username.clone(), file.filename.clone()), size);
                    }
                }

                PeerResult {
                    username: response.username,
                    avg_speed: response.upload_speed,
                    shared_files: response
                        .files
                        .into_iter()
                        .map(|f| SharedFile {
                            remote_path: f.filename,
                            size: f.size,
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(results)
    }
}

struct SlskdTransfer {
    client: SlskdClient,
    username: String,
    remote_path: String,
    destination: PathBuf,
    /// slskd's id of the transfer, known once it shows up in the queue.
    transfer_id: Mutex<Option<String>>,
    moved: Mutex<bool>,
}

impl SlskdTransfer {
    fn transfers_path(&self) -> String {
        format!(
            "transfers/downloads/{user}",
            user = urlencoding::encode(&self.username)
        )
    }

    async fn move_into_place(&self) -> Result<(), NetworkError> {
        let source = self.client.completed_path(&self.remote_path);
        if let Some(parent) = self.destination.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        if async_fs::rename(&source, &self.destination).await.is_err() {
            // Different filesystems; fall back to copy and delete.
            async_fs::copy(&source, &self.destination).await?;
            async_fs::remove_file(&source).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TransferHandle for SlskdTransfer {
    async fn state(&self) -> Result<TransferState, NetworkError> {
        let mut moved = self.moved.lock().await;
        if *moved {
            return Ok(TransferState::Completed);
        }

        let transfers = self
            .client
            .authorized(self.client.http.get(self.client.url(&self.transfers_path())))
            .send()
            .await?
            .error_for_status()?
            .json::<UserTransfers>()
            .await?;

        let Some(file) = transfers
            .directories
            .iter()
            .flat_map(|d| d.files.iter())
            .filter(|f| f.filename == self.remote_path)
            .last()
        else {
            return Ok(TransferState::Queued);
        };

        if file.id.is_some() {
            *self.transfer_id.lock().await = file.id.clone();
        }
        let state = parse_transfer_state(&file.state);

        if state == TransferState::Completed {
            self.move_into_place().await?;
            *moved = true;
        }

        Ok(state)
    }

    async fn cancel(&self) -> Result<(), NetworkError> {
        let Some(id) = self.transfer_id.lock().await.clone() else {
            return Ok(());
        };

        let path = format!("{base}/{id}?remove=true", base = self.transfers_path(), id = id);
        self.client
            .authorized(self.client.http.delete(self.client.url(&path)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
