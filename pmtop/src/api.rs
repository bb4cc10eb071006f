//! Typed client for the daemon's request/response surface. Every request
//! carries the auth token from the active profile; the token only changes
//! through an explicit [`DaemonClient::set_token`].

use std::future::Future;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::{ActionError, FetchError};
use crate::logs::{LogChannel, LogSource};
use crate::stream::StreamTarget;
use crate::types::{Action, ActionBody, DaemonMetrics, LogResponse, ProcessItem};

#[derive(Debug, Clone)]
pub struct DaemonClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl DaemonClient {
    pub fn new(base: &str, token: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Explicit token refresh; nothing else ever touches the credential.
    pub fn set_token(&mut self, token: Option<&str>) {
        self.token = token.map(str::to_string);
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{path}", self.base));
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("token {token}"));
        }
        req
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let resp = self.request(Method::GET, path).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    /// All managed processes, local or on one remote.
    pub async fn list_processes(
        &self,
        server: Option<&str>,
    ) -> Result<Vec<ProcessItem>, FetchError> {
        match server {
            Some(name) => self.get_json(&format!("/remote/{name}/list")).await,
            None => self.get_json("/list").await,
        }
    }

    /// Names of the remote servers configured on the daemon.
    pub async fn list_servers(&self) -> Result<Vec<String>, FetchError> {
        self.get_json("/daemon/servers").await
    }

    /// One-shot daemon metrics snapshot, local or for one remote.
    pub async fn daemon_metrics(&self, server: Option<&str>) -> Result<DaemonMetrics, FetchError> {
        match server {
            Some(name) => self.get_json(&format!("/remote/{name}/metrics")).await,
            None => self.get_json("/daemon/metrics").await,
        }
    }

    /// Full log snapshot for one channel of one process.
    pub async fn logs(
        &self,
        server: Option<&str>,
        id: u64,
        channel: LogChannel,
    ) -> Result<Vec<String>, FetchError> {
        let path = match server {
            Some(name) => format!("/remote/{name}/logs/{id}/{}", channel.as_str()),
            None => format!("/process/{id}/logs/{}", channel.as_str()),
        };
        let resp: LogResponse = self.get_json(&path).await?;
        Ok(resp.logs)
    }

    /// Issue one lifecycle action. A failure is surfaced as-is; the caller
    /// retries manually, nothing is re-sent automatically.
    pub async fn action(
        &self,
        server: Option<&str>,
        id: u64,
        action: &Action,
    ) -> Result<(), ActionError> {
        let req = match action {
            // Rename carries the new name as the body of its own endpoint
            Action::Rename(new_name) => {
                let path = match server {
                    Some(name) => format!("/remote/{name}/rename/{id}"),
                    None => format!("/process/{id}/rename"),
                };
                self.request(Method::POST, &path).body(new_name.clone())
            }
            other => {
                let path = match server {
                    Some(name) => format!("/remote/{name}/action/{id}"),
                    None => format!("/process/{id}/action"),
                };
                self.request(Method::POST, &path).json(&ActionBody {
                    method: other.method().to_string(),
                })
            }
        };
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ActionError::Refused(resp.status()));
        }
        Ok(())
    }

    /// Target for the per-process live metrics stream.
    pub fn process_stream_target(&self, server: Option<&str>, id: u64) -> StreamTarget {
        let server = server.unwrap_or("local");
        StreamTarget {
            url: format!("{}/live/process/{server}/{id}", self.ws_base()),
            headers: self.auth_headers(),
        }
    }

    /// Target for the daemon-wide live metrics stream.
    pub fn daemon_stream_target(&self, server: Option<&str>) -> StreamTarget {
        let server = server.unwrap_or("local");
        StreamTarget {
            url: format!("{}/live/daemon/{server}/metrics", self.ws_base()),
            headers: self.auth_headers(),
        }
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) => vec![("Authorization".to_string(), format!("token {token}"))],
            None => Vec::new(),
        }
    }

    // http(s) base -> ws(s); ws urls pass through untouched
    fn ws_base(&self) -> String {
        if let Some(rest) = self.base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base.clone()
        }
    }
}

/// [`LogSource`] over the daemon's log endpoints, pinned to one process.
#[derive(Debug, Clone)]
pub struct ProcessLogSource {
    client: DaemonClient,
    server: Option<String>,
    id: u64,
}

impl ProcessLogSource {
    pub fn new(client: DaemonClient, server: Option<String>, id: u64) -> Self {
        Self { client, server, id }
    }
}

impl LogSource for ProcessLogSource {
    fn fetch(
        &self,
        channel: LogChannel,
    ) -> impl Future<Output = Result<Vec<String>, FetchError>> + Send {
        self.client.logs(self.server.as_deref(), self.id, channel)
    }
}
