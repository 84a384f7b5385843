// API client module: a small blocking HTTP client that talks to the
// backup server's baclient REST API. Requests go through the `Transport`
// trait so the client logic can be exercised against a scripted
// transport in tests; `HttpTransport` is the real reqwest-backed one.

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::decode;

/// Backup category tag sent with every job submission. The server uses
/// it to route the job; this client never interprets it.
pub const BACKUP_TYPE: &str = "ceph_downloads";

const SESSION_HEADER: &str = "X-Session-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request as seen by the transport: method, path relative to the
/// server base URL, optional session token header, optional JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub session_id: Option<String>,
    pub body: Option<String>,
}

/// What came back: HTTP status plus the raw body text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// A connection-level failure: DNS, TCP, TLS, or reading the body.
/// Carries no HTTP status because none was obtained.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

/// The seam between the client logic and the network.
pub trait Transport {
    fn execute(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Errors from individual API operations. Transport errors during
/// polling are retried by the caller; everything else aborts the run.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("sign-on failed: {detail}")]
    Auth { status: Option<u16>, detail: String },

    #[error("backup start failed: {detail}")]
    Submit { status: Option<u16>, detail: String },
}

/// Real transport: one reqwest blocking client owned for the process
/// lifetime. Each call's connection, headers and response buffer are
/// scoped to that call and dropped before it returns, error paths
/// included.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Build the production client for a server base URL. This is what
/// `main` constructs once and owns for the process lifetime.
pub fn build_client(base_url: &str) -> anyhow::Result<ApiClient<HttpTransport>> {
    let transport = HttpTransport::new(base_url).context("Failed to build HTTP client")?;
    Ok(ApiClient::new(transport))
}

impl Transport for HttpTransport {
    fn execute(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = match req.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.header(ACCEPT, "application/json");
        if let Some(body) = &req.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        if let Some(session_id) = &req.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }

        let res = builder.send().map_err(|e| TransportError(e.to_string()))?;
        let status = res.status().as_u16();
        let body = res.text().map_err(|e| TransportError(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

/// Result of a successful sign-on. The session id is the credential for
/// all later calls; the task id is informational and may be absent.
#[derive(Debug)]
pub struct SignOn {
    pub session_id: String,
    pub task_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignOnRequest<'a> {
    node_id: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupRequest<'a> {
    session_id: &'a str,
    backup_name: &'a str,
    backup_type: &'a str,
    backup_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_list: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignOffRequest<'a> {
    session_id: &'a str,
}

/// The API client proper. Generic over the transport so tests can
/// substitute a scripted one.
pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        ApiClient { transport }
    }

    /// Sign on with the node credentials. Any 200/201 response that
    /// carries a `sessionId` field is a success. Everything else
    /// (transport failure, other status, or a 2xx without the field)
    /// is an `Auth` error. A `taskId` alone never counts: the session
    /// id is the load-bearing credential.
    pub fn sign_on(&self, node_id: &str, password: &str) -> Result<SignOn, ClientError> {
        let payload = SignOnRequest { node_id, password };
        let res = self.transport.execute(&ApiRequest {
            method: Method::Post,
            path: "/api/baclient/signon".into(),
            session_id: None,
            body: Some(to_json(&payload)),
        })?;

        if res.status != 200 && res.status != 201 {
            return Err(ClientError::Auth {
                status: Some(res.status),
                detail: format!("HTTP {} - {}", res.status, excerpt(&res.body)),
            });
        }

        let session_id = match decode::extract(&res.body, "sessionId") {
            Ok(Some(id)) => id,
            Ok(None) | Err(_) => {
                return Err(ClientError::Auth {
                    status: Some(res.status),
                    detail: format!(
                        "HTTP {} - no sessionId in response: {}",
                        res.status,
                        excerpt(&res.body)
                    ),
                })
            }
        };
        let task_id = decode::extract(&res.body, "taskId").ok().flatten();

        Ok(SignOn { session_id, task_id })
    }

    /// Submit a backup job. An empty manifest omits `fileList` from the
    /// payload entirely, which the server reads as "back up the whole
    /// directory". The payload goes into a growable buffer, so manifest
    /// size is unbounded on the client side.
    pub fn start_backup(
        &self,
        session_id: &str,
        backup_path: &str,
        backup_name: &str,
        manifest: &[PathBuf],
    ) -> Result<String, ClientError> {
        let file_list = if manifest.is_empty() {
            None
        } else {
            Some(
                manifest
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            )
        };
        let payload = BackupRequest {
            session_id,
            backup_name,
            backup_type: BACKUP_TYPE,
            backup_path,
            file_list,
        };
        let res = self.transport.execute(&ApiRequest {
            method: Method::Post,
            path: "/api/baclient/backup".into(),
            session_id: None,
            body: Some(to_json(&payload)),
        })?;

        if res.status != 200 && res.status != 201 && res.status != 202 {
            return Err(ClientError::Submit {
                status: Some(res.status),
                detail: format!("HTTP {} - {}", res.status, excerpt(&res.body)),
            });
        }

        match decode::extract(&res.body, "taskId") {
            Ok(Some(id)) => Ok(id),
            Ok(None) | Err(_) => Err(ClientError::Submit {
                status: Some(res.status),
                detail: format!(
                    "HTTP {} - no taskId in response: {}",
                    res.status,
                    excerpt(&res.body)
                ),
            }),
        }
    }

    /// Query the current task state. `Ok(None)` means the response had
    /// no usable `taskState` field this round; the poller treats that
    /// the same as a transient failure and keeps going.
    pub fn task_status(
        &self,
        session_id: &str,
        task_id: &str,
    ) -> Result<Option<String>, ClientError> {
        let res = self.transport.execute(&ApiRequest {
            method: Method::Get,
            path: format!("/api/baclient/task/{}/status", task_id),
            session_id: Some(session_id.to_string()),
            body: None,
        })?;
        Ok(decode::extract(&res.body, "taskState").ok().flatten())
    }

    /// Fetch the task detail body for the result reporter. The caller
    /// extracts individual statistics fields; any of them may be
    /// missing.
    pub fn task_detail(&self, session_id: &str, task_id: &str) -> Result<String, ClientError> {
        let res = self.transport.execute(&ApiRequest {
            method: Method::Get,
            path: format!("/api/baclient/task/{}", task_id),
            session_id: Some(session_id.to_string()),
            body: None,
        })?;
        Ok(res.body)
    }

    /// Best-effort session teardown. Issued on every exit path once a
    /// session was opened; a failure is logged and swallowed.
    pub fn sign_off(&self, session_id: &str) {
        let payload = SignOffRequest { session_id };
        let result = self.transport.execute(&ApiRequest {
            method: Method::Post,
            path: "/api/baclient/signoff".into(),
            session_id: None,
            body: Some(to_json(&payload)),
        });
        if let Err(e) = result {
            eprintln!("Warning: sign-off failed: {}", e);
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}

// Serialization of these payload structs cannot fail; they contain only
// strings.
fn to_json<S: Serialize>(payload: &S) -> String {
    serde_json::to_string(payload).expect("request payload serializes")
}

/// First part of a response body, for error diagnostics.
fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}
