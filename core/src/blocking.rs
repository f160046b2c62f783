//! Blocking executor: performs the round-trip that `SoftaculousClient` leaves
//! to its caller.
//!
//! # Design
//! `Transport` is the only seam with I/O behind it. `UreqTransport` builds a
//! fresh `ureq` agent per request, so every call opens and closes its own
//! connection and nothing is shared between calls. `Softaculous::execute`
//! is the single place failures are logged: one `error!` event per failed
//! call carrying the verb and query string, while the caller receives one
//! `QueryError`.

use std::time::Duration;

use tracing::{debug, error};

use crate::client::SoftaculousClient;
use crate::config::ClientConfig;
use crate::error::QueryError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operation::{InstallOptions, Operation};
use crate::params::Params;
use crate::value::Value;

/// Default upper bound on a response body. Every body is decoded in memory
/// as one document.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Executes one `HttpRequest` and returns the response as data.
///
/// Implementations return non-2xx responses as `Ok`; status interpretation
/// belongs to `SoftaculousClient::parse_response`.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, QueryError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, QueryError> {
        (**self).send(request)
    }
}

/// `Transport` backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Option<Duration>,
    body_limit: u64,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            body_limit: MAX_BODY_BYTES,
        }
    }

    /// Reject response bodies longer than `bytes`.
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }

    fn agent(&self) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, QueryError> {
        let agent = self.agent();

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send_empty()
            }
        };
        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Malformed exchanges are protocol failures; everything else kept the
/// request from completing and counts as transport.
fn classify(err: ureq::Error) -> QueryError {
    match err {
        ureq::Error::Http(e) => QueryError::Protocol(e.to_string()),
        ureq::Error::Protocol(e) => QueryError::Protocol(e.to_string()),
        ureq::Error::BadUri(uri) => QueryError::Protocol(format!("bad uri: {uri}")),
        other => QueryError::Transport(other.to_string()),
    }
}

/// Softaculous API client performing real requests.
///
/// Every operation is one independent, synchronous request. Nothing is
/// cached and nothing is retried.
#[derive(Debug, Clone)]
pub struct Softaculous<T = UreqTransport> {
    client: SoftaculousClient,
    transport: T,
}

impl Softaculous<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Softaculous<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            client: SoftaculousClient::new(config),
            transport,
        }
    }

    pub fn client(&self) -> &SoftaculousClient {
        &self.client
    }

    /// Send `params` and decode the reply.
    ///
    /// An empty mapping is sent as GET (the default list view), anything else
    /// as POST. On failure exactly one error event is logged.
    pub fn execute(&self, params: &Params) -> Result<Value, QueryError> {
        let request = self.client.build_request(params);
        debug!(method = %request.method, "querying Softaculous API");

        let result = self
            .transport
            .send(&request)
            .and_then(|response| self.client.parse_response(response));

        if let Err(err) = &result {
            error!(
                method = %request.method,
                query = %request.query,
                kind = %err.kind(),
                error = %err,
                "Softaculous API query failed"
            );
        }
        result
    }

    pub fn run(&self, operation: &Operation) -> Result<Value, QueryError> {
        self.execute(&operation.params())
    }

    /// Scripts available for installation (`iscripts`).
    pub fn list_scripts(&self) -> Result<Value, QueryError> {
        self.run(&Operation::ListScripts)
    }

    /// Install script `script_id` with free-form settings such as
    /// `softdomain`, `softdirectory`, `admin_username`, `admin_pass`.
    pub fn install_script(&self, script_id: &str, options: InstallOptions) -> Result<Value, QueryError> {
        self.run(&Operation::InstallScript {
            script_id: script_id.to_string(),
            options,
        })
    }

    pub fn upgrade_script(&self, installation_id: &str) -> Result<Value, QueryError> {
        self.run(&Operation::UpgradeScript {
            installation_id: installation_id.to_string(),
        })
    }

    pub fn remove_script(&self, installation_id: &str) -> Result<Value, QueryError> {
        self.run(&Operation::RemoveScript {
            installation_id: installation_id.to_string(),
        })
    }

    /// Register an installation made outside Softaculous.
    pub fn import_installation(&self, script_id: &str) -> Result<Value, QueryError> {
        self.run(&Operation::ImportInstallation {
            script_id: script_id.to_string(),
        })
    }

    /// Installed scripts; with `updates_only` the panel lists only
    /// installations that have an upgrade available.
    pub fn list_installed_scripts(&self, updates_only: bool) -> Result<Value, QueryError> {
        self.run(&Operation::ListInstalledScripts { updates_only })
    }

    pub fn list_backups(&self) -> Result<Value, QueryError> {
        self.run(&Operation::ListBackups)
    }

    pub fn backup_installed_script(&self, installation_id: &str) -> Result<Value, QueryError> {
        self.run(&Operation::BackupInstalledScript {
            installation_id: installation_id.to_string(),
        })
    }

    pub fn restore_installed_script(&self, backup_filename: &str) -> Result<Value, QueryError> {
        self.run(&Operation::RestoreInstalledScript {
            backup_filename: backup_filename.to_string(),
        })
    }

    pub fn download_backups(&self, backup_filename: &str) -> Result<Value, QueryError> {
        self.run(&Operation::DownloadBackups {
            backup_filename: backup_filename.to_string(),
        })
    }

    pub fn delete_backup(&self, backup_filename: &str) -> Result<Value, QueryError> {
        self.run(&Operation::DeleteBackup {
            backup_filename: backup_filename.to_string(),
        })
    }
}
