//! Stateless HTTP request builder and response parser for the Softaculous API.
//!
//! # Design
//! `SoftaculousClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. `build_request` turns a parameter mapping into an
//! `HttpRequest`; `parse_response` turns an `HttpResponse` into a `Value`.
//! The caller (normally `Softaculous`) executes the round-trip in between,
//! which keeps this half deterministic and free of I/O.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::{ClientConfig, ResponseFormat};
use crate::error::QueryError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::params::Params;
use crate::unserialize;
use crate::value::Value;

/// Characters of a failed response's body kept in `QueryError::Status`.
const STATUS_BODY_CHARS: usize = 256;

/// Synchronous, stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct SoftaculousClient {
    config: ClientConfig,
}

impl SoftaculousClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `Basic ` followed by base64 of `username:password`.
    pub fn authorization(&self) -> String {
        let credential = format!("{}:{}", self.config.username(), self.config.password());
        format!("Basic {}", STANDARD.encode(credential))
    }

    /// Build the request for a raw parameter mapping.
    ///
    /// An empty mapping is sent as GET, anything else as POST. Parameters
    /// always travel in the query string and the request has no body.
    pub fn build_request(&self, params: &Params) -> HttpRequest {
        let method = if params.is_empty() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        };
        let query = params.to_query(self.config.format());
        HttpRequest {
            method,
            url: format!("{}?{}", self.config.endpoint_url(), query),
            query,
            headers: vec![("authorization".to_string(), self.authorization())],
        }
    }

    pub fn build(&self, operation: &Operation) -> HttpRequest {
        self.build_request(&operation.params())
    }

    /// Decode a response in the configured format.
    ///
    /// No schema is applied: any well-formed document is returned as-is,
    /// including documents the panel uses to report its own errors.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, QueryError> {
        check_status(&response)?;
        match self.config.format() {
            ResponseFormat::Serialize => unserialize::from_bytes(&response.body)
                .map_err(|e| QueryError::Deserialize(e.to_string())),
            ResponseFormat::Json => serde_json::from_slice(&response.body)
                .map_err(|e| QueryError::Deserialize(e.to_string())),
        }
    }
}

/// Map non-success status codes to `QueryError::Status`.
fn check_status(response: &HttpResponse) -> Result<(), QueryError> {
    if response.is_success() {
        return Ok(());
    }
    Err(QueryError::Status {
        status: response.status,
        body: body_prefix(&response.body),
    })
}

fn body_prefix(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(STATUS_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use crate::operation::InstallOptions;

    const ENDPOINT: &str = "https://panel.example.com:2083/frontend/x3/softaculous/index.live.php";

    fn client() -> SoftaculousClient {
        SoftaculousClient::new(ClientConfig::new("panel.example.com", "admin", "secret"))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn authorization_is_basic_base64_of_credentials() {
        assert_eq!(client().authorization(), "Basic YWRtaW46c2VjcmV0");
    }

    #[test]
    fn empty_params_build_a_get() {
        let req = client().build(&Operation::ListScripts);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{ENDPOINT}?api=serialize"));
        assert_eq!(req.query, "api=serialize");
        assert_eq!(req.header("Authorization"), Some("Basic YWRtaW46c2VjcmV0"));
    }

    #[test]
    fn install_script_builds_a_post() {
        let req = client().build(&Operation::InstallScript {
            script_id: "77".to_string(),
            options: InstallOptions::new(),
        });
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{ENDPOINT}?act=software&api=serialize&soft=77"));
    }

    #[test]
    fn exactly_one_authorization_header() {
        let req = client().build(&Operation::ListBackups);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers[0].0, "authorization");
    }

    #[test]
    fn credentials_never_reach_the_query() {
        let req = client().build(&Operation::UpgradeScript {
            installation_id: "26_1".to_string(),
        });
        assert!(!req.url.contains("admin"));
        assert!(!req.url.contains("secret"));
        assert!(!req.url.contains("YWRtaW46c2VjcmV0"));
    }

    #[test]
    fn json_format_changes_the_api_indicator() {
        let client = SoftaculousClient::new(
            ClientConfig::new("panel.example.com", "admin", "secret").with_format(ResponseFormat::Json),
        );
        let req = client.build(&Operation::ListBackups);
        assert_eq!(req.query, "act=backups&api=json");
    }

    #[test]
    fn parse_serialized_response() {
        let body = r#"a:2:{s:10:"time_taken";d:0.5;s:8:"iscripts";a:1:{i:1;a:1:{s:4:"name";s:9:"WordPress";}}}"#;
        let value = client().parse_response(response(200, body)).unwrap();
        assert_eq!(value.get("time_taken"), Some(&Value::Float(0.5)));
        assert_eq!(
            value.get("iscripts").and_then(|s| s.get("1")).and_then(|s| s.get("name")),
            Some(&Value::from("WordPress"))
        );
    }

    #[test]
    fn parse_json_response() {
        let client = SoftaculousClient::new(
            ClientConfig::new("h", "u", "p").with_format(ResponseFormat::Json),
        );
        let value = client
            .parse_response(response(200, r#"{"done":true,"insid":"26_1"}"#))
            .unwrap();
        assert_eq!(value.get("done"), Some(&Value::Bool(true)));
        assert_eq!(value.get("insid").and_then(Value::as_str), Some("26_1"));
    }

    #[test]
    fn panel_error_documents_are_returned_untouched() {
        let body = r#"a:1:{s:5:"error";a:1:{i:0;s:14:"Invalid script";}}"#;
        let value = client().parse_response(response(200, body)).unwrap();
        assert_eq!(
            value.get("error").and_then(|e| e.index(0)).and_then(Value::as_str),
            Some("Invalid script")
        );
    }

    #[test]
    fn parse_malformed_body() {
        let err = client()
            .parse_response(response(200, "<html>Login</html>"))
            .unwrap_err();
        assert!(matches!(err, QueryError::Deserialize(_)));
        assert_eq!(err.kind(), QueryErrorKind::Deserialize);
    }

    #[test]
    fn parse_unauthorized_status() {
        let err = client()
            .parse_response(response(401, "Unauthorized"))
            .unwrap_err();
        assert!(matches!(err, QueryError::Status { status: 401, .. }));
        assert_eq!(err.kind(), QueryErrorKind::Protocol);
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn status_error_keeps_only_a_prefix_of_the_body() {
        let page = format!("<html>{}</html>", "\u{e9}".repeat(10_000));
        let err = client().parse_response(response(500, &page)).unwrap_err();
        let (status, body) = match err {
            QueryError::Status { status, body } => (status, body),
            other => panic!("expected a status error, got {other:?}"),
        };
        assert_eq!(status, 500);
        assert_eq!(body.chars().count(), STATUS_BODY_CHARS + 3);
        assert!(body.starts_with("<html>\u{e9}"));
        assert!(body.ends_with("..."));
    }

    #[test]
    fn php_lists_decode_like_json_arrays() {
        let json = SoftaculousClient::new(
            ClientConfig::new("h", "u", "p").with_format(ResponseFormat::Json),
        );
        let from_php = client()
            .parse_response(response(200, r#"a:1:{s:5:"error";a:1:{i:0;s:3:"bad";}}"#))
            .unwrap();
        let from_json = json.parse_response(response(200, r#"{"error":["bad"]}"#)).unwrap();
        assert_eq!(from_php, from_json);
        assert_eq!(from_php.get("error"), Some(&Value::List(vec![Value::from("bad")])));
    }
}
