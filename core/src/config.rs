//! Connection settings for one Softaculous panel.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// cPanel's HTTPS port, where the Softaculous frontend is served.
pub const DEFAULT_PORT: u16 = 2083;

/// Path of the Softaculous API entry point under the cPanel frontend.
pub const ENDPOINT_PATH: &str = "/frontend/x3/softaculous/index.live.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Wire format requested through the `api` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// PHP `serialize()` output.
    #[default]
    Serialize,
    Json,
}

impl ResponseFormat {
    /// Value sent as `api=<value>`.
    pub fn api_value(&self) -> &'static str {
        match self {
            ResponseFormat::Serialize => "serialize",
            ResponseFormat::Json => "json",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serialize" | "php" => Ok(ResponseFormat::Serialize),
            "json" => Ok(ResponseFormat::Json),
            _ => Err(ConfigError::Invalid {
                name: "SOFTACULOUS_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// Immutable client configuration.
///
/// `new` stores host and credentials verbatim without validation. The
/// `with_*` setters consume and return the value, so a config is complete
/// before a client takes ownership of it.
#[derive(Clone)]
pub struct ClientConfig {
    host: String,
    username: String,
    password: String,
    port: u16,
    scheme: Scheme,
    format: ResponseFormat,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            port: DEFAULT_PORT,
            scheme: Scheme::Https,
            format: ResponseFormat::Serialize,
            timeout: None,
        }
    }

    /// Read `SOFTACULOUS_HOST`, `SOFTACULOUS_USERNAME`, `SOFTACULOUS_PASSWORD`
    /// and the optional `SOFTACULOUS_PORT` / `SOFTACULOUS_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let mut config = Self::new(
            &required("SOFTACULOUS_HOST")?,
            &required("SOFTACULOUS_USERNAME")?,
            &required("SOFTACULOUS_PASSWORD")?,
        );

        if let Some(port) = lookup("SOFTACULOUS_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                name: "SOFTACULOUS_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(format) = lookup("SOFTACULOUS_FORMAT") {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Overall per-request timeout. Unset means the transport default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Absolute URL of the API entry point, without a query string.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme.as_str(),
            self.host,
            self.port,
            ENDPOINT_PATH
        )
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("format", &self.format)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_target_cpanel_https_port() {
        let config = ClientConfig::new("panel.example.com", "admin", "secret");
        assert_eq!(config.port(), 2083);
        assert_eq!(config.scheme(), Scheme::Https);
        assert_eq!(config.format(), ResponseFormat::Serialize);
        assert!(config.timeout().is_none());
        assert_eq!(
            config.endpoint_url(),
            "https://panel.example.com:2083/frontend/x3/softaculous/index.live.php"
        );
    }

    #[test]
    fn inputs_are_stored_verbatim() {
        let config = ClientConfig::new(" odd host ", "", "p@ss:word");
        assert_eq!(config.host(), " odd host ");
        assert_eq!(config.username(), "");
        assert_eq!(config.password(), "p@ss:word");
    }

    #[test]
    fn setters_override_defaults() {
        let config = ClientConfig::new("127.0.0.1", "a", "b")
            .with_port(3000)
            .with_scheme(Scheme::Http)
            .with_format(ResponseFormat::Json)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(
            config.endpoint_url(),
            "http://127.0.0.1:3000/frontend/x3/softaculous/index.live.php"
        );
        assert_eq!(config.format(), ResponseFormat::Json);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = ClientConfig::new("h", "admin", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn from_lookup_reads_required_and_optional_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SOFTACULOUS_HOST", "panel.example.com"),
            ("SOFTACULOUS_USERNAME", "admin"),
            ("SOFTACULOUS_PASSWORD", "secret"),
            ("SOFTACULOUS_PORT", "2087"),
            ("SOFTACULOUS_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.host(), "panel.example.com");
        assert_eq!(config.port(), 2087);
        assert_eq!(config.format(), ResponseFormat::Json);
    }

    #[test]
    fn from_lookup_reports_missing_variable() {
        let err = ClientConfig::from_lookup(lookup(&[("SOFTACULOUS_HOST", "h")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SOFTACULOUS_USERNAME")));
    }

    #[test]
    fn from_lookup_rejects_bad_port() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("SOFTACULOUS_HOST", "h"),
            ("SOFTACULOUS_USERNAME", "u"),
            ("SOFTACULOUS_PASSWORD", "p"),
            ("SOFTACULOUS_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SOFTACULOUS_PORT", .. }));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("serialize".parse::<ResponseFormat>().unwrap(), ResponseFormat::Serialize);
        assert_eq!("php".parse::<ResponseFormat>().unwrap(), ResponseFormat::Serialize);
        assert!("xml".parse::<ResponseFormat>().is_err());
    }
}
