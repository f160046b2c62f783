//! Synchronous client for the Softaculous control-panel API.
//!
//! # Overview
//! Softaculous is the script installer shipped with cPanel. Its API is a
//! single endpoint selected by the `act` query parameter, authenticated with
//! HTTP Basic auth, answering in PHP `serialize()` format (or JSON).
//!
//! # Design
//! - `SoftaculousClient` builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network (host-does-IO).
//! - `Softaculous` pairs it with a `Transport` (by default `ureq`) and
//!   exposes one method per named operation. Each call is one independent
//!   request; failures come back as a single `QueryError` and are logged
//!   with the verb and query string.
//! - Responses are returned as a generic `Value`; no schema is imposed.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod params;
pub mod unserialize;
pub mod value;

pub use blocking::{Softaculous, Transport, UreqTransport, MAX_BODY_BYTES};
pub use client::SoftaculousClient;
pub use config::{ClientConfig, ResponseFormat, Scheme, DEFAULT_PORT, ENDPOINT_PATH};
pub use error::{ConfigError, QueryError, QueryErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{InstallOptions, Operation};
pub use params::{ParamValue, Params};
pub use value::{Key, Value};
