//! HTTP access to the report service.
//!
//! [`ResilientReportClient`] implements [`daybook_core::ReportBackend`] by
//! trying each operation's configured request shapes in order until the
//! deployment answers one of them.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod plan;
pub mod transport;

pub use client::ResilientReportClient;
pub use config::ClientConfig;
pub use envelope::{unwrap_list, unwrap_single, ListEnvelope};
pub use error::{ClientError, TransportError};
pub use plan::{Attempt, EndpointPlans, Method};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
