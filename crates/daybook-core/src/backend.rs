//! Persistence seam between the browsing logic and whatever serves reports.

use serde_json::{Map, Value};

use crate::error::BackendError;
use crate::record::Record;

/// Logical report operations. Implementations decide how each maps onto
/// concrete requests.
///
/// Futures are awaited on the caller's task; no `Send` bound is required.
#[allow(async_fn_in_trait)]
pub trait ReportBackend {
    async fn list_reports(&self, report_type: &str) -> Result<Vec<Record>, BackendError>;

    async fn get_report(&self, id: &str) -> Result<Record, BackendError>;

    /// Returns the created record when the server echoes one back.
    async fn create_report(
        &self,
        report_type: &str,
        payload: &Map<String, Value>,
        reporter: Option<&str>,
    ) -> Result<Option<Record>, BackendError>;

    /// A missing record is a [`crate::error::BackendErrorKind::NotFound`]
    /// failure, never a silent success.
    async fn update_report(
        &self,
        id: &str,
        report_type: &str,
        payload: &Map<String, Value>,
    ) -> Result<Option<Record>, BackendError>;

    async fn delete_report(&self, id: &str) -> Result<(), BackendError>;
}
