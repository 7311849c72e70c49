//! Report client that tolerates an ambiguous REST surface.
//!
//! Each logical operation walks its configured [`Attempt`]s strictly in
//! order. The first 2xx wins and later shapes are never sent; when every
//! shape fails, the last failure is surfaced together with a summary of the
//! earlier ones.

use daybook_core::{BackendError, ParseError, Record, ReportBackend};
use serde_json::{json, Map, Value};

use crate::config::ClientConfig;
use crate::envelope::{unwrap_list, unwrap_single};
use crate::error::ClientError;
use crate::plan::Attempt;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub struct ResilientReportClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
}

impl ResilientReportClient<ReqwestTransport> {
    /// Create a client over HTTP with the configured timeout
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidBaseUrl`] for an unusable base URL.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ResilientReportClient<T> {
    /// # Errors
    /// Returns [`ClientError::InvalidBaseUrl`] for an unusable base URL.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All reports of one type. Unrecognized bodies yield an empty list.
    ///
    /// # Errors
    /// Fails only when every list shape failed.
    pub async fn list(&self, report_type: &str) -> Result<Vec<Record>, ClientError> {
        let vars = [("type", report_type)];
        let response = self.run("list", &self.config.plans.list, &vars, None).await?;
        let records = unwrap_list(&response.body);
        tracing::debug!(report_type, count = records.len(), "reports listed");
        Ok(records)
    }

    /// # Errors
    /// Every get shape failed, or the accepted response held no record.
    pub async fn get(&self, id: &str) -> Result<Record, ClientError> {
        let vars = [("id", id)];
        let response = self.run("get", &self.config.plans.get, &vars, None).await?;
        unwrap_single(&response.body)?
            .ok_or_else(|| ParseError::EmptyBody(format!("report {id}")).into())
    }

    /// Sends `{ type, payload, reporter? }`. An unreadable echo is not an
    /// error: the write was accepted.
    ///
    /// # Errors
    /// Every create shape failed.
    pub async fn create(
        &self,
        report_type: &str,
        payload: &Map<String, Value>,
        reporter: Option<&str>,
    ) -> Result<Option<Record>, ClientError> {
        let mut body = json!({ "type": report_type, "payload": payload });
        if let (Some(reporter), Some(object)) = (reporter, body.as_object_mut()) {
            object.insert("reporter".to_string(), json!(reporter));
        }
        let vars = [("type", report_type)];
        let response = self
            .run("create", &self.config.plans.create, &vars, Some(&body))
            .await?;
        tracing::info!(report_type, "report created");
        Ok(echoed(&response))
    }

    /// Sends `{ type, payload }` as a full replacement.
    ///
    /// # Errors
    /// Every update shape failed; a final 404 means the report is gone.
    pub async fn update(
        &self,
        id: &str,
        report_type: &str,
        payload: &Map<String, Value>,
    ) -> Result<Option<Record>, ClientError> {
        let body = json!({ "type": report_type, "payload": payload });
        let vars = [("id", id), ("type", report_type)];
        let response = self
            .run("update", &self.config.plans.update, &vars, Some(&body))
            .await?;
        tracing::info!(record_id = id, "report updated");
        Ok(echoed(&response))
    }

    /// # Errors
    /// Every delete shape failed, except a final 404 when configured to
    /// treat that as already deleted.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let vars = [("id", id)];
        match self.run("delete", &self.config.plans.delete, &vars, None).await {
            Ok(_) => {
                tracing::info!(record_id = id, "report deleted");
                Ok(())
            }
            Err(err) if self.config.treat_delete_not_found_as_success && err.is_not_found() => {
                tracing::info!(record_id = id, "report already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn run(
        &self,
        operation: &'static str,
        attempts: &[Attempt],
        vars: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<HttpResponse, ClientError> {
        let mut failures: Vec<ClientError> = Vec::new();

        for (index, attempt) in attempts.iter().enumerate() {
            let url = self.config.endpoint(&attempt.render(vars));
            tracing::debug!(
                operation,
                attempt = index + 1,
                method = %attempt.method,
                url = %url,
                "sending request"
            );

            let request = HttpRequest {
                method: attempt.method,
                url: url.clone(),
                body: body.cloned(),
            };
            let failure = match self.transport.send(request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => ClientError::Status {
                    method: attempt.method,
                    url,
                    status: response.status,
                },
                Err(source) => ClientError::Transport {
                    method: attempt.method,
                    url,
                    source,
                },
            };
            tracing::warn!(
                operation,
                attempt = index + 1,
                error = %failure,
                "request shape failed"
            );
            failures.push(failure);
        }

        let Some(last) = failures.pop() else {
            return Err(ClientError::NoAttempts(operation));
        };
        let summary = failures
            .iter()
            .chain(std::iter::once(&last))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ClientError::Exhausted {
            operation,
            attempts: failures.len() + 1,
            summary,
            last: Box::new(last),
        })
    }
}

fn echoed(response: &HttpResponse) -> Option<Record> {
    match unwrap_single(&response.body) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable write response");
            None
        }
    }
}

impl<T: Transport> ReportBackend for ResilientReportClient<T> {
    async fn list_reports(&self, report_type: &str) -> Result<Vec<Record>, BackendError> {
        self.list(report_type).await.map_err(BackendError::from)
    }

    async fn get_report(&self, id: &str) -> Result<Record, BackendError> {
        self.get(id).await.map_err(BackendError::from)
    }

    async fn create_report(
        &self,
        report_type: &str,
        payload: &Map<String, Value>,
        reporter: Option<&str>,
    ) -> Result<Option<Record>, BackendError> {
        self.create(report_type, payload, reporter)
            .await
            .map_err(BackendError::from)
    }

    async fn update_report(
        &self,
        id: &str,
        report_type: &str,
        payload: &Map<String, Value>,
    ) -> Result<Option<Record>, BackendError> {
        self.update(id, report_type, payload)
            .await
            .map_err(BackendError::from)
    }

    async fn delete_report(&self, id: &str) -> Result<(), BackendError> {
        self.delete(id).await.map_err(BackendError::from)
    }
}
