//! Shared fixtures for daybook-core integration tests
//!
//! Provides an in-memory report backend with failure injection and helpers
//! for building records.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use daybook_core::{BackendError, Item, Record, ReportBackend};
use serde_json::{Map, Value};

/// In-memory stand-in for the report service
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<Record>>,
    next_id: Mutex<u32>,
    queued_failures: Mutex<VecDeque<BackendError>>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MemoryBackend {
    pub fn with_records(records: Vec<Record>) -> Self {
        let backend = Self::default();
        *lock(&backend.records) = records;
        backend
    }

    /// The next backend call of any kind fails with `err`
    pub fn fail_next(&self, err: BackendError) {
        lock(&self.queued_failures).push_back(err);
    }

    /// Delete behind the browser's back, as another client would
    pub fn remove_externally(&self, id: &str) {
        lock(&self.records).retain(|record| record.id_str() != Some(id));
    }

    /// Insert or overwrite a record behind the browser's back
    pub fn put_externally(&self, record: Record) {
        let mut records = lock(&self.records);
        records.retain(|stored| stored.id != record.id);
        records.push(record);
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn stored(&self, id: &str) -> Option<Record> {
        lock(&self.records)
            .iter()
            .find(|record| record.id_str() == Some(id))
            .cloned()
    }

    fn enter(&self, call: String) -> Result<(), BackendError> {
        lock(&self.calls).push(call);
        match lock(&self.queued_failures).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ReportBackend for MemoryBackend {
    async fn list_reports(&self, report_type: &str) -> Result<Vec<Record>, BackendError> {
        self.enter(format!("list {report_type}"))?;
        Ok(lock(&self.records)
            .iter()
            .filter(|record| record.report_type == report_type)
            .cloned()
            .collect())
    }

    async fn get_report(&self, id: &str) -> Result<Record, BackendError> {
        self.enter(format!("get {id}"))?;
        self.stored(id)
            .ok_or_else(|| BackendError::not_found(format!("no report {id}")))
    }

    async fn create_report(
        &self,
        report_type: &str,
        payload: &Map<String, Value>,
        _reporter: Option<&str>,
    ) -> Result<Option<Record>, BackendError> {
        self.enter(format!("create {report_type}"))?;
        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            format!("new-{next}")
        };
        let record = Record::new(Some(id), report_type, payload.clone());
        lock(&self.records).push(record.clone());
        Ok(Some(record))
    }

    async fn update_report(
        &self,
        id: &str,
        report_type: &str,
        payload: &Map<String, Value>,
    ) -> Result<Option<Record>, BackendError> {
        self.enter(format!("update {id}"))?;
        let mut records = lock(&self.records);
        let found = records
            .iter_mut()
            .find(|record| record.id_str() == Some(id));
        let Some(record) = found else {
            return Err(BackendError::not_found(format!("PUT /api/reports/{id} -> HTTP 404")));
        };
        record.report_type = report_type.to_string();
        record.payload = payload.clone();
        Ok(Some(record.clone()))
    }

    async fn delete_report(&self, id: &str) -> Result<(), BackendError> {
        self.enter(format!("delete {id}"))?;
        lock(&self.records).retain(|record| record.id_str() != Some(id));
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Object literal to line item
#[allow(dead_code)]
pub fn item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture item must be an object, got {other}"),
    }
}

/// Report with a `reportDate` payload field and the given line items
#[allow(dead_code)]
pub fn report(id: &str, report_date: &str, items: Vec<Value>) -> Record {
    let mut payload = Map::new();
    payload.insert("reportDate".into(), Value::String(report_date.to_string()));
    payload.insert("items".into(), Value::Array(items));
    Record::new(Some(id.to_string()), "receiving", payload)
}
