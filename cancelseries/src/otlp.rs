//! Log export passthrough.
//!
//! [`LogsExportService`] is the thin front end that hands every export
//! request to a [`LogsProcessor`] and returns its response unchanged.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single log record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity text (e.g. "INFO").
    #[serde(default)]
    pub severity_text: String,
    /// The log body.
    #[serde(default)]
    pub body: String,
}

/// Log records produced by one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLogs {
    /// Name of the emitting resource.
    pub resource_name: String,
    /// The records.
    #[serde(default)]
    pub records: Vec<LogRecord>,
}

/// A batch of logs to export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLogsRequest {
    /// Logs grouped by resource.
    #[serde(default)]
    pub resource_logs: Vec<ResourceLogs>,
}

/// Details of a partially accepted export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSuccess {
    /// Number of records that were rejected.
    pub rejected_log_records: u64,
    /// Why they were rejected.
    pub error_message: String,
}

/// Response to an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLogsResponse {
    /// Present when some records were rejected.
    pub partial_success: Option<PartialSuccess>,
}

/// Processes exported logs.
#[cfg_attr(test, mockall::automock)]
pub trait LogsProcessor: Send + Sync {
    /// Accepts a batch of logs.
    fn export(&self, request: ExportLogsRequest) -> ExportLogsResponse;
}

/// Forwards export requests to a processor.
#[derive(Debug)]
pub struct LogsExportService<P> {
    processor: P,
}

impl<P: LogsProcessor> LogsExportService<P> {
    /// Wraps a processor.
    #[must_use]
    pub fn new(processor: P) -> Self {
        Self { processor }
    }

    /// Exports a batch of logs.
    pub async fn export(&self, request: ExportLogsRequest) -> ExportLogsResponse {
        self.processor.export(request)
    }

    /// Returns the wrapped processor.
    #[must_use]
    pub fn processor(&self) -> &P {
        &self.processor
    }
}

/// An in-memory processor that keeps every accepted record.
#[derive(Debug, Default)]
pub struct OtlpLogsService {
    accepted: RwLock<Vec<(String, LogRecord)>>,
}

impl OtlpLogsService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accepted records with their resource names.
    #[must_use]
    pub fn accepted(&self) -> Vec<(String, LogRecord)> {
        self.accepted.read().clone()
    }
}

impl LogsProcessor for OtlpLogsService {
    fn export(&self, request: ExportLogsRequest) -> ExportLogsResponse {
        let mut rejected = 0_u64;
        let mut accepted = self.accepted.write();

        for resource in request.resource_logs {
            for record in resource.records {
                if record.body.is_empty() {
                    rejected += 1;
                } else {
                    accepted.push((resource.resource_name.clone(), record));
                }
            }
        }

        debug!(accepted = accepted.len(), rejected, "Exported logs");

        ExportLogsResponse {
            partial_success: (rejected > 0).then(|| PartialSuccess {
                rejected_log_records: rejected,
                error_message: "log records must have a body".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(bodies: &[&str]) -> ExportLogsRequest {
        ExportLogsRequest {
            resource_logs: vec![ResourceLogs {
                resource_name: "api".to_string(),
                records: bodies
                    .iter()
                    .map(|b| LogRecord {
                        severity_text: "INFO".to_string(),
                        body: (*b).to_string(),
                    })
                    .collect(),
            }],
        }
    }

    #[tokio::test]
    async fn test_service_forwards_to_processor() {
        let expected = ExportLogsResponse {
            partial_success: Some(PartialSuccess {
                rejected_log_records: 2,
                error_message: "nope".to_string(),
            }),
        };

        let mut processor = MockLogsProcessor::new();
        let response = expected.clone();
        processor
            .expect_export()
            .withf(|req| req.resource_logs.len() == 1)
            .times(1)
            .return_once(move |_| response);

        let service = LogsExportService::new(processor);
        let actual = service.export(request(&["a"])).await;

        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_in_memory_processor_rejects_empty_bodies() {
        let service = LogsExportService::new(OtlpLogsService::new());

        let response = service.export(request(&["started", "", "ready"])).await;

        assert_eq!(
            response.partial_success.map(|p| p.rejected_log_records),
            Some(1)
        );
        assert_eq!(service.processor().accepted().len(), 2);
    }

    #[tokio::test]
    async fn test_all_accepted_has_no_partial_success() {
        let service = LogsExportService::new(OtlpLogsService::new());
        let response = service.export(request(&["one"])).await;
        assert_eq!(response, ExportLogsResponse::default());
    }
}
