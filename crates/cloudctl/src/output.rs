//! Command output
//!
//! Records go to stdout as one JSON document per line. Errors that do not stop
//! the command go to stderr as error records and are counted, so the process
//! can exit with "completed with errors".

use cloudcontrol_core::{Error, ErrorCategory, Result};
use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

/// Structured description of a failure, written to stderr
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error_id: String,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl From<&Error> for ErrorRecord {
    fn from(err: &Error) -> Self {
        Self {
            error_id: err.error_id(),
            category: err.category(),
            message: err.to_string(),
            target: err.target(),
        }
    }
}

pub struct Output {
    records: Box<dyn Write + Send>,
    errors: Box<dyn Write + Send>,
    error_count: usize,
}

impl Output {
    /// Output bound to the process's stdout and stderr
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn new(records: Box<dyn Write + Send>, errors: Box<dyn Write + Send>) -> Self {
        Self {
            records,
            errors,
            error_count: 0,
        }
    }

    /// Write one record
    pub fn record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.records, record)?;
        self.records.write_all(b"\n")?;
        self.records.flush()?;
        Ok(())
    }

    /// Write each item as its own record
    pub fn records<T: Serialize>(&mut self, records: &[T]) -> Result<()> {
        for record in records {
            self.record(record)?;
        }
        Ok(())
    }

    /// Write an error record and count it
    pub fn error(&mut self, err: &Error) -> Result<()> {
        debug!("Reporting error: {:?}", err);
        self.error_count += 1;

        serde_json::to_writer(&mut self.errors, &ErrorRecord::from(err))?;
        self.errors.write_all(b"\n")?;
        self.errors.flush()?;
        Ok(())
    }

    /// Number of error records written so far
    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("error_count", &self.error_count)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::capture;
    use super::*;
    use cloudcontrol_core::model::ResourceKind;
    use serde_json::json;

    #[test]
    fn test_records_are_json_lines() {
        let (mut output, records, errors) = capture();

        output.records(&[json!({"id": "a"}), json!({"id": "b"})]).unwrap();

        assert_eq!(records.lines(), vec![json!({"id": "a"}), json!({"id": "b"})]);
        assert!(errors.lines().is_empty());
        assert_eq!(output.error_count(), 0);
    }

    #[test]
    fn test_error_record_shape() {
        let (mut output, records, errors) = capture();

        output
            .error(&Error::not_found_by_id(ResourceKind::Vlan, "v-9"))
            .unwrap();

        assert!(records.lines().is_empty());
        assert_eq!(
            errors.lines(),
            vec![json!({
                "errorId": "CloudControl.Vlan.NotFound",
                "category": "ObjectNotFound",
                "message": "Cannot find a VLAN with Id 'v-9'.",
                "target": "v-9"
            })]
        );
        assert_eq!(output.error_count(), 1);
    }

    #[test]
    fn test_error_record_omits_missing_target() {
        let (mut output, _records, errors) = capture();

        output.error(&Error::Cancelled).unwrap();

        let line = &errors.lines()[0];
        assert_eq!(line["errorId"], "CloudControl.Cancelled");
        assert!(line.get("target").is_none());
    }
}
