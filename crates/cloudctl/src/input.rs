//! By-object input
//!
//! Commands accept resource records through `--input`, either from a file or
//! from stdin (`-`). The text may hold one JSON object, a JSON array of
//! objects, or one object per line, so the output of one command can be piped
//! into the next.

use cloudcontrol_core::{Error, Result};
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;

/// Path value that selects stdin
pub const STDIN: &str = "-";

/// Read every record from `source`
pub async fn read_records<T: DeserializeOwned>(source: &str) -> Result<Vec<T>> {
    let text = if source == STDIN {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        tokio::fs::read_to_string(source).await?
    };

    parse_records(&text)
        .map_err(|e| Error::invalid_parameter("input", format!("Invalid input records: {}", e)))
}

/// Parse records from an object, an array, or a stream of objects
pub fn parse_records<T: DeserializeOwned>(text: &str) -> serde_json::Result<Vec<T>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text);
    }

    serde_json::Deserializer::from_str(text)
        .into_iter::<T>()
        .collect()
}
