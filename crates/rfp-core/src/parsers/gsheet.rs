//! Remote spreadsheet parsing capability.
//!
//! The real transport (authenticated read-only fetch of all worksheets in
//! a hosted spreadsheet) needs a credential/auth surface this crate
//! deliberately does not own. The capability is modeled as a trait so a
//! caller with real credentials can supply a concrete implementation;
//! this module ships the contract plus an in-memory fake for tests.

use async_trait::async_trait;

use crate::error::ParseError;
use crate::parsers::{ParsedDoc, Table};

/// Authenticated read-only access to a remote spreadsheet's worksheets.
///
/// No implementation ships in this crate; `remote_spreadsheet_id` is
/// whatever locator the concrete transport needs (a document id, a URL).
#[async_trait]
pub trait RemoteSpreadsheetSource: Send + Sync {
    async fn fetch_worksheets(&self, remote_spreadsheet_id: &str) -> Result<Vec<(String, Table)>, ParseError>;
}

/// Parse a remote spreadsheet's worksheets into a [`ParsedDoc`], one table
/// per worksheet, mirroring the local xlsx parser's shape.
pub async fn parse_remote(
    source: &dyn RemoteSpreadsheetSource,
    remote_spreadsheet_id: &str,
) -> Result<ParsedDoc, ParseError> {
    let worksheets = source.fetch_worksheets(remote_spreadsheet_id).await?;

    let mut metadata = std::collections::HashMap::new();
    metadata.insert(
        "sheet_names".to_string(),
        worksheets.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>().join(","),
    );

    let mut text_parts = Vec::with_capacity(worksheets.len());
    let mut tables = Vec::with_capacity(worksheets.len());
    for (_, table) in &worksheets {
        for row in table {
            text_parts.push(row.join(" "));
        }
        tables.push(table.clone());
    }

    Ok(ParsedDoc {
        text: text_parts.join("\n"),
        page_count: worksheets.len() as u32,
        metadata,
        tables,
        sections: Vec::new(),
        was_ocr: false,
    })
}

/// An in-memory fake implementing [`RemoteSpreadsheetSource`] for tests,
/// keyed by `remote_spreadsheet_id`.
#[derive(Default)]
pub struct FakeRemoteSpreadsheetSource {
    pub worksheets_by_id: std::collections::HashMap<String, Vec<(String, Table)>>,
}

#[async_trait]
impl RemoteSpreadsheetSource for FakeRemoteSpreadsheetSource {
    async fn fetch_worksheets(&self, remote_spreadsheet_id: &str) -> Result<Vec<(String, Table)>, ParseError> {
        self.worksheets_by_id
            .get(remote_spreadsheet_id)
            .cloned()
            .ok_or_else(|| ParseError::Malformed {
                format: "remote_spreadsheet".to_string(),
                message: format!("no fake worksheets registered for '{remote_spreadsheet_id}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_source_returns_registered_worksheets() {
        let mut fake = FakeRemoteSpreadsheetSource::default();
        fake.worksheets_by_id.insert(
            "sheet-1".to_string(),
            vec![("Sheet1".to_string(), vec![vec!["a".to_string(), "b".to_string()]])],
        );

        let doc = parse_remote(&fake, "sheet-1").await.unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.tables[0][0], vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn unknown_id_is_malformed_error() {
        let fake = FakeRemoteSpreadsheetSource::default();
        let err = parse_remote(&fake, "missing").await.unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }
}
