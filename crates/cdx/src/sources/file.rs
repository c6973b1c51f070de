// ai
//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! Someone uploaded a spreadsheet. It had a header row (good), a trailing
//! newline (fine), a price column where "10" was meant to be a number (sure),
//! and one row with a missing comma (of course).
//!
//! This adapter reads JSON, CSV and TSV files, from a URL or from disk.
//! CSV/TSV cells are typed on the way in: numeric-looking cells become numbers,
//! `true`/`false` become booleans, empty cells become null, the rest stay text.
//! A ragged row is a [`SourceError::Parse`] carrying the csv error kind, not a
//! silently shifted column. 🦆

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::api::records_from_array;
use super::{FileType, SourceAdapter, Transport};
use crate::errors::SourceError;
use crate::record::RawRecord;

// -- 📂 FileSourceConfig: "It's just a file", said no sysadmin ever before the disk filled up.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FileSourceConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// 🧾 Which parser to use. Absent → guessed from the URL's extension.
    #[serde(default)]
    pub file_type: Option<FileType>,
}

#[derive(Debug, Clone)]
pub struct FileSource {
    file_type: Option<FileType>,
}

impl FileSource {
    pub fn new(config: &FileSourceConfig) -> Self {
        Self {
            file_type: config.file_type,
        }
    }

    /// 🎯 Explicit type wins, the extension is plan B, and plan C is an error.
    pub fn file_type_for(&self, url: &str) -> Result<FileType, SourceError> {
        self.file_type
            .or_else(|| FileType::from_url(url))
            .ok_or_else(|| SourceError::UnsupportedSource {
                source_title: "File".to_string(),
                file_type: extension_of(url).unwrap_or("unknown").to_string(),
            })
    }

    pub fn parse(body: impl AsRef<[u8]>, file_type: FileType) -> Result<Vec<RawRecord>, SourceError> {
        let body = body.as_ref();
        match file_type {
            FileType::Json => {
                let parsed: Value = serde_json::from_slice(body)
                    .map_err(|e| SourceError::parse(file_type.title(), "InvalidJson", e.to_string()))?;
                records_from_array(parsed, file_type.title())
            }
            FileType::Csv => parse_delimited(body, b',', file_type),
            FileType::Tsv => parse_delimited(body, b'\t', file_type),
        }
    }
}

#[async_trait]
impl SourceAdapter for FileSource {
    async fn fetch_and_parse(
        &self,
        transport: &Transport,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        // -- 🔒 resolve the parser before spending a round trip on a body we can't read
        let file_type = self.file_type_for(url)?;
        let body = transport.fetch_body(url, headers, "File").await?;
        Self::parse(body, file_type)
    }
}

fn parse_delimited(body: &[u8], delimiter: u8, file_type: FileType) -> Result<Vec<RawRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(body);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(e, file_type))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| csv_error(e, file_type))?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), coerce_cell(cell)))
            .collect();
        rows.push(record);
    }

    trace!("🧾 parsed {} {} rows", rows.len(), file_type.title());
    Ok(rows)
}

fn csv_error(error: csv::Error, file_type: FileType) -> SourceError {
    let code = match error.kind() {
        csv::ErrorKind::UnequalLengths { .. } => "UnequalLengths",
        csv::ErrorKind::Utf8 { .. } => "Utf8",
        csv::ErrorKind::Io(_) => "Io",
        csv::ErrorKind::Deserialize { .. } => "Deserialize",
        _ => "Unknown",
    };
    SourceError::parse(file_type.title(), code, error.to_string())
}

/// 🔢 Dynamic typing for spreadsheet cells.
///
/// Only cells made of digits, signs, dots and exponents are numbers. That keeps
/// `"inf"`, `"NaN"` and `"1,000"` as text, which is what a human meant.
fn coerce_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    let trimmed = cell.trim();
    let looks_numeric = trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if looks_numeric {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::from(int);
        }
        if let Some(number) = trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(number);
        }
    }

    Value::String(cell.to_string())
}

fn extension_of(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

impl FileType {
    /// 🔎 Guess from the extension: `people.csv?dl=1` → `Csv`.
    pub fn from_url(url: &str) -> Option<Self> {
        match extension_of(url)?.to_ascii_lowercase().as_str() {
            "json" => Some(FileType::Json),
            "csv" => Some(FileType::Csv),
            "tsv" | "tab" => Some(FileType::Tsv),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn the_one_where_csv_prices_become_actual_numbers() -> anyhow::Result<()> {
        let records = FileSource::parse("name,price\nWidget,10\nGadget,5", FileType::Csv)?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], json!("Widget"));
        assert_eq!(records[0]["price"], json!(10));
        assert_eq!(records[1]["price"], json!(5));
        assert!(records[1]["price"].is_number());
        Ok(())
    }

    #[test]
    fn the_one_where_columns_keep_the_header_order() -> anyhow::Result<()> {
        let records = FileSource::parse("zeta,alpha,mid\n1,2,3\n", FileType::Csv)?;
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        Ok(())
    }

    #[test]
    fn the_one_where_a_bad_byte_is_a_parse_error_not_a_question_mark() {
        let err = FileSource::parse(b"name,price\nWid\xffget,10\n", FileType::Csv)
            .expect_err("💀 invalid UTF-8 must not be decoded lossily");
        assert!(matches!(err, SourceError::Parse { ref code, .. } if code == "Utf8"), "got {err:?}");

        let err = FileSource::parse(b"[{\"name\": \"Wid\xffget\"}]", FileType::Json)
            .expect_err("💀 invalid UTF-8 in JSON is still invalid");
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn the_one_where_cells_pick_their_types() {
        assert_eq!(coerce_cell(""), Value::Null);
        assert_eq!(coerce_cell("TRUE"), json!(true));
        assert_eq!(coerce_cell("false"), json!(false));
        assert_eq!(coerce_cell("-2.5"), json!(-2.5));
        assert_eq!(coerce_cell("1e3"), json!(1000.0));
        assert_eq!(coerce_cell("NaN"), json!("NaN"));
        assert_eq!(coerce_cell("1,000"), json!("1,000"));
        assert_eq!(coerce_cell("1-2-3"), json!("1-2-3"), "dates-ish stay text");
        assert_eq!(coerce_cell("hello"), json!("hello"));
    }

    #[test]
    fn the_one_where_tsv_uses_tabs_like_a_civilized_format() -> anyhow::Result<()> {
        let records = FileSource::parse("name\tqty\nBolt, small\t3\n", FileType::Tsv)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("Bolt, small"));
        assert_eq!(records[0]["qty"], json!(3));
        Ok(())
    }

    #[test]
    fn the_one_where_a_ragged_row_is_a_parse_error() {
        let err = FileSource::parse("a,b\n1,2\n3\n", FileType::Csv)
            .expect_err("💀 a missing cell must not shift the columns silently");
        match err {
            SourceError::Parse { format, code, .. } => {
                assert_eq!(format, "CSV");
                assert_eq!(code, "UnequalLengths");
            }
            other => panic!("💀 expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn the_one_where_json_files_are_just_arrays() -> anyhow::Result<()> {
        let records = FileSource::parse(r#"[{"a": 1}, {"a": 2}]"#, FileType::Json)?;
        assert_eq!(records.len(), 2);
        assert!(FileSource::parse(r#"{"a": 1}"#, FileType::Json).is_err());
        Ok(())
    }

    #[test]
    fn the_one_where_the_extension_decides_when_config_does_not() {
        let unconfigured = FileSource::new(&FileSourceConfig::default());
        assert_eq!(
            unconfigured.file_type_for("https://x.dev/people.CSV?dl=1").ok(),
            Some(FileType::Csv)
        );
        assert_eq!(unconfigured.file_type_for("data.tsv").ok(), Some(FileType::Tsv));

        let err = unconfigured
            .file_type_for("https://x.dev/people.xlsx")
            .expect_err("💀 xlsx is not on the menu");
        assert!(matches!(err, SourceError::UnsupportedSource { ref file_type, .. } if file_type == "xlsx"));

        let configured = FileSource::new(&FileSourceConfig {
            url: None,
            file_type: Some(FileType::Json),
        });
        assert_eq!(configured.file_type_for("rows.csv").ok(), Some(FileType::Json));
    }

    #[tokio::test]
    async fn the_one_where_a_local_csv_is_read_from_disk() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        write!(file, "name,price\nWidget,10\n")?;

        let source = FileSource::new(&FileSourceConfig::default());
        let records = source
            .fetch_and_parse(
                &Transport::new()?,
                &file.path().display().to_string(),
                &BTreeMap::new(),
            )
            .await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["price"], json!(10));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_bad_bytes_fail_the_same_from_disk_or_wire() -> anyhow::Result<()> {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let body: &[u8] = b"name,price\nWid\xffget,10\n";
        let source = FileSource::new(&FileSourceConfig {
            url: None,
            file_type: Some(FileType::Csv),
        });
        let transport = Transport::new()?;

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        file.write_all(body)?;
        let from_disk = source
            .fetch_and_parse(&transport, &file.path().display().to_string(), &BTreeMap::new())
            .await;
        assert!(
            matches!(from_disk, Err(SourceError::Parse { ref code, .. }) if code == "Utf8"),
            "got {from_disk:?}"
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&server)
            .await;
        let from_wire = source
            .fetch_and_parse(&transport, &server.uri(), &BTreeMap::new())
            .await;
        assert!(
            matches!(from_wire, Err(SourceError::Parse { ref code, .. }) if code == "Utf8"),
            "got {from_wire:?}"
        );
        Ok(())
    }
}
