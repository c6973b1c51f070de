// ai
//! 🗃️ External tables: spreadsheet-as-a-service REST endpoints.
//!
//! The response looks like `{records: [{id, fields, createdTime}]}`. Every row
//! becomes its `fields` (with attachment arrays squashed to one thumbnail URL)
//! plus the row's own `id`. `createdTime` tags along when the fields don't
//! already have one. 🦆

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ImageSize, SourceAdapter, Transport};
use crate::errors::SourceError;
use crate::normalize::flatten_attachments;
use crate::record::RawRecord;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ExternalTableSourceConfig {
    /// 📡 The table endpoint. API key in the query string or an Authorization header, your pick.
    #[serde(default)]
    pub url: Option<String>,
    /// 🖼️ Which thumbnail to keep for attachment fields.
    #[serde(default)]
    pub image_size: ImageSize,
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    records: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    id: String,
    #[serde(default)]
    fields: RawRecord,
    #[serde(rename = "createdTime", default)]
    created_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExternalTableSource {
    image_size: ImageSize,
}

impl ExternalTableSource {
    pub fn new(config: &ExternalTableSourceConfig) -> Self {
        Self {
            image_size: config.image_size,
        }
    }

    pub fn parse(&self, body: impl AsRef<[u8]>) -> Result<Vec<RawRecord>, SourceError> {
        let response: TableResponse = serde_json::from_slice(body.as_ref())
            .map_err(|e| SourceError::parse("external table response", "InvalidJson", e.to_string()))?;

        Ok(response
            .records
            .into_iter()
            .map(|row| {
                let mut fields = flatten_attachments(row.fields, self.image_size);
                if let Some(created) = row.created_time {
                    fields
                        .entry("createdTime")
                        .or_insert(Value::String(created));
                }
                fields.insert("id".to_string(), Value::String(row.id));
                fields
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for ExternalTableSource {
    async fn fetch_and_parse(
        &self,
        transport: &Transport,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let body = transport.fetch_body(url, headers, "External table").await?;
        self.parse(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn table_body() -> Value {
        json!({
            "records": [
                {
                    "id": "rec1",
                    "createdTime": "2024-01-01T00:00:00.000Z",
                    "fields": {
                        "Name": "Ada",
                        "Avatar": [{
                            "url": "https://cdn/full.png",
                            "thumbnails": {
                                "small": {"url": "https://cdn/s.png"},
                                "large": {"url": "https://cdn/l.png"}
                            }
                        }],
                        "Score": 9
                    }
                },
                {"id": "rec2", "fields": {}}
            ]
        })
    }

    #[test]
    fn the_one_where_rows_keep_their_ids_and_lose_their_attachment_arrays() -> anyhow::Result<()> {
        let source = ExternalTableSource::new(&ExternalTableSourceConfig::default());
        let records = source.parse(&table_body().to_string())?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], json!("rec1"));
        assert_eq!(records[0]["Avatar"], json!("https://cdn/l.png"));
        assert_eq!(records[0]["Score"], json!(9), "non-attachment values pass through");
        assert_eq!(records[0]["createdTime"], json!("2024-01-01T00:00:00.000Z"));
        assert_eq!(records[1]["id"], json!("rec2"));
        assert!(records[1].get("createdTime").is_none());
        Ok(())
    }

    #[test]
    fn the_one_where_the_body_is_not_a_table() {
        let source = ExternalTableSource::new(&ExternalTableSourceConfig::default());
        let err = source.parse("[]").expect_err("💀 a bare array is not a table response");
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn the_one_where_the_table_wants_a_bearer_token() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer pat123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(table_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let source = ExternalTableSource::new(&ExternalTableSourceConfig {
            url: None,
            image_size: ImageSize::Small,
        });
        let transport = Transport::new()?;

        let headers = BTreeMap::from([("Authorization".to_string(), "Bearer pat123".to_string())]);
        let records = source
            .fetch_and_parse(&transport, &server.uri(), &headers)
            .await?;
        assert_eq!(records[0]["Avatar"], json!("https://cdn/s.png"));

        let err = source
            .fetch_and_parse(&transport, &server.uri(), &BTreeMap::new())
            .await
            .expect_err("💀 no token, no table");
        assert!(err.is_authentication());
        assert!(err.to_string().contains("External table"));
        Ok(())
    }
}
