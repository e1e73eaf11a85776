/// Remote history store backed by the Firestore REST API

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Number, Value};

use crate::analysis::{Analysis, AnalysisRecord};
use crate::config::RemoteStoreConfig;
use crate::error::StoreError;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// A document collection holding analysis records
#[async_trait(?Send)]
pub trait RemoteStore {
    /// Insert an analysis stamped with `timestamp`; returns the assigned id
    async fn insert(&self, analysis: &Analysis, timestamp: DateTime<Utc>) -> Result<String, StoreError>;

    /// Most recent `count` records, newest first
    async fn recent(&self, count: usize) -> Result<Vec<AnalysisRecord>, StoreError>;
}

/// Typed Firestore value, e.g. `{"stringValue": "x"}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values travel as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl Document {
    /// Document id: last segment of the resource name
    pub fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RunQueryItem {
    document: Option<Document>,
}

/// Convert plain JSON into a Firestore value
pub fn to_firestore(value: &Value) -> FirestoreValue {
    match value {
        Value::Null => FirestoreValue::NullValue(()),
        Value::Bool(b) => FirestoreValue::BooleanValue(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FirestoreValue::IntegerValue(i.to_string()),
            None => FirestoreValue::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => FirestoreValue::StringValue(s.clone()),
        Value::Array(items) => FirestoreValue::ArrayValue(ArrayValue {
            values: items.iter().map(to_firestore).collect(),
        }),
        Value::Object(map) => FirestoreValue::MapValue(MapValue {
            fields: map.iter().map(|(k, v)| (k.clone(), to_firestore(v))).collect(),
        }),
    }
}

/// Convert a Firestore value back into plain JSON
pub fn from_firestore(value: &FirestoreValue) -> Value {
    match value {
        FirestoreValue::NullValue(()) => Value::Null,
        FirestoreValue::BooleanValue(b) => Value::Bool(*b),
        FirestoreValue::IntegerValue(s) => s
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(s.clone())),
        FirestoreValue::DoubleValue(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        FirestoreValue::TimestampValue(s) | FirestoreValue::StringValue(s) => Value::String(s.clone()),
        FirestoreValue::ArrayValue(array) => Value::Array(array.values.iter().map(from_firestore).collect()),
        FirestoreValue::MapValue(map) => Value::Object(fields_to_json(&map.fields)),
    }
}

fn fields_to_json(fields: &BTreeMap<String, FirestoreValue>) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), from_firestore(v))).collect()
}

/// Document body for a new analysis; the timestamp is a native Firestore timestamp
pub fn encode_analysis(analysis: &Analysis, timestamp: DateTime<Utc>) -> Result<Document, StoreError> {
    let mut fields = match to_firestore(&serde_json::to_value(analysis)?) {
        FirestoreValue::MapValue(map) => map.fields,
        _ => BTreeMap::new(),
    };

    fields.insert(
        "timestamp".to_string(),
        FirestoreValue::TimestampValue(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    Ok(Document {
        fields,
        ..Document::default()
    })
}

/// Rebuild a record from a stored document
pub fn decode_document(document: &Document) -> Result<AnalysisRecord, StoreError> {
    let id = document
        .id()
        .ok_or_else(|| StoreError::Decode("document without name".to_string()))?;

    let mut json = fields_to_json(&document.fields);
    json.insert("id".to_string(), Value::String(id.to_string()));

    serde_json::from_value(Value::Object(json)).map_err(|e| StoreError::Decode(format!("{}: {}", id, e)))
}

/// Firestore collection accessed over REST with an API key
pub struct FirestoreStore {
    client: Client,
    api_key: String,
    documents_url: String,
    collection: String,
}

impl FirestoreStore {
    /// None when the remote store is disabled
    pub fn from_config(config: &RemoteStoreConfig) -> Option<FirestoreStore> {
        if !config.enabled {
            log::info!("utubext: remote store disabled, using local vault only");
            return None;
        }

        log::info!("utubext: remote store enabled (project {})", config.project_id);
        Some(FirestoreStore::new(config, FIRESTORE_BASE_URL))
    }

    pub fn new(config: &RemoteStoreConfig, base_url: &str) -> FirestoreStore {
        FirestoreStore {
            client: Client::new(),
            api_key: config.api_key.clone(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                config.project_id
            ),
            collection: config.collection.clone(),
        }
    }

    fn insert_url(&self) -> String {
        format!("{}/{}?key={}", self.documents_url, self.collection, self.api_key)
    }

    fn query_url(&self) -> String {
        format!("{}:runQuery?key={}", self.documents_url, self.api_key)
    }

    fn recent_query(&self, count: usize) -> Value {
        serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "orderBy": [{
                    "field": { "fieldPath": "timestamp" },
                    "direction": "DESCENDING"
                }],
                "limit": count
            }
        })
    }
}

#[async_trait(?Send)]
impl RemoteStore for FirestoreStore {
    async fn insert(&self, analysis: &Analysis, timestamp: DateTime<Utc>) -> Result<String, StoreError> {
        let document = encode_analysis(analysis, timestamp)?;
        let created: Document = send_json(&self.client, &self.insert_url(), &document).await?;

        created
            .id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("created document without name".to_string()))
    }

    async fn recent(&self, count: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let items: Vec<RunQueryItem> = send_json(&self.client, &self.query_url(), &self.recent_query(count)).await?;

        Ok(decode_query_items(items))
    }
}

fn decode_query_items(items: Vec<RunQueryItem>) -> Vec<AnalysisRecord> {
    items
        .into_iter()
        .filter_map(|item| item.document)
        .filter_map(|document| match decode_document(&document) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("utubext: skipping unreadable remote record: {}", e);
                None
            }
        })
        .collect()
}

/// POST a JSON body and parse the JSON answer; non-success status is an error
async fn send_json<T: Serialize, R: DeserializeOwned>(client: &Client, url: &str, data: &T) -> Result<R, StoreError> {
    let response = client.post(url).json(data).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(StoreError::Status(status.as_u16(), response.text().await.unwrap_or_default()));
    }

    Ok(response.json::<R>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CompetitionLevel, Source};
    use chrono::TimeZone;

    fn sample_analysis() -> Analysis {
        Analysis {
            title: "Side hustles UK".to_string(),
            summary: "Growing fast".to_string(),
            trend_score: 81,
            competition_level: CompetitionLevel::Low,
            top_keywords: vec!["side hustle".to_string(), "cost of living".to_string()],
            viral_hooks: vec!["Nobody talks about this".to_string()],
            suggested_titles: vec![],
            full_script_prompt: "Script".to_string(),
            sources: vec![Source {
                title: "Guardian".to_string(),
                uri: "https://theguardian.com".to_string(),
            }],
        }
    }

    fn config() -> RemoteStoreConfig {
        RemoteStoreConfig::new(Some("key123".to_string()), Some("proj".to_string()))
    }

    #[test]
    fn test_value_wire_format() {
        let json = serde_json::to_value(to_firestore(&serde_json::json!("x"))).unwrap();
        assert_eq!(json, serde_json::json!({ "stringValue": "x" }));

        let json = serde_json::to_value(to_firestore(&serde_json::json!(42))).unwrap();
        assert_eq!(json, serde_json::json!({ "integerValue": "42" }));

        let json = serde_json::to_value(to_firestore(&serde_json::json!(["a"]))).unwrap();
        assert_eq!(json, serde_json::json!({ "arrayValue": { "values": [{ "stringValue": "a" }] } }));
    }

    #[test]
    fn test_encode_analysis() {
        let timestamp = Utc.with_ymd_and_hms(2024, 10, 28, 10, 30, 0).unwrap();
        let document = encode_analysis(&sample_analysis(), timestamp).unwrap();

        assert_eq!(
            document.fields.get("timestamp"),
            Some(&FirestoreValue::TimestampValue("2024-10-28T10:30:00.000Z".to_string()))
        );
        assert_eq!(
            document.fields.get("trendScore"),
            Some(&FirestoreValue::IntegerValue("81".to_string()))
        );
        assert_eq!(
            document.fields.get("competitionLevel"),
            Some(&FirestoreValue::StringValue("Düşük".to_string()))
        );
        assert!(document.fields.get("id").is_none());
    }

    #[test]
    fn test_encode_then_decode_document() {
        let timestamp = Utc.with_ymd_and_hms(2024, 10, 28, 10, 30, 0).unwrap();
        let mut document = encode_analysis(&sample_analysis(), timestamp).unwrap();
        document.name = "projects/proj/databases/(default)/documents/analyses/abc123".to_string();

        let record = decode_document(&document).unwrap();

        assert_eq!(record.id, "abc123");
        assert_eq!(record.timestamp, timestamp);
        assert_eq!(record.analysis, sample_analysis());
    }

    #[test]
    fn test_decode_run_query_response() {
        let body = r#"[
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/analyses/doc1",
                    "fields": {
                        "title": { "stringValue": "Air fryer recipes" },
                        "summary": { "stringValue": "Saturated" },
                        "trendScore": { "doubleValue": 64.0 },
                        "competitionLevel": { "stringValue": "Yüksek" },
                        "topKeywords": { "arrayValue": {} },
                        "timestamp": { "timestampValue": "2024-10-28T10:30:00.123456Z" }
                    },
                    "createTime": "2024-10-28T10:30:00.123456Z"
                },
                "readTime": "2024-10-28T11:00:00Z"
            },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/analyses/broken",
                    "fields": { "title": { "stringValue": "missing fields" } }
                },
                "readTime": "2024-10-28T11:00:00Z"
            },
            { "readTime": "2024-10-28T11:00:00Z" }
        ]"#;

        let items: Vec<RunQueryItem> = serde_json::from_str(body).unwrap();
        let records = decode_query_items(items);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "doc1");
        assert_eq!(records[0].analysis.trend_score, 64);
        assert_eq!(records[0].analysis.competition_level, CompetitionLevel::High);
        assert!(records[0].analysis.top_keywords.is_empty());
    }

    #[test]
    fn test_urls() {
        let store = FirestoreStore::new(&config(), "https://firestore.example/v1/");

        assert_eq!(
            store.insert_url(),
            "https://firestore.example/v1/projects/proj/databases/(default)/documents/analyses?key=key123"
        );
        assert_eq!(
            store.query_url(),
            "https://firestore.example/v1/projects/proj/databases/(default)/documents:runQuery?key=key123"
        );
    }

    #[test]
    fn test_recent_query_shape() {
        let store = FirestoreStore::new(&config(), FIRESTORE_BASE_URL);
        let query = store.recent_query(6);

        assert_eq!(query["structuredQuery"]["from"][0]["collectionId"], "analyses");
        assert_eq!(query["structuredQuery"]["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(query["structuredQuery"]["limit"], 6);
    }

    #[test]
    fn test_from_config_disabled() {
        assert!(FirestoreStore::from_config(&RemoteStoreConfig::disabled()).is_none());
        assert!(FirestoreStore::from_config(&config()).is_some());
    }
}
