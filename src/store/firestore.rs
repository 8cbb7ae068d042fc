//! Cloud Firestore store over the REST API.
//!
//! Documents come back with typed values (`{"stringValue": "..."}`); they are
//! flattened to plain JSON before deserializing into `Report`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{sort_for_listing, ReportStore, StoreError};
use crate::config::FirebaseConfig;
use crate::report::{Report, ReportStatus};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

pub struct FirestoreStore {
    config: FirebaseConfig,
    http_client: reqwest::Client,
    documents_url: String,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, rename = "updateTime")]
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

impl FirestoreStore {
    pub fn new(config: FirebaseConfig, http_client: reqwest::Client) -> Self {
        let base = match &config.emulator_host {
            Some(host) => format!("http://{}", host.trim_end_matches('/')),
            None => FIRESTORE_BASE_URL.to_string(),
        };
        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            base, config.project_id
        );

        Self {
            config,
            http_client,
            documents_url,
        }
    }

    /// URL of one report document. The id is pushed as an encoded path
    /// segment, so `#`, `?` or `/` in it never leave the document path.
    fn document_url(&self, id: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.documents_url)
            .map_err(|e| format!("invalid Firestore URL {}: {}", self.documents_url, e))?;
        url.path_segments_mut()
            .map_err(|_| format!("invalid Firestore URL {}", self.documents_url))?
            .push(&self.config.collection)
            .push(id);
        Ok(url)
    }

    /// PATCH of the status field, accepted only while the document still
    /// carries `update_time`.
    fn status_update(
        &self,
        id: &str,
        status: ReportStatus,
        update_time: &str,
    ) -> Result<RequestBuilder, String> {
        let body = json!({ "fields": { "status": { "stringValue": status.as_str() } } });
        Ok(self
            .authorize(self.http_client.patch(self.document_url(id)?))
            .query(&[
                ("updateMask.fieldPaths", "status"),
                ("currentDocument.updateTime", update_time),
            ])
            .json(&body))
    }

    async fn fetch_document(&self, id: &str) -> Result<FirestoreDocument, StoreError> {
        let url = self.document_url(id).map_err(StoreError::Read)?;
        let response = self
            .authorize(self.http_client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Read(describe_failure(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("malformed document: {}", e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("key", self.config.api_key.as_str())]);
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn status_query(&self, status: ReportStatus) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "status" },
                        "op": "EQUAL",
                        "value": { "stringValue": status.as_str() }
                    }
                }
            }
        })
    }
}

async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("Firestore responded {}: {}", status, body.trim())
}

/// Firestore reports a stale `updateTime` precondition as FAILED_PRECONDITION.
fn is_failed_precondition(code: StatusCode, message: &str) -> bool {
    code == StatusCode::PRECONDITION_FAILED
        || code == StatusCode::CONFLICT
        || message.contains("FAILED_PRECONDITION")
}

#[async_trait]
impl ReportStore for FirestoreStore {
    async fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&self.status_query(status))
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        if !response.status().is_success() {
            let message = describe_failure(response).await;
            log::error!("Listing {} reports failed: {}", status, message);
            return Err(StoreError::Read(message));
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("malformed query response: {}", e)))?;

        let mut reports = Vec::with_capacity(items.len());
        for document in items.into_iter().filter_map(|item| item.document) {
            match decode_document(document) {
                Ok(report) => reports.push(report),
                Err(e) => log::warn!("Skipping unreadable report document: {}", e),
            }
        }

        sort_for_listing(&mut reports);
        log::debug!("Fetched {} {} reports", reports.len(), status);
        Ok(reports)
    }

    async fn get_by_id(&self, id: &str) -> Result<Report, StoreError> {
        let document = self.fetch_document(id).await?;
        decode_document(document).map_err(StoreError::Read)
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ReportStatus,
        status: ReportStatus,
    ) -> Result<(), StoreError> {
        let document = self.fetch_document(id).await?;
        let update_time = document.update_time.clone().ok_or_else(|| {
            StoreError::Read(format!("document {} carries no updateTime", id))
        })?;
        let current = decode_document(document).map_err(StoreError::Read)?.status;
        if current != expected {
            return Err(StoreError::Conflict(id.to_string()));
        }

        let response = self
            .status_update(id, status, &update_time)
            .map_err(StoreError::Write)?
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let code = response.status();
        if code == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if !code.is_success() {
            let message = describe_failure(response).await;
            if is_failed_precondition(code, &message) {
                log::warn!("Report {} changed before its status write: {}", id, message);
                return Err(StoreError::Conflict(id.to_string()));
            }
            return Err(StoreError::Write(message));
        }

        log::info!("Report {} moved to {}", id, status);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(id).map_err(StoreError::Write)?;
        let response = self
            .authorize(self.http_client.delete(url))
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Write(describe_failure(response).await));
        }

        log::info!("Report {} deleted", id);
        Ok(())
    }
}

fn decode_document(document: FirestoreDocument) -> Result<Report, String> {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let mut fields = decode_fields(&document.fields);
    fields.insert("id".to_string(), Value::String(id.clone()));

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| format!("document {} does not look like a report: {}", id, e))
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Flatten one Firestore typed value into plain JSON.
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        },
        "mapValue" => {
            let empty = Map::new();
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            Value::Object(decode_fields(fields))
        }
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "nullValue" => Value::Null,
        // stringValue, doubleValue, booleanValue, timestampValue,
        // referenceValue, bytesValue, geoPointValue
        _ => inner.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nested_values() {
        let raw = json!({
            "mapValue": {
                "fields": {
                    "count": { "integerValue": "42" },
                    "ratio": { "doubleValue": 0.5 },
                    "tags": { "arrayValue": { "values": [
                        { "stringValue": "a" },
                        { "nullValue": null }
                    ] } },
                    "empty": { "arrayValue": {} },
                    "when": { "timestampValue": "2025-01-02T03:04:05Z" }
                }
            }
        });

        let decoded = decode_value(&raw);
        assert_eq!(decoded["count"], json!(42));
        assert_eq!(decoded["ratio"], json!(0.5));
        assert_eq!(decoded["tags"], json!(["a", null]));
        assert_eq!(decoded["empty"], json!([]));
        assert_eq!(decoded["when"], json!("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn test_decode_document_takes_id_from_name() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/kony/databases/(default)/documents/reports/abc123",
            "fields": {
                "clientName": { "stringValue": "Mairie de Vienne" },
                "status": { "stringValue": "reviewed" },
                "submittedAt": { "timestampValue": "2025-02-01T08:00:00Z" },
                "floors": { "arrayValue": { "values": [
                    { "mapValue": { "fields": {
                        "name": { "stringValue": "Sous-sol" },
                        "conduits": { "arrayValue": { "values": [ { "mapValue": {} } ] } }
                    } } }
                ] } }
            },
            "createTime": "2025-02-01T08:00:00Z"
        }))
        .unwrap();

        let report = decode_document(document).unwrap();
        assert_eq!(report.id, "abc123");
        assert_eq!(report.client_name.as_deref(), Some("Mairie de Vienne"));
        assert_eq!(report.status, ReportStatus::Reviewed);
        assert_eq!(report.floors[0].name, "Sous-sol");
        assert_eq!(report.total_components(), 1);
    }

    #[test]
    fn test_decode_document_without_status_fails() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/kony/databases/(default)/documents/reports/broken",
            "fields": { "clientName": { "stringValue": "No status" } }
        }))
        .unwrap();

        let err = decode_document(document).unwrap_err();
        assert!(err.contains("broken"));
    }

    fn emulator_store() -> FirestoreStore {
        let config = FirebaseConfig {
            project_id: "kony-test".to_string(),
            api_key: "key".to_string(),
            auth_token: None,
            emulator_host: Some("localhost:8081".to_string()),
            collection: "reports".to_string(),
        };
        FirestoreStore::new(config, reqwest::Client::new())
    }

    const REPORTS_URL: &str =
        "http://localhost:8081/v1/projects/kony-test/databases/(default)/documents/reports";

    #[test]
    fn test_urls_follow_emulator_host() {
        let store = emulator_store();
        assert_eq!(
            store.document_url("r1").unwrap().as_str(),
            format!("{}/r1", REPORTS_URL)
        );

        let query = store.status_query(ReportStatus::Submitted);
        assert_eq!(
            query["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"],
            "submitted"
        );
    }

    #[test]
    fn test_document_url_keeps_id_in_path() {
        let store = emulator_store();
        let client = reqwest::Client::new();

        let request = store
            .authorize(client.delete(store.document_url("abc#frag").unwrap()))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            format!("{}/abc%23frag?key=key", REPORTS_URL)
        );
        assert_eq!(request.url().fragment(), None);

        let request = store
            .authorize(client.get(store.document_url("abc?x=1").unwrap()))
            .build()
            .unwrap();
        assert_eq!(
            request.url().path(),
            "/v1/projects/kony-test/databases/(default)/documents/reports/abc%3Fx=1"
        );
        let query: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert_eq!(query, vec![("key".to_string(), "key".to_string())]);

        let nested = store.document_url("a/b").unwrap();
        assert_eq!(nested.path_segments().unwrap().last(), Some("a%2Fb"));
    }

    #[test]
    fn test_status_update_is_conditional_on_update_time() {
        let store = emulator_store();
        let request = store
            .status_update("r#1", ReportStatus::Approved, "2025-02-01T08:00:00.123456Z")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(request.url().path().rsplit('/').next(), Some("r%231"));
        let query: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert!(query.contains(&("updateMask.fieldPaths".to_string(), "status".to_string())));
        assert!(query.contains(&(
            "currentDocument.updateTime".to_string(),
            "2025-02-01T08:00:00.123456Z".to_string()
        )));

        let body: Value = serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["fields"]["status"]["stringValue"], "approved");
    }

    #[test]
    fn test_stale_update_time_reads_as_conflict() {
        let stale = r#"{"error": {"code": 400, "message": "the stored version does not match the required base version", "status": "FAILED_PRECONDITION"}}"#;
        assert!(is_failed_precondition(StatusCode::BAD_REQUEST, stale));
        assert!(is_failed_precondition(StatusCode::PRECONDITION_FAILED, ""));
        assert!(!is_failed_precondition(StatusCode::FORBIDDEN, "PERMISSION_DENIED"));
    }
}
