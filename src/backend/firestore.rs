use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{
    error_from_response, BackendError, Direction, Document, DocumentStore, Fields, GetField, IdToken, OrderBy,
    UpdateMode,
};
use crate::model::MESSAGES;

/// Fields the backend holds as `timestampValue` rather than plain strings.
const TIMESTAMP_FIELDS: &[(&str, &str)] = &[(MESSAGES, "timestamp")];

/// Firestore REST adapter (`projects/{id}/databases/(default)/documents`).
pub struct FirestoreClient {
    http: reqwest::Client,
    base: String,
}

impl FirestoreClient {
    pub fn new(http: reqwest::Client, project_id: &str) -> Self {
        Self::with_base_url(
            http,
            format!("https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents"),
        )
    }

    pub fn with_base_url(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self { http, base: base.into().trim_end_matches('/').to_owned() }
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base)
    }

    async fn get(&self, collection: &str, id: &str, auth: Option<&IdToken>) -> Result<Document, BackendError> {
        let response = authorize(self.http.get(self.doc_url(collection, id)), auth).send().await?;
        decode_document(&json_or_error(response).await?)
    }
}

fn authorize(request: reqwest::RequestBuilder, auth: Option<&IdToken>) -> reqwest::RequestBuilder {
    match auth {
        Some(token) => request.bearer_auth(&token.0),
        None => request,
    }
}

async fn json_or_error(response: reqwest::Response) -> Result<Value, BackendError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from_response(response).await)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn query(
        &self,
        collection: &str,
        order: Option<&OrderBy>,
        auth: Option<&IdToken>,
    ) -> Result<Vec<Document>, BackendError> {
        let mut structured = json!({ "from": [{ "collectionId": collection }] });
        if let Some(order) = order {
            structured["orderBy"] = json!([{
                "field": { "fieldPath": quote_field_path(&order.field) },
                "direction": match order.direction {
                    Direction::Ascending => "ASCENDING",
                    Direction::Descending => "DESCENDING",
                },
            }]);
        }

        let request = self
            .http
            .post(format!("{}:runQuery", self.base))
            .json(&json!({ "structuredQuery": structured }));
        let response = authorize(request, auth).send().await?;
        let rows = json_or_error(response).await?;
        let rows = rows
            .as_array()
            .ok_or_else(|| BackendError::Decode(format!("runQuery returned {rows}")))?;

        // Rows without a document only carry a read time.
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    async fn set(&self, collection: &str, doc: &Document, auth: Option<&IdToken>) -> Result<Document, BackendError> {
        let request = self
            .http
            .patch(self.doc_url(collection, &doc.id))
            .json(&json!({ "fields": encode_document_fields(collection, &doc.fields) }));
        let response = authorize(request, auth).send().await?;
        decode_document(&json_or_error(response).await?)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        mode: UpdateMode,
        auth: Option<&IdToken>,
    ) -> Result<Document, BackendError> {
        // A patch without a mask would replace the document wholesale.
        if fields.is_empty() {
            return self.get(collection, id, auth).await;
        }

        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", quote_field_path(key)))
            .collect();
        if mode == UpdateMode::Existing {
            query.push(("currentDocument.exists", "true".to_owned()));
        }

        let request = self
            .http
            .patch(self.doc_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": encode_document_fields(collection, fields) }));
        let response = authorize(request, auth).send().await?;
        decode_document(&json_or_error(response).await?)
    }

    async fn delete(&self, collection: &str, id: &str, auth: Option<&IdToken>) -> Result<(), BackendError> {
        let response = authorize(self.http.delete(self.doc_url(collection, id)), auth)
            .send()
            .await?;
        json_or_error(response).await.map(|_| ())
    }
}

fn quote_field_path(field: &str) -> String {
    let simple = field.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_owned()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Encodes a document's top-level fields, typing the known timestamp fields.
pub(crate) fn encode_document_fields(collection: &str, fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| {
                let timestamp = TIMESTAMP_FIELDS.contains(&(collection, key.as_str()));
                let encoded = match value {
                    Value::String(s) if timestamp => json!({ "timestampValue": s }),
                    _ => encode_value(value),
                };
                (key.clone(), encoded)
            })
            .collect(),
    )
}

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            // integerValue travels as a decimal string
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(f)) => json!({ "doubleValue": f }),
            (None, None) => json!({ "integerValue": n.to_string() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub(crate) fn decode_value(value: &Value) -> Result<Value, BackendError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(BackendError::Decode(format!("untyped value {value}")));
    };

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let raw = inner.as_str().map(str::to_owned).unwrap_or_else(|| inner.to_string());
            raw.parse::<i64>()
                .map(Value::from)
                .map_err(|_| BackendError::Decode(format!("integerValue {inner}")))?
        }
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
        "geoPointValue" => inner.clone(),
        other => return Err(BackendError::Decode(format!("unsupported value type {other}"))),
    })
}

fn decode_fields(fields: Option<&Value>) -> Result<Map<String, Value>, BackendError> {
    let Some(fields) = fields.and_then(Value::as_object) else {
        return Ok(Map::new());
    };
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

pub(crate) fn decode_document(doc: &Value) -> Result<Document, BackendError> {
    let name = doc.get_str_field("name")?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BackendError::Decode(format!("document name {name:?}")))?
        .to_owned();

    Ok(Document { id, fields: decode_fields(doc.get("fields"))? })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_every_json_shape() {
        let encoded = encode_value(&json!({
            "title": "Dune", "n": 3, "ratio": 1.5, "ok": true, "logo": null, "tags": ["a"]
        }));

        assert_eq!(
            encoded,
            json!({ "mapValue": { "fields": {
                "title": { "stringValue": "Dune" },
                "n": { "integerValue": "3" },
                "ratio": { "doubleValue": 1.5 },
                "ok": { "booleanValue": true },
                "logo": { "nullValue": null },
                "tags": { "arrayValue": { "values": [{ "stringValue": "a" }] } },
            }}})
        );
    }

    #[test]
    fn decodes_a_wire_document() {
        let doc = decode_document(&json!({
            "name": "projects/p/databases/(default)/documents/messages/abc123",
            "fields": {
                "name": { "stringValue": "Ana" },
                "timestamp": { "timestampValue": "2024-05-01T09:30:00.123456Z" },
                "replied": { "booleanValue": false },
                "count": { "integerValue": "42" },
                "paragraphs": { "arrayValue": {} },
            },
            "createTime": "2024-05-01T09:30:00Z",
        }))
        .unwrap();

        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.fields["timestamp"], "2024-05-01T09:30:00.123456Z");
        assert_eq!(doc.fields["count"], 42);
        assert_eq!(doc.fields["paragraphs"], json!([]));
    }

    #[test]
    fn document_without_fields_is_empty() {
        let doc = decode_document(&json!({ "name": "projects/p/databases/(default)/documents/settings/heroData" }))
            .unwrap();
        assert_eq!(doc.id, "heroData");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn message_timestamps_travel_as_timestamp_values() {
        use chrono::{TimeZone, Utc};

        use crate::model::Message;

        let message = Message {
            id: "m1".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            body: "Hi".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            replied: false,
        };
        let doc = Document::from_record(&message.id, &message).unwrap();
        let wire = encode_document_fields(MESSAGES, &doc.fields);

        assert_eq!(wire["timestamp"], json!({ "timestampValue": "2024-05-01T09:30:00.000000000Z" }));
        assert_eq!(wire["name"], json!({ "stringValue": "Ana" }));

        // the same field name elsewhere stays a string
        let other = encode_document_fields("photos", &doc.fields);
        assert_eq!(other["timestamp"], json!({ "stringValue": "2024-05-01T09:30:00.000000000Z" }));

        let back = decode_document(&json!({
            "name": "projects/p/databases/(default)/documents/messages/m1",
            "fields": wire,
        }))
        .unwrap();
        assert_eq!(back.decode::<Message>().unwrap(), message);
    }

    #[test]
    fn unusual_field_paths_are_quoted() {
        assert_eq!(quote_field_path("isArchived"), "isArchived");
        assert_eq!(quote_field_path("my-field"), "`my-field`");
        assert_eq!(quote_field_path("1st"), "`1st`");
    }
}
