//! Request body selection
//!
//! The shape of a [`Payload`] decides how it goes on the wire: multipart
//! bodies are handed to the transport untouched (it owns the boundary and the
//! Content-Type), URL-encoded pairs get `application/x-www-form-urlencoded`,
//! and JSON values are serialised with `application/json`.

use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{ApiError, ApiResult};
use crate::schema::{cell::json_string_form, FieldDescriptor, FieldType};

/// Request body, selected by shape
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    UrlEncoded(Vec<(String, String)>),
    Multipart(MultipartBody),
}

impl Payload {
    /// Serialise any value into a JSON payload
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Payload::UrlEncoded(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Attach the body (and, except for multipart, its Content-Type)
    pub(crate) fn apply(self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        Ok(match self {
            Payload::Empty => builder,
            Payload::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&value)?),
            Payload::UrlEncoded(pairs) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .form(&pairs),
            Payload::Multipart(body) => builder.multipart(body.into_form()?),
        })
    }

    /// Encode a submitted form: multipart when a file field carries a path,
    /// JSON otherwise
    pub async fn from_submission(
        fields: &[FieldDescriptor],
        state: &Map<String, Value>,
    ) -> ApiResult<Self> {
        let has_file = fields.iter().any(|field| {
            field.field_type == FieldType::File
                && state
                    .get(&field.name)
                    .and_then(Value::as_str)
                    .map(|path| !path.trim().is_empty())
                    .unwrap_or(false)
        });

        if !has_file {
            return Ok(Payload::Json(Value::Object(state.clone())));
        }

        let mut body = MultipartBody::new();
        for (name, value) in state {
            let is_file = fields
                .iter()
                .any(|f| &f.name == name && f.field_type == FieldType::File);
            match value {
                Value::String(path) if is_file => {
                    if !path.trim().is_empty() {
                        body.attach_file(name, path).await?;
                    }
                }
                _ => body.push_value(name, value),
            }
        }
        Ok(Payload::Multipart(body))
    }
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    Text { name: String, value: String },
    File { name: String, file_name: String, bytes: Vec<u8> },
}

impl MultipartPart {
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
        }
    }
}

/// Inspectable multipart body, converted to a transport form at send time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// Text values for a part name, in insertion order
    pub fn text_values(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MultipartPart::Text { name: n, value } if n == name => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push_text(name, value);
        self
    }

    pub fn push_text(&mut self, name: &str, value: impl Into<String>) {
        self.parts.push(MultipartPart::Text {
            name: name.to_string(),
            value: value.into(),
        });
    }

    /// Append a JSON value: arrays become repeated parts, booleans
    /// `"true"`/`"false"`, nulls are skipped
    pub fn push_value(&mut self, name: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    self.push_value(name, item);
                }
            }
            Value::Bool(b) => self.push_text(name, if *b { "true" } else { "false" }),
            other => self.push_text(name, json_string_form(other)),
        }
    }

    pub async fn attach_file(&mut self, name: &str, path: impl AsRef<Path>) -> ApiResult<()> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.parts.push(MultipartPart::File {
            name: name.to_string(),
            file_name,
            bytes,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn into_form(self) -> ApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name, value),
                MultipartPart::File { name, file_name, bytes } => {
                    if file_name.is_empty() {
                        return Err(ApiError::Payload(format!("file part '{}' has no name", name)));
                    }
                    form.part(name, reqwest::multipart::Part::bytes(bytes).file_name(file_name))
                }
            };
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_value_flattens_arrays_and_bools() {
        let mut body = MultipartBody::new();
        body.push_value("working_days", &json!(["monday", "friday"]));
        body.push_value("is_verified", &json!(true));
        body.push_value("years", &json!(4));
        body.push_value("skipped", &Value::Null);

        assert_eq!(body.text_values("working_days"), vec!["monday", "friday"]);
        assert_eq!(body.text_values("is_verified"), vec!["true"]);
        assert_eq!(body.text_values("years"), vec!["4"]);
        assert!(body.text_values("skipped").is_empty());
    }

    #[tokio::test]
    async fn test_submission_without_files_is_json() {
        let fields = vec![FieldDescriptor::new("name", "Name", FieldType::Text)];
        let mut state = Map::new();
        state.insert("name".to_string(), json!("Alice"));

        let payload = Payload::from_submission(&fields, &state).await.unwrap();
        assert_eq!(payload, Payload::Json(json!({"name": "Alice"})));
    }

    #[tokio::test]
    async fn test_submission_with_file_is_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("avatar.png");
        std::fs::write(&file, b"png-bytes").unwrap();

        let fields = vec![
            FieldDescriptor::new("name", "Name", FieldType::Text),
            FieldDescriptor::new("avatar", "Avatar", FieldType::File),
        ];
        let mut state = Map::new();
        state.insert("name".to_string(), json!("Alice"));
        state.insert("avatar".to_string(), json!(file.to_string_lossy()));

        let payload = Payload::from_submission(&fields, &state).await.unwrap();
        let Payload::Multipart(body) = payload else {
            panic!("expected multipart payload");
        };
        assert_eq!(body.text_values("name"), vec!["Alice"]);
        assert!(body.parts().iter().any(|part| matches!(
            part,
            MultipartPart::File { name, file_name, bytes }
                if name == "avatar" && file_name == "avatar.png" && bytes == b"png-bytes"
        )));
    }
}
