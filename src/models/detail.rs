//! Read-only detail views
//!
//! A detail view is a list of GET requests. Each response becomes one
//! section of labelled lines, so the console popup and the CLI `show`
//! command print the same thing.

use serde_json::Value;
use tracing::warn;

use super::chat::ChatMessage;
use super::{decode_list, ResourceGateway};
use crate::api::{ApiError, ApiResult};
use crate::schema::cell::json_string_form;

/// Fields never shown in a record view
const HIDDEN_FIELDS: &[&str] = &["password", "hashed_password"];

/// How one response is turned into lines
#[derive(Debug, Clone, PartialEq)]
pub enum DetailKind {
    /// One object, field by field
    Record,
    /// A list of records, one line each from `fields`
    Rows {
        wrappers: &'static [&'static str],
        fields: &'static [&'static str],
    },
    /// A chat session's `chat_history`
    ChatHistory,
    /// Top-level counters, then the rows held under `list`
    Summary {
        list: &'static str,
        fields: &'static [&'static str],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub heading: &'static str,
    pub endpoint: String,
    pub kind: DetailKind,
}

impl DetailRequest {
    pub fn new(heading: &'static str, endpoint: impl Into<String>, kind: DetailKind) -> Self {
        Self {
            heading,
            endpoint: endpoint.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub label: Option<String>,
    pub text: String,
}

impl DetailLine {
    pub fn labelled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailSection {
    pub heading: String,
    pub lines: Vec<DetailLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDetail {
    pub title: String,
    pub sections: Vec<DetailSection>,
}

impl RecordDetail {
    pub fn line_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.lines.len().max(1) + 2)
            .sum()
    }
}

fn row_line(row: &Value, fields: &[&str]) -> DetailLine {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| row.get(*field))
        .map(json_string_form)
        .filter(|text| !text.is_empty())
        .collect();
    DetailLine::plain(parts.join(" | "))
}

impl DetailKind {
    pub fn lines(&self, value: Value) -> ApiResult<Vec<DetailLine>> {
        match self {
            DetailKind::Record => match value {
                Value::Object(map) => Ok(map
                    .iter()
                    .filter(|(key, value)| !value.is_null() && !HIDDEN_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| DetailLine::labelled(key.as_str(), json_string_form(value)))
                    .collect()),
                other => Err(ApiError::Payload(format!("expected an object, got {}", other))),
            },
            DetailKind::Rows { wrappers, fields } => {
                let rows: Vec<Value> = decode_list(value, wrappers)?;
                Ok(rows.iter().map(|row| row_line(row, fields)).collect())
            }
            DetailKind::ChatHistory => {
                let messages: Vec<ChatMessage> = decode_list(value, &["chat_history"])?;
                let mut lines = Vec::new();
                for message in messages {
                    let mut text = message.content.lines();
                    lines.push(DetailLine::labelled(
                        message.role,
                        text.next().unwrap_or_default(),
                    ));
                    lines.extend(text.map(DetailLine::plain));
                }
                Ok(lines)
            }
            DetailKind::Summary { list, fields } => {
                let Value::Object(map) = value else {
                    return Err(ApiError::Payload(format!("expected a summary object for {list}")));
                };
                let mut lines: Vec<DetailLine> = map
                    .iter()
                    .filter(|(_, value)| !value.is_array() && !value.is_object() && !value.is_null())
                    .map(|(key, value)| DetailLine::labelled(key.as_str(), json_string_form(value)))
                    .collect();
                if let Some(Value::Array(rows)) = map.get(*list) {
                    lines.extend(rows.iter().map(|row| row_line(row, fields)));
                }
                Ok(lines)
            }
        }
    }
}

/// Run every request in order. A failed request becomes a one-line section,
/// except a 401, which fails the whole view.
pub async fn load_detail<G>(
    gateway: &G,
    title: String,
    requests: Vec<DetailRequest>,
) -> ApiResult<RecordDetail>
where
    G: ResourceGateway + ?Sized,
{
    let mut sections = Vec::with_capacity(requests.len());
    for request in requests {
        let lines = match gateway.fetch(&request.endpoint).await {
            Ok(value) => request.kind.lines(value),
            Err(e) => Err(e),
        };
        let lines = match lines {
            Ok(lines) => lines,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!("Failed to load {}: {}", request.endpoint, e);
                vec![DetailLine::plain(format!("Failed to load: {}", e))]
            }
        };
        sections.push(DetailSection {
            heading: request.heading.to_string(),
            lines,
        });
    }
    Ok(RecordDetail { title, sections })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Payload;
    use crate::models::Resource;
    use async_trait::async_trait;
    use serde_json::json;

    /// Answers `fetch` from a fixed endpoint table
    struct FixedGateway(Vec<(&'static str, ApiResult<Value>)>);

    #[async_trait]
    impl ResourceGateway for FixedGateway {
        async fn list(&self, _resource: Resource) -> ApiResult<Value> {
            Ok(json!([]))
        }

        async fn create(&self, _resource: Resource, _payload: Payload) -> ApiResult<Value> {
            Ok(json!({}))
        }

        async fn update(&self, _resource: Resource, _id: &str, _payload: Payload) -> ApiResult<Value> {
            Ok(json!({}))
        }

        async fn remove(&self, _resource: Resource, _id: &str) -> ApiResult<Value> {
            Ok(json!({}))
        }

        async fn verify_mechanic(&self, _id: &str, _verify: bool) -> ApiResult<Value> {
            Ok(json!({}))
        }

        async fn fetch(&self, endpoint: &str) -> ApiResult<Value> {
            match self.0.iter().find(|(path, _)| *path == endpoint) {
                Some((_, Ok(value))) => Ok(value.clone()),
                Some((_, Err(e))) => Err(ApiError::Status {
                    status: e.status().unwrap_or(500),
                    message: e.to_string(),
                }),
                None => Err(ApiError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_chat_history_lines() {
        let body = json!({"chat_history": [
            {"role": "user", "content": "Car won't start"},
            {"role": "assistant", "content": "Check the battery.\nThen the starter."}
        ]});
        let lines = DetailKind::ChatHistory.lines(body).unwrap();
        assert_eq!(
            lines,
            vec![
                DetailLine::labelled("user", "Car won't start"),
                DetailLine::labelled("assistant", "Check the battery."),
                DetailLine::plain("Then the starter."),
            ]
        );
    }

    #[test]
    fn test_record_hides_nulls_and_passwords() {
        let body = json!({"name": "Alice", "hashed_password": "x", "phone_number": null, "roles": ["admin", "user"]});
        let lines = DetailKind::Record.lines(body).unwrap();
        assert_eq!(
            lines,
            vec![
                DetailLine::labelled("name", "Alice"),
                DetailLine::labelled("roles", "admin,user"),
            ]
        );
        assert!(DetailKind::Record.lines(json!([1])).is_err());
    }

    #[test]
    fn test_summary_lists_counters_then_rows() {
        let kind = DetailKind::Summary {
            list: "actions",
            fields: &["action", "count"],
        };
        let body = json!({"total_actions": 12, "failed_actions": 2,
                          "actions": [{"action": "login", "count": 10}, {"action": "delete_user", "count": 2}]});
        let lines = kind.lines(body).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[..2].contains(&DetailLine::labelled("total_actions", "12")));
        assert!(lines[..2].contains(&DetailLine::labelled("failed_actions", "2")));
        assert_eq!(lines[2], DetailLine::plain("login | 10"));
        assert_eq!(lines[3], DetailLine::plain("delete_user | 2"));
    }

    #[tokio::test]
    async fn test_failed_section_does_not_hide_the_others() {
        let gateway = FixedGateway(vec![("/a", Ok(json!({"name": "Alice"})))]);
        let detail = load_detail(
            &gateway,
            "Alice".to_string(),
            vec![
                DetailRequest::new("Profile", "/a", DetailKind::Record),
                DetailRequest::new("Vehicles", "/missing", DetailKind::Record),
            ],
        )
        .await
        .unwrap();

        assert_eq!(detail.sections.len(), 2);
        assert_eq!(detail.sections[0].lines, vec![DetailLine::labelled("name", "Alice")]);
        assert_eq!(
            detail.sections[1].lines,
            vec![DetailLine::plain("Failed to load: Not Found")]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_fails_the_view() {
        let gateway = FixedGateway(vec![(
            "/a",
            Err(ApiError::Status {
                status: 401,
                message: "Not authenticated".to_string(),
            }),
        )]);
        let result = load_detail(
            &gateway,
            "x".to_string(),
            vec![DetailRequest::new("Profile", "/a", DetailKind::Record)],
        )
        .await;
        assert!(result.is_err_and(|e| e.is_unauthorized()));
    }
}
