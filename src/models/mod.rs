//! Admin resources: row types, their columns and forms, and their endpoints

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api::{ApiClient, ApiError, ApiResult, Payload};
use crate::schema::{BadgeTone, CellContent, CellValue, ColumnDescriptor, FieldDescriptor, TableRow};

/// Declare a row's column key enum together with its field names
macro_rules! column_keys {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $field:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::schema::ColumnKey for $name {
            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $field),+
                }
            }
        }
    };
}

pub mod audit;
pub mod chat;
pub mod detail;
pub mod feedback;
pub mod mechanic;
pub mod service;
pub mod user;
pub mod vehicle;

pub use audit::AuditLog;
pub use chat::ChatSession;
pub use detail::{load_detail, DetailKind, DetailLine, DetailRequest, DetailSection, RecordDetail};
pub use feedback::Feedback;
pub use mechanic::Mechanic;
pub use service::ServiceRequest;
pub use user::User;
pub use vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Resource {
    Users,
    Mechanics,
    Vehicles,
    Services,
    Feedback,
    Chats,
    Audit,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Users,
        Resource::Mechanics,
        Resource::Vehicles,
        Resource::Services,
        Resource::Feedback,
        Resource::Chats,
        Resource::Audit,
    ];

    /// Query key, also used for the sequencer
    pub fn key(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Mechanics => "mechanics",
            Resource::Vehicles => "vehicles",
            Resource::Services => "services",
            Resource::Feedback => "feedback",
            Resource::Chats => "chats",
            Resource::Audit => "audit",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Resource::Users => "User Management",
            Resource::Mechanics => "Mechanic Management",
            Resource::Vehicles => "Vehicle Management",
            Resource::Services => "Service Requests",
            Resource::Feedback => "Feedback",
            Resource::Chats => "Chat Sessions",
            Resource::Audit => "Audit Logs",
        }
    }

    /// Singular noun for messages ("User created successfully")
    pub fn noun(&self) -> &'static str {
        match self {
            Resource::Users => "User",
            Resource::Mechanics => "Mechanic",
            Resource::Vehicles => "Vehicle",
            Resource::Services => "Service",
            Resource::Feedback => "Feedback",
            Resource::Chats => "Chat session",
            Resource::Audit => "Audit log",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Resource::Users => "Create, edit and remove platform users",
            Resource::Mechanics => "Register, verify and manage mechanics",
            Resource::Vehicles => "Manage vehicles across all users",
            Resource::Services => "Track and update service requests",
            Resource::Feedback => "Browse and remove user feedback",
            Resource::Chats => "Read assistant chat sessions",
            Resource::Audit => "Review administrative activity",
        }
    }

    pub fn list_endpoint(&self) -> &'static str {
        match self {
            Resource::Users => "/auth/admin/users",
            Resource::Mechanics => "/mechanics",
            Resource::Vehicles => "/vehicles/admin/all",
            Resource::Services => "/mechanic-services/admin/all",
            Resource::Feedback => "/feedback/admin/all",
            Resource::Chats => "/chat/sessions",
            Resource::Audit => "/admin/audit/logs",
        }
    }

    /// Fields a list response may wrap its rows in
    pub fn list_wrappers(&self) -> &'static [&'static str] {
        match self {
            Resource::Chats => &["sessions", "items"],
            Resource::Audit => &["logs", "items"],
            _ => &["items"],
        }
    }

    pub fn create_endpoint(&self) -> Option<&'static str> {
        match self {
            Resource::Users => Some("/admin/users"),
            Resource::Mechanics => Some("/mechanics/register"),
            Resource::Vehicles => Some("/vehicles/admin"),
            Resource::Services => Some("/mechanic-services"),
            Resource::Feedback | Resource::Chats | Resource::Audit => None,
        }
    }

    pub fn update_endpoint(&self, id: &str) -> Option<(Method, String)> {
        match self {
            Resource::Users => Some((Method::PUT, format!("/auth/admin/users/{id}"))),
            Resource::Mechanics => Some((Method::PATCH, format!("/mechanics/{id}"))),
            Resource::Vehicles => Some((Method::PUT, format!("/vehicles/admin/{id}"))),
            Resource::Services => Some((Method::PUT, format!("/mechanic-services/{id}"))),
            Resource::Feedback | Resource::Chats | Resource::Audit => None,
        }
    }

    pub fn delete_endpoint(&self, id: &str) -> Option<String> {
        match self {
            Resource::Users => Some(format!("/auth/admin/users/{id}")),
            Resource::Mechanics => Some(format!("/mechanics/admin/{id}")),
            Resource::Vehicles => Some(format!("/vehicles/admin/{id}")),
            Resource::Services => Some(format!("/mechanic-services/{id}")),
            Resource::Feedback => Some(format!("/feedback/{id}")),
            Resource::Chats | Resource::Audit => None,
        }
    }

    pub fn can_create(&self) -> bool {
        self.create_endpoint().is_some()
    }

    pub fn can_update(&self) -> bool {
        self.update_endpoint("").is_some()
    }

    pub fn can_delete(&self) -> bool {
        self.delete_endpoint("").is_some()
    }

    pub fn can_verify(&self) -> bool {
        matches!(self, Resource::Mechanics)
    }

    /// Read-only requests behind one record's detail view
    pub fn detail_requests(&self, id: &str) -> Vec<DetailRequest> {
        match self {
            Resource::Users => vec![
                DetailRequest::new("Profile", format!("/auth/users/id/{id}"), DetailKind::Record),
                DetailRequest::new(
                    "Vehicles",
                    format!("/admin/vehicles/by-user/{id}"),
                    DetailKind::Rows {
                        wrappers: &["vehicles", "items"],
                        fields: &["brand", "model", "year", "registration_number"],
                    },
                ),
                DetailRequest::new(
                    "Chats",
                    format!("/admin/chats/user/{id}"),
                    DetailKind::Rows {
                        wrappers: &["sessions", "items"],
                        fields: &["chat_title", "created_at"],
                    },
                ),
            ],
            Resource::Mechanics => vec![DetailRequest::new(
                "Profile",
                format!("/mechanics/{id}"),
                DetailKind::Record,
            )],
            Resource::Chats => vec![DetailRequest::new(
                "Messages",
                format!("/chat/sessions/{id}/chat"),
                DetailKind::ChatHistory,
            )],
            Resource::Vehicles | Resource::Services | Resource::Feedback | Resource::Audit => {
                Vec::new()
            }
        }
    }

    /// Resource-wide summaries
    pub fn summary_requests(&self) -> Vec<DetailRequest> {
        match self {
            Resource::Audit => vec![
                DetailRequest::new(
                    "Actions",
                    "/admin/audit/actions",
                    DetailKind::Summary {
                        list: "actions",
                        fields: &["action", "count", "success_rate", "last_performed"],
                    },
                ),
                DetailRequest::new(
                    "User activity",
                    "/admin/audit/users",
                    DetailKind::Summary {
                        list: "users",
                        fields: &["username", "user_id", "total_actions", "risk_score", "last_activity"],
                    },
                ),
            ],
            _ => Vec::new(),
        }
    }

    pub fn has_details(&self) -> bool {
        !self.detail_requests("").is_empty()
    }

    pub fn has_summary(&self) -> bool {
        !self.summary_requests().is_empty()
    }

    /// Sequencer key for detail and summary fetches
    pub fn detail_key(&self) -> String {
        format!("{}:detail", self.key())
    }

    fn unsupported(&self, action: &str) -> ApiError {
        ApiError::Payload(format!("{} cannot be {}", self.title(), action))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rows from a list response: a bare array, or an object holding the array
/// under one of the wrapper fields
pub fn decode_list<R: DeserializeOwned>(value: Value, wrappers: &[&str]) -> ApiResult<Vec<R>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => wrappers
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                ApiError::Payload(format!(
                    "expected a list, or an object with one of: {}",
                    wrappers.join(", ")
                ))
            })?,
        Value::Null => Vec::new(),
        other => {
            return Err(ApiError::Payload(format!("expected a list, got {}", other)));
        }
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ApiError::from))
        .collect()
}

/// A row type the console can list and, where the API allows, edit
#[async_trait]
pub trait AdminResource: TableRow + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn columns() -> Vec<ColumnDescriptor<Self>>;

    fn form_fields() -> Vec<FieldDescriptor> {
        Vec::new()
    }

    /// Seed for the "add" form
    fn new_form_data() -> Map<String, Value> {
        Map::new()
    }

    /// Seed for the "edit" form: the row as the API sent it
    fn edit_form_data(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Name shown in confirmations
    fn display_name(&self) -> String {
        self.row_id()
    }

    /// Request body for a submitted form
    async fn encode_submission(
        fields: &[FieldDescriptor],
        submission: Map<String, Value>,
    ) -> ApiResult<Payload> {
        Payload::from_submission(fields, &submission).await
    }
}

/// Resource-level operations over the API
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn list(&self, resource: Resource) -> ApiResult<Value>;

    async fn create(&self, resource: Resource, payload: Payload) -> ApiResult<Value>;

    async fn update(&self, resource: Resource, id: &str, payload: Payload) -> ApiResult<Value>;

    async fn remove(&self, resource: Resource, id: &str) -> ApiResult<Value>;

    async fn verify_mechanic(&self, id: &str, verify: bool) -> ApiResult<Value>;

    /// Plain GET, for read-only detail views
    async fn fetch(&self, endpoint: &str) -> ApiResult<Value>;
}

#[async_trait]
impl ResourceGateway for ApiClient {
    async fn list(&self, resource: Resource) -> ApiResult<Value> {
        self.get(resource.list_endpoint()).await
    }

    async fn create(&self, resource: Resource, payload: Payload) -> ApiResult<Value> {
        let endpoint = resource
            .create_endpoint()
            .ok_or_else(|| resource.unsupported("created"))?;
        self.post(endpoint, payload).await
    }

    async fn update(&self, resource: Resource, id: &str, payload: Payload) -> ApiResult<Value> {
        let (method, endpoint) = resource
            .update_endpoint(id)
            .ok_or_else(|| resource.unsupported("updated"))?;
        self.send(method, &endpoint, payload).await
    }

    async fn remove(&self, resource: Resource, id: &str) -> ApiResult<Value> {
        let endpoint = resource
            .delete_endpoint(id)
            .ok_or_else(|| resource.unsupported("deleted"))?;
        self.delete(&endpoint).await
    }

    async fn verify_mechanic(&self, id: &str, verify: bool) -> ApiResult<Value> {
        self.post(&format!("/mechanics/{id}/verify?verify={verify}"), Payload::Empty)
            .await
    }

    async fn fetch(&self, endpoint: &str) -> ApiResult<Value> {
        self.get(endpoint).await
    }
}

/// Fetch and decode one resource's rows
pub async fn fetch_rows<R, G>(gateway: &G) -> ApiResult<Vec<R>>
where
    R: AdminResource,
    G: ResourceGateway + ?Sized,
{
    let value = gateway.list(R::RESOURCE).await?;
    decode_list(value, R::RESOURCE.list_wrappers())
}

/// `Jan 2, 2024` for ISO timestamps; anything unparseable is shown as is
pub fn format_date(value: &CellValue) -> CellContent {
    let text = value.string_form();
    if text.is_empty() {
        return CellContent::text("");
    }
    let parsed = chrono::DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.naive_utc())
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|dt| dt.date())
        .or_else(|_| chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d"));
    match parsed {
        Ok(date) => CellContent::text(date.format("%b %-d, %Y").to_string()),
        Err(_) => CellContent::text(text),
    }
}

/// Badge for a boolean flag, with the labels a column wants
pub fn flag_badge(value: &CellValue, yes: &str, no: &str, no_tone: BadgeTone) -> CellContent {
    match value {
        CellValue::Bool(true) => CellContent::badge(yes, BadgeTone::Positive),
        _ => CellContent::badge(no, no_tone),
    }
}

/// Row identity from `id` or `_id`, whichever the API sent
pub(crate) fn record_id(id: &Option<Value>, mongo_id: &Option<Value>) -> CellValue {
    id.as_ref()
        .or(mongo_id.as_ref())
        .map(CellValue::from_json)
        .unwrap_or(CellValue::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_bare_and_wrapped_lists() {
        let bare: Vec<Value> = decode_list(json!([{"a": 1}]), &["logs"]).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Value> =
            decode_list(json!({"logs": [{"a": 1}, {"a": 2}]}), &["logs"]).unwrap();
        assert_eq!(wrapped.len(), 2);

        let empty: Vec<Value> = decode_list(Value::Null, &["logs"]).unwrap();
        assert!(empty.is_empty());

        let wrong = decode_list::<Value>(json!({"sessions": []}), &["logs"]);
        assert!(matches!(wrong, Err(ApiError::Payload(_))));
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            Resource::Mechanics.update_endpoint("m1"),
            Some((Method::PATCH, "/mechanics/m1".to_string()))
        );
        assert_eq!(
            Resource::Users.delete_endpoint("u1").as_deref(),
            Some("/auth/admin/users/u1")
        );
        assert!(!Resource::Feedback.can_update());
        assert!(Resource::Feedback.can_delete());
        assert!(!Resource::Audit.can_delete());
        assert!(!Resource::Chats.can_create());
        assert!(Resource::Mechanics.can_verify());
    }

    #[test]
    fn test_detail_endpoints() {
        let chat = Resource::Chats.detail_requests("c1");
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].endpoint, "/chat/sessions/c1/chat");
        assert_eq!(chat[0].kind, DetailKind::ChatHistory);

        let user: Vec<String> = Resource::Users
            .detail_requests("u1")
            .into_iter()
            .map(|request| request.endpoint)
            .collect();
        assert_eq!(
            user,
            vec!["/auth/users/id/u1", "/admin/vehicles/by-user/u1", "/admin/chats/user/u1"]
        );
        assert_eq!(Resource::Mechanics.detail_requests("m1")[0].endpoint, "/mechanics/m1");

        assert!(!Resource::Vehicles.has_details());
        assert!(Resource::Audit.has_summary());
        assert!(!Resource::Users.has_summary());
        assert_eq!(Resource::Chats.detail_key(), "chats:detail");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(&CellValue::from("2024-01-02T10:30:00Z")),
            CellContent::text("Jan 2, 2024")
        );
        assert_eq!(
            format_date(&CellValue::from("2023-11-05T08:00:00.123456")),
            CellContent::text("Nov 5, 2023")
        );
        assert_eq!(format_date(&CellValue::from("yesterday")), CellContent::text("yesterday"));
        assert_eq!(format_date(&CellValue::Missing), CellContent::text(""));
    }
}
