use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{format_date, record_id, AdminResource, Resource};
use crate::schema::{
    BadgeTone, CellContent, CellValue, ColumnDescriptor, FieldDescriptor, FieldType, TableRow,
};

column_keys! {
    pub enum ServiceKey {
        Id => "id",
        UserId => "user_id",
        MechanicId => "mechanic_id",
        VehicleId => "vehicle_id",
        Title => "title",
        Description => "description",
        Status => "status",
        Priority => "priority",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        CompletedAt => "completed_at",
    }
}

/// A service request between a user and a mechanic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub mechanic_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for ServiceRequest {
    type Key = ServiceKey;

    fn cell(&self, key: ServiceKey) -> CellValue {
        match key {
            ServiceKey::Id => record_id(&self.id, &self.mongo_id),
            ServiceKey::UserId => self.user_id.clone().into(),
            ServiceKey::MechanicId => self.mechanic_id.clone().into(),
            ServiceKey::VehicleId => self.vehicle_id.clone().into(),
            ServiceKey::Title => self.title.clone().into(),
            ServiceKey::Description => self.description.clone().into(),
            ServiceKey::Status => self.status.clone().into(),
            ServiceKey::Priority => self.priority.clone().into(),
            ServiceKey::CreatedAt => self.created_at.clone().into(),
            ServiceKey::UpdatedAt => self.updated_at.clone().into(),
            ServiceKey::CompletedAt => self.completed_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(ServiceKey::Id).string_form()
    }
}

fn status_badge(value: &CellValue) -> CellContent {
    let status = value.string_form();
    let tone = match status.as_str() {
        "completed" => BadgeTone::Positive,
        "cancelled" => BadgeTone::Negative,
        _ => BadgeTone::Neutral,
    };
    CellContent::badge(status.replace('_', " "), tone)
}

fn priority_badge(value: &CellValue) -> CellContent {
    let priority = value.string_form();
    let tone = match priority.as_str() {
        "high" => BadgeTone::Negative,
        "low" => BadgeTone::Positive,
        _ => BadgeTone::Neutral,
    };
    CellContent::badge(priority, tone)
}

impl AdminResource for ServiceRequest {
    const RESOURCE: Resource = Resource::Services;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(ServiceKey::Id, "ID"),
            ColumnDescriptor::new(ServiceKey::UserId, "User ID"),
            ColumnDescriptor::new(ServiceKey::MechanicId, "Mechanic ID"),
            ColumnDescriptor::new(ServiceKey::VehicleId, "Vehicle ID"),
            ColumnDescriptor::new(ServiceKey::Title, "Title").sortable(),
            ColumnDescriptor::new(ServiceKey::Description, "Description"),
            ColumnDescriptor::new(ServiceKey::Status, "Status")
                .sortable()
                .with_render(|value, _| status_badge(value)),
            ColumnDescriptor::new(ServiceKey::Priority, "Priority")
                .sortable()
                .with_render(|value, _| priority_badge(value)),
            ColumnDescriptor::new(ServiceKey::CreatedAt, "Created At")
                .sortable()
                .with_render(|value, _| format_date(value)),
            ColumnDescriptor::new(ServiceKey::UpdatedAt, "Updated At")
                .with_render(|value, _| format_date(value)),
            ColumnDescriptor::new(ServiceKey::CompletedAt, "Completed At")
                .with_render(|value, _| format_date(value)),
        ]
    }

    fn form_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("user_id", "User ID", FieldType::Text).required(),
            FieldDescriptor::new("mechanic_id", "Mechanic ID", FieldType::Text),
            FieldDescriptor::new("vehicle_id", "Vehicle ID", FieldType::Text).required(),
            FieldDescriptor::new("title", "Title", FieldType::Text).required(),
            FieldDescriptor::new("description", "Description", FieldType::Textarea).required(),
            FieldDescriptor::new("status", "Status", FieldType::Select)
                .required()
                .options([
                    ("pending", "Pending"),
                    ("in_progress", "In Progress"),
                    ("completed", "Completed"),
                    ("cancelled", "Cancelled"),
                ]),
            FieldDescriptor::new("priority", "Priority", FieldType::Select)
                .required()
                .options([("low", "Low"), ("medium", "Medium"), ("high", "High")]),
        ]
    }

    fn new_form_data() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("status".to_string(), Value::from("pending"));
        data.insert("priority".to_string(), Value::from("medium"));
        data
    }

    fn display_name(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.row_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Payload;
    use crate::schema::validate_fields;
    use serde_json::json;

    fn service() -> ServiceRequest {
        serde_json::from_value(json!({
            "id": "s1", "user_id": "u1", "vehicle_id": "v1", "title": "Brake pads",
            "description": "Squeaking", "status": "in_progress", "priority": "high",
            "created_at": "2024-03-04T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_badges() {
        let row = service();
        let columns = ServiceRequest::columns();
        assert_eq!(
            columns[6].render_cell(&row),
            CellContent::badge("in progress", BadgeTone::Neutral)
        );
        assert_eq!(
            columns[7].render_cell(&row),
            CellContent::badge("high", BadgeTone::Negative)
        );
    }

    #[tokio::test]
    async fn test_submission_is_json_of_the_whole_state() {
        let row = service();
        let mut submission = row.edit_form_data();
        submission.insert("status".to_string(), json!("completed"));

        let payload = ServiceRequest::encode_submission(&ServiceRequest::form_fields(), submission)
            .await
            .unwrap();
        let Payload::Json(body) = payload else {
            panic!("expected json, got {:?}", payload);
        };
        assert_eq!(body["status"], json!("completed"));
        assert_eq!(body["created_at"], json!("2024-03-04T12:00:00Z"));
    }

    #[test]
    fn test_form_schema_is_valid() {
        assert!(validate_fields(&ServiceRequest::form_fields()).is_ok());
    }
}
