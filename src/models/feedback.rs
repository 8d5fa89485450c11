use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{format_date, record_id, AdminResource, Resource};
use crate::schema::{BadgeTone, CellContent, CellValue, ColumnDescriptor, TableRow};

column_keys! {
    pub enum FeedbackKey {
        Id => "_id",
        UserId => "user_id",
        MechanicId => "mechanic_id",
        ServiceId => "service_id",
        Rating => "rating",
        Status => "status",
        Title => "title",
        Description => "description",
        IsEditable => "is_editable",
        AgeDays => "age_days",
        CreatedAt => "created_at",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub mechanic_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_editable: Option<bool>,
    #[serde(default)]
    pub age_days: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for Feedback {
    type Key = FeedbackKey;

    fn cell(&self, key: FeedbackKey) -> CellValue {
        match key {
            FeedbackKey::Id => record_id(&self.id, &self.mongo_id),
            FeedbackKey::UserId => self.user_id.clone().into(),
            FeedbackKey::MechanicId => self.mechanic_id.clone().into(),
            FeedbackKey::ServiceId => self.service_id.clone().into(),
            FeedbackKey::Rating => self.rating.into(),
            FeedbackKey::Status => self.status.clone().into(),
            FeedbackKey::Title => self.title.clone().into(),
            FeedbackKey::Description => self.description.clone().into(),
            FeedbackKey::IsEditable => self.is_editable.into(),
            FeedbackKey::AgeDays => self.age_days.into(),
            FeedbackKey::CreatedAt => self.created_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(FeedbackKey::Id).string_form()
    }
}

fn status_badge(value: &CellValue) -> CellContent {
    let status = value.string_form();
    let tone = match status.as_str() {
        "resolved" => BadgeTone::Positive,
        "flagged" | "deleted" => BadgeTone::Negative,
        _ => BadgeTone::Neutral,
    };
    CellContent::badge(status, tone)
}

impl AdminResource for Feedback {
    const RESOURCE: Resource = Resource::Feedback;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(FeedbackKey::UserId, "User"),
            ColumnDescriptor::new(FeedbackKey::MechanicId, "Mechanic"),
            ColumnDescriptor::new(FeedbackKey::Rating, "Rating")
                .sortable()
                .with_render(|value, _| match value {
                    CellValue::Missing => CellContent::text("N/A"),
                    other => CellContent::text(other.string_form()),
                }),
            ColumnDescriptor::new(FeedbackKey::Status, "Status")
                .sortable()
                .with_render(|value, _| status_badge(value)),
            ColumnDescriptor::new(FeedbackKey::Title, "Title").with_render(|value, _| {
                match value.string_form() {
                    title if title.is_empty() => CellContent::text("No Title"),
                    title => CellContent::text(title),
                }
            }),
            ColumnDescriptor::new(FeedbackKey::CreatedAt, "Created")
                .sortable()
                .with_render(|value, _| format_date(value)),
        ]
    }

    fn display_name(&self) -> String {
        self.title
            .clone()
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| format!("feedback {}", self.row_id()))
    }
}
