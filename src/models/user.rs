use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{flag_badge, format_date, record_id, AdminResource, Resource};
use crate::schema::{BadgeTone, CellValue, ColumnDescriptor, FieldDescriptor, FieldType, TableRow};

column_keys! {
    pub enum UserKey {
        Id => "id",
        Name => "name",
        Email => "email",
        Phone => "phone_number",
        IsVerified => "is_verified",
        IsActive => "is_active",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for User {
    type Key = UserKey;

    fn cell(&self, key: UserKey) -> CellValue {
        match key {
            UserKey::Id => record_id(&self.id, &self.mongo_id),
            UserKey::Name => self.name.clone().into(),
            UserKey::Email => self.email.clone().into(),
            UserKey::Phone => self.phone_number.clone().into(),
            UserKey::IsVerified => self.is_verified.into(),
            UserKey::IsActive => self.is_active.into(),
            UserKey::CreatedAt => self.created_at.clone().into(),
            UserKey::UpdatedAt => self.updated_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(UserKey::Id).string_form()
    }
}

impl AdminResource for User {
    const RESOURCE: Resource = Resource::Users;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(UserKey::Name, "Name").sortable(),
            ColumnDescriptor::new(UserKey::Email, "Email").sortable(),
            ColumnDescriptor::new(UserKey::Phone, "Phone"),
            ColumnDescriptor::new(UserKey::IsVerified, "Verified").with_render(|value, _| {
                flag_badge(value, "Verified", "Unverified", BadgeTone::Neutral)
            }),
            ColumnDescriptor::new(UserKey::IsActive, "Status").with_render(|value, _| {
                flag_badge(value, "Active", "Inactive", BadgeTone::Negative)
            }),
            ColumnDescriptor::new(UserKey::CreatedAt, "Created")
                .sortable()
                .with_render(|value, _| format_date(value)),
        ]
    }

    fn form_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", "Full Name", FieldType::Text).required(),
            FieldDescriptor::new("email", "Email", FieldType::Email).required(),
            FieldDescriptor::new("phone_number", "Phone Number", FieldType::Text),
            FieldDescriptor::new("is_verified", "Verified", FieldType::Checkbox),
            FieldDescriptor::new("is_active", "Active", FieldType::Checkbox),
        ]
    }

    fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.row_id())
    }
}
