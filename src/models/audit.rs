use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{record_id, AdminResource, Resource};
use crate::schema::{BadgeTone, CellContent, CellValue, ColumnDescriptor, TableRow};

column_keys! {
    pub enum AuditKey {
        Id => "id",
        Timestamp => "timestamp",
        UserId => "user_id",
        Action => "action",
        Resource => "resource",
        IpAddress => "ip_address",
        Status => "status",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for AuditLog {
    type Key = AuditKey;

    fn cell(&self, key: AuditKey) -> CellValue {
        match key {
            AuditKey::Id => record_id(&self.id, &self.mongo_id),
            AuditKey::Timestamp => self.timestamp.clone().into(),
            AuditKey::UserId => self.user_id.clone().into(),
            AuditKey::Action => self.action.clone().into(),
            AuditKey::Resource => self.resource.clone().into(),
            AuditKey::IpAddress => self.ip_address.clone().into(),
            AuditKey::Status => self.status.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(AuditKey::Id).string_form()
    }
}

impl AdminResource for AuditLog {
    const RESOURCE: Resource = Resource::Audit;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(AuditKey::Id, "ID").sortable(),
            ColumnDescriptor::new(AuditKey::Timestamp, "Timestamp").sortable(),
            ColumnDescriptor::new(AuditKey::UserId, "User").sortable(),
            ColumnDescriptor::new(AuditKey::Action, "Action").sortable(),
            ColumnDescriptor::new(AuditKey::Resource, "Resource").sortable(),
            ColumnDescriptor::new(AuditKey::IpAddress, "IP Address"),
            ColumnDescriptor::new(AuditKey::Status, "Status").with_render(|value, _| {
                let status = value.string_form();
                let tone = if status == "success" {
                    BadgeTone::Positive
                } else {
                    BadgeTone::Negative
                };
                CellContent::badge(status, tone)
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode_list;
    use serde_json::json;

    #[test]
    fn test_logs_accept_both_shapes() {
        let entry = json!({"id": "a1", "timestamp": "2024-05-01T10:00:00Z", "user_id": "admin",
                           "action": "delete_user", "resource": "users", "status": "failure"});
        let wrappers = Resource::Audit.list_wrappers();

        let bare: Vec<AuditLog> = decode_list(json!([entry.clone()]), wrappers).unwrap();
        let wrapped: Vec<AuditLog> = decode_list(json!({"logs": [entry]}), wrappers).unwrap();
        assert_eq!(bare, wrapped);

        assert_eq!(
            AuditLog::columns()[6].render_cell(&bare[0]),
            CellContent::badge("failure", BadgeTone::Negative)
        );
    }
}
