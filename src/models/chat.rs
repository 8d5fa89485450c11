use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{format_date, record_id, AdminResource, Resource};
use crate::schema::{CellContent, CellValue, ColumnDescriptor, TableRow};

column_keys! {
    pub enum ChatKey {
        Id => "_id",
        UserId => "user_id",
        Title => "chat_title",
        Preview => "preview",
        Messages => "chat_history",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub chat_title: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for ChatSession {
    type Key = ChatKey;

    fn cell(&self, key: ChatKey) -> CellValue {
        match key {
            ChatKey::Id => record_id(&self.id, &self.mongo_id),
            ChatKey::UserId => self.user_id.clone().into(),
            ChatKey::Title => self.chat_title.clone().into(),
            ChatKey::Preview => self.preview.clone().into(),
            ChatKey::Messages => CellValue::Int(self.chat_history.len() as i64),
            ChatKey::CreatedAt => self.created_at.clone().into(),
            ChatKey::UpdatedAt => self.updated_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(ChatKey::Id).string_form()
    }
}

impl AdminResource for ChatSession {
    const RESOURCE: Resource = Resource::Chats;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(ChatKey::Title, "Title")
                .sortable()
                .with_render(|value, _| match value.string_form() {
                    title if title.is_empty() => CellContent::text("Untitled chat"),
                    title => CellContent::text(title),
                }),
            ColumnDescriptor::new(ChatKey::UserId, "User"),
            ColumnDescriptor::new(ChatKey::Preview, "Preview"),
            ColumnDescriptor::new(ChatKey::Messages, "Messages").sortable(),
            ColumnDescriptor::new(ChatKey::UpdatedAt, "Updated")
                .sortable()
                .with_render(|value, _| format_date(value)),
        ]
    }

    fn display_name(&self) -> String {
        self.chat_title.clone().unwrap_or_else(|| self.row_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode_list;
    use serde_json::json;

    #[test]
    fn test_sessions_are_unwrapped() {
        let body = json!({"sessions": [
            {"_id": "c1", "user_id": "u1", "chat_title": "Engine noise",
             "chat_history": [{"role": "user", "content": "Hi"}, {"role": "assistant", "content": "Hello"}]},
            {"_id": "c2", "user_id": "u2"}
        ]});
        let rows: Vec<ChatSession> = decode_list(body, Resource::Chats.list_wrappers()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(ChatKey::Messages), CellValue::Int(2));
        assert_eq!(
            ChatSession::columns()[0].render_cell(&rows[1]),
            CellContent::text("Untitled chat")
        );
    }
}
