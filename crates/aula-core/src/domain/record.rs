//! Stored record

use aula_shared::RecordId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Field name to value, as supplied by the caller.
pub type Fields = Map<String, Value>;

/// Names the store assigns itself; callers may not supply them as fields.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "owner_id"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    /// Creator's user id, only set in collections with creator ownership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat() {
        let mut fields = Fields::new();
        fields.insert("nome".into(), json!("Ana"));
        fields.insert("preco".into(), json!(10));
        let record = Record { id: 1, created_at: Utc::now(), owner_id: None, fields };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["nome"], json!("Ana"));
        assert_eq!(value["preco"], json!(10));
        assert!(value.get("owner_id").is_none());
        assert!(value.get("created_at").is_some());
    }
}
