//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TransactionKind;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Wallet,
    Category,
    Income,
    Expense,
}

impl EntityType {
    pub fn for_kind(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => EntityType::Income,
            TransactionKind::Expense => EntityType::Expense,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Wallet => write!(f, "Wallet"),
            EntityType::Category => write!(f, "Category"),
            EntityType::Income => write!(f, "Income"),
            EntityType::Expense => write!(f, "Expense"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Full id of the affected row
    pub entity_id: String,

    /// Human-readable label (wallet or category name, transaction description)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entity_name: Option<String>,

    /// Owner the row belongs to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub before: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub after: Option<Value>,
}

impl AuditEntry {
    fn new(operation: Operation, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name: None,
            owner_id: None,
            before: None,
            after: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            after: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Create, entity_type, entity_id)
        }
    }

    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        Self {
            entity_name,
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
            ..Self::new(Operation::Update, entity_type, entity_id)
        }
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            before: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Delete, entity_type, entity_id)
        }
    }

    /// Attach the owning user
    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Top-level fields that differ between `before` and `after`
    ///
    /// Timestamp columns are skipped.
    pub fn changes(&self) -> Vec<String> {
        let (Some(Value::Object(before)), Some(Value::Object(after))) = (&self.before, &self.after)
        else {
            return Vec::new();
        };
        after
            .iter()
            .filter(|(key, _)| !key.ends_with("_at"))
            .filter_map(|(key, new)| {
                let old = before.get(key).unwrap_or(&Value::Null);
                (old != new).then(|| format!("{}: {} -> {}", key, short(old), short(new)))
            })
            .collect()
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let short_id: String = self.entity_id.chars().take(8).collect();
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            short_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        let changes = self.changes();
        if !changes.is_empty() {
            output.push_str(&format!("\n  Changes: {}", changes.join(", ")));
        }

        output
    }
}

fn short(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 40 => {
            format!("\"{}...\"", s.chars().take(37).collect::<String>())
        }
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(Operation::Delete.to_string(), "DELETE");
        assert_eq!(EntityType::Expense.to_string(), "Expense");
        assert_eq!(
            EntityType::for_kind(TransactionKind::Income),
            EntityType::Income
        );
    }

    #[test]
    fn test_create_and_delete_entries() {
        let data = json!({"name": "Main", "balance": 100});
        let created = AuditEntry::create(EntityType::Wallet, "w1", Some("Main".into()), &data)
            .owned_by("u1");
        assert_eq!(created.operation, Operation::Create);
        assert_eq!(created.owner_id.as_deref(), Some("u1"));
        assert!(created.before.is_none());

        let deleted = AuditEntry::delete(EntityType::Wallet, "w1", None, &data);
        assert!(deleted.before.is_some());
        assert!(deleted.after.is_none());
    }

    #[test]
    fn test_changes_skip_timestamps() {
        let entry = AuditEntry::update(
            EntityType::Wallet,
            "w1",
            Some("Main".into()),
            &json!({"name": "Main", "balance": 100, "updated_at": "a"}),
            &json!({"name": "Main", "balance": 70, "updated_at": "b"}),
        );
        assert_eq!(entry.changes(), vec!["balance: 100 -> 70".to_string()]);
        assert!(entry.format_human_readable().contains("Changes: balance: 100 -> 70"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let entry = AuditEntry::create(EntityType::Category, "c1", None, &json!({"name": "Salud"}));
        let text = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(back.entity_type, EntityType::Category);
        assert!(back.owner_id.is_none());
    }
}
