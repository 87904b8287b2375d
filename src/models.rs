use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An authenticated identity: one row from either principal table. The
/// credential hash never serializes and is scrubbed before the principal is
/// attached to a request.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// True when the stored credential changed after the token was issued,
    /// which invalidates the token.
    pub fn changed_password_after(&self, token_issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => token_issued_at < changed_at.timestamp(),
            None => false,
        }
    }

    pub fn scrubbed(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}

/// One employee row flattened for CSV/Excel/PDF export, department resolved
/// to its name.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EmployeeExportRow {
    pub name: String,
    pub email: String,
    pub department: String,
    pub salary: String,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn principal(changed_at: Option<DateTime<Utc>>) -> Principal {
        Principal {
            id: Uuid::now_v7(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            password_changed_at: changed_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_issued_before_password_change_is_stale() {
        let changed = Utc::now();
        let p = principal(Some(changed));
        assert!(p.changed_password_after((changed - Duration::minutes(5)).timestamp()));
        assert!(!p.changed_password_after((changed + Duration::minutes(5)).timestamp()));
    }

    #[test]
    fn never_changed_password_is_never_stale() {
        assert!(!principal(None).changed_password_after(0));
    }

    #[test]
    fn serialized_principal_has_no_credential() {
        let json = serde_json::to_value(principal(None)).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
