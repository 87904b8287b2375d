//! Credential-bearing queries shared by both principal tables. Employees
//! and administrators are independent collections with the same credential
//! columns, so every query here is parameterized by the principal class.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalClass {
    Employee,
    Admin,
}

impl PrincipalClass {
    pub fn table(self) -> &'static str {
        match self {
            PrincipalClass::Employee => "employees",
            PrincipalClass::Admin => "admins",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrincipalClass::Employee => "employee",
            PrincipalClass::Admin => "admin",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PrincipalClass::Employee => "Employee",
            PrincipalClass::Admin => "Admin",
        }
    }
}

const PRINCIPAL_COLUMNS: &str = "id, name, email, password_hash, password_changed_at, created_at";

pub async fn find_by_email(
    pool: &PgPool,
    class: PrincipalClass,
    email: &str,
) -> Result<Option<Principal>, sqlx::Error> {
    let sql = format!(
        "SELECT {PRINCIPAL_COLUMNS} FROM \"{}\" WHERE email = $1",
        class.table()
    );
    sqlx::query_as::<_, Principal>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(
    pool: &PgPool,
    class: PrincipalClass,
    id: Uuid,
) -> Result<Option<Principal>, sqlx::Error> {
    let sql = format!(
        "SELECT {PRINCIPAL_COLUMNS} FROM \"{}\" WHERE id = $1",
        class.table()
    );
    sqlx::query_as::<_, Principal>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn issue_reset_code(
    pool: &PgPool,
    class: PrincipalClass,
    id: Uuid,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE \"{}\" SET password_reset_code = $2, password_reset_expires = $3, updated_at = now()
         WHERE id = $1",
        class.table()
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_reset_code(
    pool: &PgPool,
    class: PrincipalClass,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE \"{}\" SET password_reset_code = NULL, password_reset_expires = NULL, updated_at = now()
         WHERE id = $1",
        class.table()
    );
    sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(())
}

/// Atomically consume a reset code: the single conditional UPDATE replaces
/// the credential, clears the code, and stamps the password-change instant
/// one second in the past so a token minted in the same second still reads
/// as stale. Of two racing consumers at most one gets a row back.
pub async fn consume_reset_code(
    pool: &PgPool,
    class: PrincipalClass,
    code: &str,
    new_password_hash: &str,
) -> Result<Option<Principal>, sqlx::Error> {
    let sql = format!(
        "UPDATE \"{}\" SET password_hash = $2,
                password_changed_at = now() - interval '1 second',
                password_reset_code = NULL,
                password_reset_expires = NULL,
                updated_at = now()
         WHERE password_reset_code = $1 AND password_reset_expires > now()
         RETURNING {PRINCIPAL_COLUMNS}",
        class.table()
    );
    sqlx::query_as::<_, Principal>(&sql)
        .bind(code)
        .bind(new_password_hash)
        .fetch_optional(pool)
        .await
}
