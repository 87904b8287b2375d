//! Generic record handler: one implementation of list/get/create/update/
//! delete bound per entity at startup. The operation bodies never inspect
//! which entity they serve; everything entity-specific comes from the
//! schema metadata and the optional relation expansion.

use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password;
use crate::error::AppError;
use crate::query::{QueryFeatures, expand_expr};
use crate::schema::{self, Expand, Schema};
use crate::validate::{self, Mode, Violation};

pub struct RecordSet {
    schema: &'static Schema,
    expand: Option<&'static Expand>,
}

pub static EMPLOYEES: RecordSet = RecordSet {
    schema: &schema::EMPLOYEE,
    expand: Some(&schema::DEPARTMENT_NAME),
};

pub static DEPARTMENTS: RecordSet = RecordSet {
    schema: &schema::DEPARTMENT,
    expand: None,
};

pub static ADMINS: RecordSet = RecordSet {
    schema: &schema::ADMIN,
    expand: None,
};

impl RecordSet {
    pub fn entity(&self) -> &'static str {
        self.schema.entity
    }

    /// Build the query via the feature builder, execute it once, and return
    /// the matching documents in order.
    pub async fn list(
        &self,
        pool: &PgPool,
        params: &std::collections::HashMap<String, String>,
    ) -> Result<Vec<Value>, AppError> {
        let features = QueryFeatures::from_params(self.schema, params)?;
        let sql = features.to_sql(self.expand);

        let mut query = sqlx::query_scalar::<_, Value>(&sql.query);
        for param in &sql.params {
            query = query.bind(param);
        }
        let docs = query.fetch_all(pool).await.map_err(|e| self.map_db_error(e))?;
        Ok(docs)
    }

    pub async fn get_one(&self, pool: &PgPool, id: Uuid) -> Result<Value, AppError> {
        let mut doc_expr = self.schema.full_doc_expr("t");
        if let Some(expand) = self.expand {
            doc_expr = format!("{doc_expr} || {}", expand_expr("t", expand));
        }
        let sql = format!(
            "SELECT {doc_expr} FROM \"{}\" t WHERE t.\"id\" = $1",
            self.schema.table
        );

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| self.not_found())
    }

    pub async fn create_one(
        &self,
        pool: &PgPool,
        attrs: Map<String, Value>,
        actor: Option<&str>,
    ) -> Result<Value, AppError> {
        let violations = validate::validate(self.schema, &attrs, Mode::Create);
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let doc = self.insert(pool, &attrs).await?;
        self.log_mutation(actor, "created", &doc);
        Ok(doc)
    }

    pub async fn update_one(
        &self,
        pool: &PgPool,
        id: Uuid,
        attrs: Map<String, Value>,
        actor: Option<&str>,
    ) -> Result<Value, AppError> {
        let violations = validate::validate(self.schema, &attrs, Mode::Update);
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let values = self.prepare(&attrs)?;
        let mut sets: Vec<String> = Vec::with_capacity(values.len() + 1);
        for (i, (name, cast, _)) in values.iter().enumerate() {
            sets.push(format!("\"{name}\" = ${}{cast}", i + 1));
        }
        sets.push("\"updated_at\" = now()".to_string());

        let sql = format!(
            "UPDATE \"{table}\" SET {sets} WHERE \"id\" = ${id_param} RETURNING {doc}",
            table = self.schema.table,
            sets = sets.join(", "),
            id_param = values.len() + 1,
            doc = self.schema.full_doc_expr(self.schema.table),
        );

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for (_, _, value) in &values {
            query = query.bind(value);
        }
        let doc = query
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| self.map_db_error(e))?
            .ok_or_else(|| self.not_found())?;

        self.log_mutation(actor, "updated", &doc);
        Ok(doc)
    }

    pub async fn delete_one(
        &self,
        pool: &PgPool,
        id: Uuid,
        actor: Option<&str>,
    ) -> Result<(), AppError> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"id\" = $1 RETURNING \"id\"",
            self.schema.table
        );
        let deleted = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| self.not_found())?;

        if let Some(actor) = actor {
            tracing::info!("{actor} deleted {}: {deleted}", self.schema.entity);
        }
        Ok(())
    }

    /// Insert a batch atomically: every row is validated first and all
    /// inserts share one transaction, so a bad row persists nothing.
    pub async fn create_many(
        &self,
        pool: &PgPool,
        rows: Vec<Map<String, Value>>,
        actor: Option<&str>,
    ) -> Result<Vec<Value>, AppError> {
        let mut violations: Vec<Violation> = Vec::new();
        for (i, attrs) in rows.iter().enumerate() {
            for v in validate::validate(self.schema, attrs, Mode::Create) {
                violations.push(Violation {
                    field: format!("row {}: {}", i + 1, v.field),
                    message: v.message,
                });
            }
        }
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let mut tx = pool.begin().await?;
        let mut docs = Vec::with_capacity(rows.len());
        for attrs in &rows {
            let doc = self.insert_with(&mut *tx, attrs).await?;
            docs.push(doc);
        }
        tx.commit().await?;

        if let Some(actor) = actor {
            tracing::info!(
                "{actor} imported {} {} records",
                docs.len(),
                self.schema.entity
            );
        }
        Ok(docs)
    }

    async fn insert(&self, pool: &PgPool, attrs: &Map<String, Value>) -> Result<Value, AppError> {
        self.insert_with(pool, attrs).await
    }

    async fn insert_with<'e, E: sqlx::PgExecutor<'e>>(
        &self,
        executor: E,
        attrs: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let values = self.prepare(attrs)?;

        let columns: Vec<String> = values.iter().map(|(n, _, _)| format!("\"{n}\"")).collect();
        let placeholders: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (_, cast, _))| format!("${}{cast}", i + 1))
            .collect();

        let sql = format!(
            "INSERT INTO \"{table}\" ({columns}) VALUES ({placeholders}) RETURNING {doc}",
            table = self.schema.table,
            columns = columns.join(", "),
            placeholders = placeholders.join(", "),
            doc = self.schema.full_doc_expr(self.schema.table),
        );

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for (_, _, value) in &values {
            query = query.bind(value);
        }
        query
            .fetch_one(executor)
            .await
            .map_err(|e| self.map_db_error(e))
    }

    /// Turn validated input attributes into (column, cast, text value)
    /// triples, hashing the credential into `password_hash` when present.
    fn prepare(
        &self,
        attrs: &Map<String, Value>,
    ) -> Result<Vec<(&'static str, &'static str, String)>, AppError> {
        let mut values = Vec::new();
        for col in self.schema.columns.iter().filter(|c| c.writable) {
            let Some(value) = attrs.get(col.name) else {
                continue;
            };
            let Some(text) = text_value(value) else {
                continue;
            };
            values.push((col.name, col.ty.cast(), text));
        }

        if self.schema.has_credentials {
            if let Some(plain) = attrs.get("password").and_then(Value::as_str) {
                let hash = password::hash(plain).map_err(AppError::Internal)?;
                values.push(("password_hash", "", hash));
            }
        }

        Ok(values)
    }

    fn map_db_error(&self, err: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = self
                    .schema
                    .columns
                    .iter()
                    .find(|c| c.unique)
                    .map(|c| c.name)
                    .unwrap_or("id");
                return AppError::Validation(vec![Violation {
                    field: field.to_string(),
                    message: "already in use".to_string(),
                }]);
            }
            if db_err.is_check_violation() {
                return AppError::Validation(vec![Violation {
                    field: self.schema.entity.to_lowercase(),
                    message: "violates a range constraint".to_string(),
                }]);
            }
        }
        AppError::Database(err)
    }

    fn not_found(&self) -> AppError {
        AppError::NotFound(format!("{} not found", self.schema.entity))
    }

    fn log_mutation(&self, actor: Option<&str>, verb: &str, doc: &Value) {
        if let Some(actor) = actor {
            let id = doc.get("id").and_then(Value::as_str).unwrap_or("?");
            tracing::info!("{actor} {verb} {}: {id}", self.schema.entity);
        }
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
