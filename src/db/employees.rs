use sqlx::PgPool;
use uuid::Uuid;

use crate::models::EmployeeExportRow;

/// Rows for bulk export, department resolved to its name, optionally
/// restricted to one department. A dangling department reference exports as
/// an empty department name.
pub async fn list_for_export(
    pool: &PgPool,
    department_id: Option<Uuid>,
) -> Result<Vec<EmployeeExportRow>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeExportRow>(
        "SELECT e.name, e.email, COALESCE(d.name, '') AS department, e.salary::text AS salary
         FROM employees e
         LEFT JOIN departments d ON d.id = e.department_id
         WHERE $1::uuid IS NULL OR e.department_id = $1
         ORDER BY e.created_at DESC",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}
