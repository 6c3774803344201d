use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SchoolClass {
    pub id: Uuid,
    pub name: String,
    pub teacher_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<SchoolClass>> {
    let rows = sqlx::query_as::<_, SchoolClass>(
        r#"
        SELECT id, name, teacher_id, created_at
        FROM school_classes
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<SchoolClass>> {
    let row = sqlx::query_as::<_, SchoolClass>(
        r#"
        SELECT id, name, teacher_id, created_at
        FROM school_classes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Classes taught by the given user.
pub async fn by_teacher(db: &PgPool, teacher_id: Uuid) -> anyhow::Result<Vec<SchoolClass>> {
    let rows = sqlx::query_as::<_, SchoolClass>(
        r#"
        SELECT id, name, teacher_id, created_at
        FROM school_classes
        WHERE teacher_id = $1
        ORDER BY name
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// The class a student is enrolled in. A student is assumed to hold at most
/// one membership row; the first match wins.
pub async fn for_student(db: &PgPool, student_id: Uuid) -> anyhow::Result<Option<SchoolClass>> {
    let row = sqlx::query_as::<_, SchoolClass>(
        r#"
        SELECT sc.id, sc.name, sc.teacher_id, sc.created_at
        FROM school_classes sc
        JOIN school_class_students scs ON scs.school_class_id = sc.id
        WHERE scs.student_id = $1
        LIMIT 1
        "#,
    )
    .bind(student_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Removes the membership row(s) for a student. Returns the number of rows
/// removed; absence is not an error.
pub async fn remove_student_membership(db: &PgPool, student_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM school_class_students
        WHERE student_id = $1
        "#,
    )
    .bind(student_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
