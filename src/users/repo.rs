use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::roles::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Login name; kept in lockstep with the email.
    pub user_name: String,
    pub image_uri: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// One list-row projection: user fields plus the (possibly absent) role label.
#[derive(Debug, Clone, FromRow)]
pub struct UserViewRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_uri: String,
    pub role: Option<String>,
}

/// Field set written on create.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub user_name: &'a str,
    pub image_uri: &'a str,
    pub password_hash: &'a str,
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, user_name, image_uri, password_hash, created_at";

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY last_name, first_name"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_views(db: &PgPool) -> anyhow::Result<Vec<UserViewRow>> {
    let rows = sqlx::query_as::<_, UserViewRow>(
        r#"
        SELECT u.id, u.first_name, u.last_name, u.email, u.image_uri, ur.role
        FROM users u
        LEFT JOIN user_roles ur ON ur.user_id = u.id
        ORDER BY u.last_name, u.first_name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
    Ok(user)
}

pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await?;
    Ok(user)
}

pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (first_name, last_name, email, user_name, image_uri, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new.first_name)
    .bind(new.last_name)
    .bind(new.email)
    .bind(new.user_name)
    .bind(new.image_uri)
    .bind(new.password_hash)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Overwrites the editable profile fields. Avatar and password are untouched.
pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    first_name: &str,
    last_name: &str,
    email: &str,
    user_name: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET first_name = $2, last_name = $3, email = $4, user_name = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(user_name)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// The role held by a user; first match wins when more than one row exists.
pub async fn role_of(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Role>> {
    let label = sqlx::query_scalar::<_, String>(
        "SELECT role FROM user_roles WHERE user_id = $1 LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(label.and_then(|l| l.parse().ok()))
}

pub async fn add_to_role(db: &PgPool, user_id: Uuid, role: Role) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role.as_str())
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_from_role(db: &PgPool, user_id: Uuid, role: Role) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
        .bind(user_id)
        .bind(role.as_str())
        .execute(db)
        .await?;
    Ok(())
}

/// The role set offered by the create/edit forms.
pub async fn list_roles(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM roles ORDER BY name")
        .fetch_all(db)
        .await?;
    Ok(names)
}
