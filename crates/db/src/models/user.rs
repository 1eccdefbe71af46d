use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use ts_rs::TS;

/// Dashboard login. The password hash never leaves the database layer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// What a login needs to check a password. Not serializable on purpose.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    /// `None` for accounts created by signup; a password is chosen later.
    pub password_hash: Option<String>,
    pub is_admin: bool,
}

const USER_COLUMNS: &str = "id, email, name, phone, is_admin, created_at";

impl User {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM auth.users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM auth.users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_credentials(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM auth.users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Users newest first, optionally only admins (`Some(true)`) or only non-admins.
    pub async fn list(pool: &PgPool, is_admin: Option<bool>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM auth.users
               WHERE ($1::boolean IS NULL OR is_admin = $1)
               ORDER BY created_at DESC"#
        ))
        .bind(is_admin)
        .fetch_all(pool)
        .await
    }

    pub async fn create<'e, E>(executor: E, data: &CreateUser) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO auth.users (email, name, phone, password_hash, is_admin)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(data.is_admin)
        .fetch_one(executor)
        .await
    }

    pub async fn promote_to_admin(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE auth.users SET is_admin = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM auth.users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
