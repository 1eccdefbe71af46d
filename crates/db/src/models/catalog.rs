use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Vehicle {
    pub id: i32,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ServiceCategory {
    pub id: i32,
    pub slug: String,
    pub name: String,
}

impl Vehicle {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>("SELECT id, slug, name FROM tenants.vehicles ORDER BY name")
            .fetch_all(pool)
            .await
    }
}

impl ServiceCategory {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(
            "SELECT id, slug, name FROM tenants.service_categories ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }
}
