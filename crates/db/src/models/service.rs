use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres, types::Json};
use ts_rs::TS;

/// Row of `tenants.services`. Prices are stored in cents, durations in minutes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Service {
    pub id: i64,
    pub business_id: i64,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub base_price_cents: i64,
    pub pricing_unit: String,
    pub min_duration_min: i32,
    pub active: bool,
    pub vehicle_id: Option<i32>,
    pub service_category_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ServiceTier {
    pub id: i64,
    pub service_id: i64,
    pub name: String,
    pub price_delta_cents: i64,
    pub duration_min: Option<i32>,
    pub description: Option<String>,
    #[ts(as = "Vec<String>")]
    pub features: Json<Vec<String>>,
    pub popular: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateService {
    pub business_id: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub base_price_cents: i64,
    pub min_duration_min: i32,
    pub vehicle_id: Option<i32>,
    pub service_category_id: Option<i32>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateService {
    pub category: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price_cents: Option<i64>,
    pub min_duration_min: Option<i32>,
    pub active: Option<bool>,
    pub vehicle_id: Option<i32>,
    pub service_category_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateServiceTier {
    pub name: String,
    pub price_delta_cents: i64,
    pub duration_min: Option<i32>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub popular: bool,
}

impl Service {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM tenants.services WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_business(
        pool: &PgPool,
        business_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"SELECT * FROM tenants.services
               WHERE business_id = $1
               ORDER BY category, name"#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_filtered(
        pool: &PgPool,
        business_id: i64,
        vehicle_id: i32,
        service_category_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"SELECT * FROM tenants.services
               WHERE business_id = $1 AND vehicle_id = $2 AND service_category_id = $3
               ORDER BY created_at DESC, name ASC"#,
        )
        .bind(business_id)
        .bind(vehicle_id)
        .bind(service_category_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_business(pool: &PgPool, business_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tenants.services WHERE business_id = $1",
        )
        .bind(business_id)
        .fetch_one(pool)
        .await
    }

    pub async fn create<'e, E>(executor: E, data: &CreateService) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Service>(
            r#"INSERT INTO tenants.services (
                   business_id, category, name, description, base_price_cents,
                   pricing_unit, min_duration_min, active, vehicle_id, service_category_id
               )
               VALUES ($1, $2, $3, $4, $5, 'flat', $6, TRUE, $7, $8)
               RETURNING *"#,
        )
        .bind(data.business_id)
        .bind(&data.category)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.base_price_cents)
        .bind(data.min_duration_min)
        .bind(data.vehicle_id)
        .bind(data.service_category_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        data: &UpdateService,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Service>(
            r#"UPDATE tenants.services
               SET category = COALESCE($2, category),
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   base_price_cents = COALESCE($5, base_price_cents),
                   min_duration_min = COALESCE($6, min_duration_min),
                   active = COALESCE($7, active),
                   vehicle_id = COALESCE($8, vehicle_id),
                   service_category_id = COALESCE($9, service_category_id),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.category)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.base_price_cents)
        .bind(data.min_duration_min)
        .bind(data.active)
        .bind(data.vehicle_id)
        .bind(data.service_category_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tenants.services WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ServiceTier {
    pub async fn find_by_service(
        pool: &PgPool,
        service_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTier>(
            r#"SELECT * FROM tenants.service_tiers
               WHERE service_id = $1
               ORDER BY price_delta_cents ASC, id ASC"#,
        )
        .bind(service_id)
        .fetch_all(pool)
        .await
    }

    /// Tiers for several services in one round trip.
    pub async fn find_by_services(
        pool: &PgPool,
        service_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTier>(
            r#"SELECT * FROM tenants.service_tiers
               WHERE service_id = ANY($1)
               ORDER BY service_id, price_delta_cents ASC, id ASC"#,
        )
        .bind(service_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        service_id: i64,
        data: &CreateServiceTier,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceTier>(
            r#"INSERT INTO tenants.service_tiers (
                   service_id, name, price_delta_cents, duration_min, description, features, popular
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(service_id)
        .bind(&data.name)
        .bind(data.price_delta_cents)
        .bind(data.duration_min)
        .bind(&data.description)
        .bind(Json(&data.features))
        .bind(data.popular)
        .fetch_one(executor)
        .await
    }

    pub async fn delete_by_service<'e, E>(executor: E, service_id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tenants.service_tiers WHERE service_id = $1")
            .bind(service_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Tier as the booking UI consumes it: dollars and hours.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub duration: f64,
    pub features: Vec<String>,
    pub enabled: bool,
    pub popular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWithTiers {
    pub id: i64,
    pub name: String,
    pub base_price: f64,
    pub category: String,
    pub description: Option<String>,
    pub vehicle_id: Option<i32>,
    pub service_category_id: Option<i32>,
    pub active: bool,
    pub tiers: Vec<TierView>,
}

pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

pub fn minutes_to_hours(minutes: i32) -> f64 {
    minutes as f64 / 60.0
}

pub fn hours_to_minutes(hours: f64) -> i32 {
    (hours * 60.0).round() as i32
}

impl TierView {
    /// Display form of a tier. Writes keep prices far below `i64` limits, so the
    /// saturating sum only matters for rows stored before those bounds existed.
    pub fn project(service: &Service, tier: &ServiceTier) -> Self {
        let features = if tier.features.0.is_empty() {
            tier.description.clone().into_iter().collect()
        } else {
            tier.features.0.clone()
        };
        Self {
            id: tier.id,
            name: tier.name.clone(),
            price: cents_to_dollars(service.base_price_cents.saturating_add(tier.price_delta_cents)),
            duration: minutes_to_hours(tier.duration_min.unwrap_or(service.min_duration_min)),
            features,
            enabled: true,
            popular: tier.popular,
        }
    }
}

impl ServiceWithTiers {
    /// Combine a service with its tiers. Tiers belonging to other services are ignored.
    pub fn assemble(service: &Service, tiers: &[ServiceTier]) -> Self {
        let mut views: Vec<(i64, TierView)> = tiers
            .iter()
            .filter(|t| t.service_id == service.id)
            .map(|t| (t.price_delta_cents, TierView::project(service, t)))
            .collect();
        views.sort_by_key(|(delta, _)| *delta);
        Self {
            id: service.id,
            name: service.name.clone(),
            base_price: cents_to_dollars(service.base_price_cents),
            category: service.category.clone(),
            description: service.description.clone(),
            vehicle_id: service.vehicle_id,
            service_category_id: service.service_category_id,
            active: service.active,
            tiers: views.into_iter().map(|(_, v)| v).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service {
            id: 7,
            business_id: 1,
            category: "auto".into(),
            name: "Full Detail".into(),
            description: None,
            base_price_cents: 15000,
            pricing_unit: "flat".into(),
            min_duration_min: 90,
            active: true,
            vehicle_id: Some(1),
            service_category_id: Some(2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tier(id: i64, service_id: i64, delta: i64, duration: Option<i32>) -> ServiceTier {
        ServiceTier {
            id,
            service_id,
            name: format!("tier-{id}"),
            price_delta_cents: delta,
            duration_min: duration,
            description: Some("Hand wash".into()),
            features: Json(vec![]),
            popular: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_projection_saturates_on_extreme_prices() {
        let mut svc = service();
        svc.base_price_cents = i64::MAX;
        let view = TierView::project(&svc, &tier(1, 7, 5000, None));
        assert_eq!(view.price, cents_to_dollars(i64::MAX));
    }

    #[test]
    fn test_tier_projection_uses_dollars_and_hours() {
        let view = TierView::project(&service(), &tier(1, 7, 5000, None));
        assert_eq!(view.price, 200.0);
        assert_eq!(view.duration, 1.5);
        assert_eq!(view.features, vec!["Hand wash".to_string()]);

        let view = TierView::project(&service(), &tier(2, 7, 0, Some(240)));
        assert_eq!(view.price, 150.0);
        assert_eq!(view.duration, 4.0);
    }

    #[test]
    fn test_assemble_orders_tiers_and_skips_foreign_ones() {
        let tiers = vec![tier(1, 7, 15000, None), tier(2, 8, 0, None), tier(3, 7, 0, None)];
        let assembled = ServiceWithTiers::assemble(&service(), &tiers);
        let ids: Vec<_> = assembled.tiers.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(assembled.base_price, 150.0);
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(dollars_to_cents(19.99), 1999);
        assert_eq!(hours_to_minutes(1.5), 90);
        assert_eq!(cents_to_dollars(250), 2.5);
    }
}
