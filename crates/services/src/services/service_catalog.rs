//! Tenant service catalog: services priced per vehicle type and category,
//! each with a ladder of tiers.

use std::collections::HashMap;

use db::{
    DBService,
    models::{
        catalog::{ServiceCategory, Vehicle},
        service::{
            CreateService, CreateServiceTier, Service, ServiceTier, ServiceWithTiers,
            UpdateService, dollars_to_cents, hours_to_minutes,
        },
        tenant::Tenant,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::validation::{Checks, ValidationError};

const DEFAULT_DESCRIPTION: &str = "Offered by affiliate";
const DEFAULT_MIN_DURATION_MIN: i32 = 60;
/// Largest price accepted for a service or tier, $999,999.99.
pub const MAX_PRICE_CENTS: i64 = 99_999_999;
/// Name and price delta in cents of the tiers created when none are given.
const DEFAULT_TIERS: [(&str, i64); 3] = [("Basic", 0), ("Premium", 5000), ("Luxury", 15000)];

const VEHICLES: [(&str, i32); 7] = [
    ("cars", 1),
    ("trucks", 2),
    ("rvs", 3),
    ("boats", 4),
    ("motorcycles", 5),
    ("offroad", 6),
    ("other", 7),
];

const CATEGORIES: [(&str, i32); 7] = [
    ("interior", 1),
    ("exterior", 2),
    ("service-packages", 3),
    ("ceramic-coating", 4),
    ("paint-correction", 5),
    ("paint-protection-film", 6),
    ("addons", 7),
];

pub fn vehicle_id(slug: &str) -> Option<i32> {
    VEHICLES.iter().find(|(s, _)| *s == slug).map(|(_, id)| *id)
}

pub fn category_id(slug: &str) -> Option<i32> {
    CATEGORIES.iter().find(|(s, _)| *s == slug).map(|(_, id)| *id)
}

/// Value for the legacy free-text `category` column.
pub fn legacy_category(service_category_id: i32) -> &'static str {
    match service_category_id {
        4 => "ceramic",
        _ => "auto",
    }
}

#[derive(Debug, Error)]
pub enum ServiceCatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("tenant {0} not found")]
    TenantNotFound(i64),
    #[error("service {0} not found")]
    NotFound(i64),
    #[error("Unknown vehicle type: {0}")]
    UnknownVehicle(String),
    #[error("Unknown service category: {0}")]
    UnknownCategory(String),
}

/// Tier as entered in the dashboard: total price in dollars, duration in hours.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TierInput {
    pub name: String,
    pub price: f64,
    pub duration: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateServiceRequest {
    #[serde(alias = "affiliate_id")]
    pub tenant_id: i64,
    pub vehicle_id: Option<i32>,
    pub service_category_id: i32,
    #[serde(default)]
    pub base_price_cents: i64,
    pub name: String,
    pub description: Option<String>,
    pub min_duration_min: Option<i32>,
    pub tiers: Option<Vec<TierInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price_cents: Option<i64>,
    pub min_duration_min: Option<i32>,
    pub active: Option<bool>,
    pub vehicle_id: Option<i32>,
    pub service_category_id: Option<i32>,
    /// Replaces every existing tier when present.
    pub tiers: Option<Vec<TierInput>>,
}

fn check_tiers(checks: &mut Checks, tiers: Option<&[TierInput]>) {
    for tier in tiers.unwrap_or_default() {
        checks
            .len_between("tier name", &tier.name, 1, 255)
            .require(
                (0.0..=MAX_PRICE_CENTS as f64 / 100.0).contains(&tier.price),
                format!("tier price must be between 0 and {}", MAX_PRICE_CENTS as f64 / 100.0),
            )
            .require(
                tier.duration.is_none_or(|d| d > 0.0),
                "tier duration must be positive",
            );
    }
}

impl CreateServiceRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::new();
        checks
            .len_between("name", &self.name, 1, 255)
            .max_len("description", self.description.as_deref(), 2000)
            .require(
                (1..=7).contains(&self.service_category_id),
                "service_category_id must be between 1 and 7",
            )
            .require(
                self.vehicle_id.is_none_or(|v| (1..=7).contains(&v)),
                "vehicle_id must be between 1 and 7",
            )
            .require(
                (0..=MAX_PRICE_CENTS).contains(&self.base_price_cents),
                format!("base_price_cents must be between 0 and {MAX_PRICE_CENTS}"),
            )
            .require(
                self.min_duration_min.is_none_or(|m| m > 0),
                "min_duration_min must be positive",
            );
        check_tiers(&mut checks, self.tiers.as_deref());
        checks.finish()
    }
}

impl UpdateServiceRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks.len_between("name", name, 1, 255);
        }
        checks
            .max_len("description", self.description.as_deref(), 2000)
            .require(
                self.service_category_id.is_none_or(|c| (1..=7).contains(&c)),
                "service_category_id must be between 1 and 7",
            )
            .require(
                self.vehicle_id.is_none_or(|v| (1..=7).contains(&v)),
                "vehicle_id must be between 1 and 7",
            )
            .require(
                self.base_price_cents
                    .is_none_or(|p| (0..=MAX_PRICE_CENTS).contains(&p)),
                format!("base_price_cents must be between 0 and {MAX_PRICE_CENTS}"),
            );
        check_tiers(&mut checks, self.tiers.as_deref());
        checks.finish()
    }
}

impl TierInput {
    /// Stored form: the delta over the service base price, minutes.
    pub fn to_row(&self, base_price_cents: i64) -> CreateServiceTier {
        CreateServiceTier {
            name: self.name.trim().to_string(),
            price_delta_cents: dollars_to_cents(self.price) - base_price_cents,
            duration_min: self.duration.map(hours_to_minutes),
            description: self.description.clone(),
            features: self.features.clone(),
            popular: self.popular,
        }
    }
}

fn default_tiers(service_name: &str) -> Vec<CreateServiceTier> {
    DEFAULT_TIERS
        .iter()
        .map(|(tier, delta)| CreateServiceTier {
            name: tier.to_string(),
            price_delta_cents: *delta,
            duration_min: None,
            description: Some(format!("{tier} tier for {service_name} service")),
            features: Vec::new(),
            popular: false,
        })
        .collect()
}

#[derive(Clone)]
pub struct ServiceCatalogService {
    db: DBService,
}

impl ServiceCatalogService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ServiceCatalogError> {
        Ok(Vehicle::list(&self.db.pool).await?)
    }

    pub async fn categories(&self) -> Result<Vec<ServiceCategory>, ServiceCatalogError> {
        Ok(ServiceCategory::list(&self.db.pool).await?)
    }

    pub async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<Service>, ServiceCatalogError> {
        Ok(Service::find_by_business(&self.db.pool, tenant_id).await?)
    }

    pub async fn list_for(
        &self,
        tenant_id: i64,
        vehicle: &str,
        category: &str,
    ) -> Result<Vec<ServiceWithTiers>, ServiceCatalogError> {
        let vehicle_id =
            vehicle_id(vehicle).ok_or_else(|| ServiceCatalogError::UnknownVehicle(vehicle.to_string()))?;
        let category_id = category_id(category)
            .ok_or_else(|| ServiceCatalogError::UnknownCategory(category.to_string()))?;

        let services =
            Service::find_filtered(&self.db.pool, tenant_id, vehicle_id, category_id).await?;
        if services.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = services.iter().map(|s| s.id).collect();
        let tiers = ServiceTier::find_by_services(&self.db.pool, &ids).await?;

        let mut by_service: HashMap<i64, Vec<ServiceTier>> = HashMap::new();
        for tier in tiers {
            by_service.entry(tier.service_id).or_default().push(tier);
        }
        Ok(services
            .iter()
            .map(|s| {
                let tiers = by_service.get(&s.id).map(Vec::as_slice).unwrap_or_default();
                ServiceWithTiers::assemble(s, tiers)
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<ServiceWithTiers, ServiceCatalogError> {
        let service = Service::find_by_id(&self.db.pool, id)
            .await?
            .ok_or(ServiceCatalogError::NotFound(id))?;
        let tiers = ServiceTier::find_by_service(&self.db.pool, id).await?;
        Ok(ServiceWithTiers::assemble(&service, &tiers))
    }

    pub async fn create(
        &self,
        request: &CreateServiceRequest,
    ) -> Result<ServiceWithTiers, ServiceCatalogError> {
        request.validate()?;
        if Tenant::find_by_id(&self.db.pool, request.tenant_id)
            .await?
            .is_none()
        {
            return Err(ServiceCatalogError::TenantNotFound(request.tenant_id));
        }

        let name = request.name.trim();
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION);

        let mut tx = self.db.pool.begin().await?;
        let service = Service::create(
            &mut *tx,
            &CreateService {
                business_id: request.tenant_id,
                category: legacy_category(request.service_category_id).to_string(),
                name: name.to_string(),
                description: description.to_string(),
                base_price_cents: request.base_price_cents,
                min_duration_min: request.min_duration_min.unwrap_or(DEFAULT_MIN_DURATION_MIN),
                vehicle_id: request.vehicle_id,
                service_category_id: Some(request.service_category_id),
            },
        )
        .await?;

        let tier_rows = match request.tiers.as_deref() {
            Some(tiers) if !tiers.is_empty() => tiers
                .iter()
                .map(|t| t.to_row(service.base_price_cents))
                .collect(),
            _ => default_tiers(name),
        };
        let mut tiers = Vec::with_capacity(tier_rows.len());
        for row in &tier_rows {
            tiers.push(ServiceTier::create(&mut *tx, service.id, row).await?);
        }
        tx.commit().await?;

        info!(
            service_id = service.id,
            tenant_id = request.tenant_id,
            tiers = tiers.len(),
            "Service created"
        );
        Ok(ServiceWithTiers::assemble(&service, &tiers))
    }

    pub async fn update(
        &self,
        id: i64,
        request: &UpdateServiceRequest,
    ) -> Result<ServiceWithTiers, ServiceCatalogError> {
        request.validate()?;

        let mut tx = self.db.pool.begin().await?;
        let update = UpdateService {
            category: request
                .service_category_id
                .map(|c| legacy_category(c).to_string()),
            name: request.name.as_deref().map(|n| n.trim().to_string()),
            description: request.description.clone(),
            base_price_cents: request.base_price_cents,
            min_duration_min: request.min_duration_min,
            active: request.active,
            vehicle_id: request.vehicle_id,
            service_category_id: request.service_category_id,
        };
        let Some(service) = Service::update(&mut *tx, id, &update).await? else {
            return Err(ServiceCatalogError::NotFound(id));
        };

        if let Some(tiers) = &request.tiers {
            ServiceTier::delete_by_service(&mut *tx, id).await?;
            for tier in tiers {
                ServiceTier::create(&mut *tx, id, &tier.to_row(service.base_price_cents)).await?;
            }
        }
        tx.commit().await?;

        info!(service_id = id, replaced_tiers = request.tiers.is_some(), "Service updated");
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceCatalogError> {
        if Service::delete(&self.db.pool, id).await? == 0 {
            return Err(ServiceCatalogError::NotFound(id));
        }
        info!(service_id = id, "Service deleted");
        Ok(())
    }
}
