use db::{
    DBService,
    models::{service_area::ServiceArea, tenant::Tenant},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::validation::{Checks, ValidationError};

#[derive(Debug, Error)]
pub enum ServiceAreaError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Service area {0} already exists")]
    Duplicate(String),
    #[error("Service area {0} not found")]
    NotFound(String),
    #[error("Tenant not found or not approved")]
    TenantNotFound(i64),
}

/// One area as submitted by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ServiceAreaInput {
    pub city: String,
    pub state: String,
    pub zip: Option<i32>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub minimum: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceServiceAreas {
    pub service_areas: Vec<ServiceAreaInput>,
}

impl ServiceAreaInput {
    fn check(&self, checks: &mut Checks) {
        checks
            .person_name("city", self.city.trim())
            .state(self.state.trim())
            .require(
                self.zip.is_none_or(|z| (10000..=99999).contains(&z)),
                "zip must be a 5 digit number",
            )
            .require(self.minimum >= 0.0, "minimum must not be negative")
            .require(
                (0.0..=10.0).contains(&self.multiplier),
                "multiplier must be between 0 and 10",
            );
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::new();
        self.check(&mut checks);
        checks.finish()
    }

    pub fn into_area(self) -> ServiceArea {
        let mut area = ServiceArea::new(&self.city, &self.state, self.zip);
        area.primary = self.primary;
        area.minimum = self.minimum;
        area.multiplier = self.multiplier;
        area
    }
}

/// Validate a full replacement list and turn it into normalized areas.
pub fn prepare_replacement(inputs: Vec<ServiceAreaInput>) -> Result<Vec<ServiceArea>, ValidationError> {
    let mut checks = Checks::new();
    for input in &inputs {
        input.check(&mut checks);
    }
    checks.finish()?;

    let mut areas: Vec<ServiceArea> = inputs.into_iter().map(ServiceAreaInput::into_area).collect();
    if let Some(dup) = ServiceArea::find_duplicate(&areas) {
        return Err(ValidationError::single(format!(
            "Duplicate service area: {dup}"
        )));
    }
    ServiceArea::normalize(&mut areas);
    Ok(areas)
}

#[derive(Clone)]
pub struct ServiceAreaService {
    db: DBService,
}

impl ServiceAreaService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub fn list(&self, tenant: &Tenant) -> Vec<ServiceArea> {
        tenant.service_areas()
    }

    /// Apply `edit` to the stored list while holding the business row lock,
    /// so concurrent edits are serialized instead of overwriting each other.
    async fn modify<F>(&self, tenant_id: i64, edit: F) -> Result<Vec<ServiceArea>, ServiceAreaError>
    where
        F: FnOnce(&mut Vec<ServiceArea>) -> Result<(), ServiceAreaError>,
    {
        let mut tx = self.db.pool.begin().await?;
        let mut areas = Tenant::lock_service_areas(&mut *tx, tenant_id)
            .await?
            .ok_or(ServiceAreaError::TenantNotFound(tenant_id))?;
        edit(&mut areas)?;
        Tenant::update_service_areas(&mut *tx, tenant_id, &areas).await?;
        tx.commit().await?;
        Ok(areas)
    }

    pub async fn replace(
        &self,
        tenant: &Tenant,
        inputs: Vec<ServiceAreaInput>,
    ) -> Result<Vec<ServiceArea>, ServiceAreaError> {
        let replacement = prepare_replacement(inputs)?;
        let areas = self
            .modify(tenant.id, |areas| {
                *areas = replacement;
                Ok(())
            })
            .await?;
        info!(tenant_id = tenant.id, count = areas.len(), "Service areas replaced");
        Ok(areas)
    }

    pub async fn add(
        &self,
        tenant: &Tenant,
        input: ServiceAreaInput,
    ) -> Result<Vec<ServiceArea>, ServiceAreaError> {
        input.validate()?;
        let area = input.into_area();
        let id = area.id.clone();
        let areas = self
            .modify(tenant.id, |areas| add_area(areas, area))
            .await?;
        info!(tenant_id = tenant.id, area_id = %id, "Service area added");
        Ok(areas)
    }

    pub async fn remove(
        &self,
        tenant: &Tenant,
        area_id: &str,
    ) -> Result<Vec<ServiceArea>, ServiceAreaError> {
        let areas = self
            .modify(tenant.id, |areas| {
                ServiceArea::remove(areas, area_id)
                    .map(|_| ())
                    .ok_or_else(|| ServiceAreaError::NotFound(area_id.to_string()))
            })
            .await?;
        info!(tenant_id = tenant.id, area_id, "Service area removed");
        Ok(areas)
    }
}

fn add_area(areas: &mut Vec<ServiceArea>, area: ServiceArea) -> Result<(), ServiceAreaError> {
    if areas.iter().any(|a| a.derive_id() == area.id) {
        return Err(ServiceAreaError::Duplicate(area.id));
    }
    areas.push(area);
    ServiceArea::normalize(areas);
    Ok(())
}
