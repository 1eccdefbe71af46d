//! Read side of the tenant directory: public profiles, listings and the
//! dashboard overview.

use db::{
    DBService,
    models::{
        review::Review,
        service::Service,
        service_area::ServiceArea,
        tenant::{ApplicationStatus, Industry, IndustryCount, Tenant},
        website_content::{WebsiteContent, WebsiteContentView},
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Tenant not found or not approved")]
    NotFound(String),
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ListTenantsQuery {
    pub status: Option<ApplicationStatus>,
    pub industry: Option<Industry>,
}

/// Public profile of an approved tenant with its site content.
#[derive(Debug, Clone, Serialize, TS)]
pub struct TenantProfile {
    pub tenant: Tenant,
    pub service_areas: Vec<ServiceArea>,
    pub content: WebsiteContentView,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DashboardOverview {
    pub tenant_id: i64,
    pub slug: String,
    pub business_name: String,
    pub services_count: i64,
    pub reviews_count: i64,
    pub average_rating: f64,
    pub service_areas_count: usize,
}

#[derive(Clone)]
pub struct TenantService {
    db: DBService,
}

impl TenantService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ListTenantsQuery) -> Result<Vec<Tenant>, TenantError> {
        let status = query.status.unwrap_or(ApplicationStatus::Approved);
        Ok(Tenant::list(&self.db.pool, status, query.industry).await?)
    }

    pub async fn industries(&self) -> Result<Vec<IndustryCount>, TenantError> {
        Ok(Tenant::industry_counts(&self.db.pool).await?)
    }

    pub async fn profile(&self, slug: &str) -> Result<TenantProfile, TenantError> {
        let tenant = Tenant::find_approved_by_slug(&self.db.pool, slug)
            .await?
            .ok_or_else(|| TenantError::NotFound(slug.to_string()))?;
        let content = WebsiteContent::find_by_business(&self.db.pool, tenant.id)
            .await?
            .map(WebsiteContentView::from)
            .unwrap_or_default();
        Ok(TenantProfile {
            service_areas: tenant.service_areas(),
            tenant,
            content,
        })
    }

    pub async fn dashboard_overview(&self, tenant: &Tenant) -> Result<DashboardOverview, TenantError> {
        let services_count = Service::count_by_business(&self.db.pool, tenant.id).await?;
        let reviews = Review::summary(&self.db.pool, &tenant.slug).await?;
        Ok(DashboardOverview {
            tenant_id: tenant.id,
            slug: tenant.slug.clone(),
            business_name: tenant.business_name.clone(),
            services_count,
            reviews_count: reviews.total_count,
            average_rating: reviews.average_rating,
            service_areas_count: tenant.service_areas().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_parses_wire_names() {
        let query: ListTenantsQuery =
            serde_json::from_str(r#"{"status":"pending","industry":"lawn-care"}"#).unwrap();
        assert_eq!(query.status, Some(ApplicationStatus::Pending));
        assert_eq!(query.industry, Some(Industry::LawnCare));

        let empty: ListTenantsQuery = serde_json::from_str("{}").unwrap();
        assert!(empty.status.is_none() && empty.industry.is_none());
    }
}
