use std::{sync::Arc, time::Instant};

use db::DBService;
use services::services::{
    application_review::ApplicationReviewService,
    auth::{AuthService, AuthSettings},
    database_validator::DatabaseValidator,
    reviews::ReviewService, seo::SeoService, service_areas::ServiceAreaService,
    service_catalog::ServiceCatalogService, tenant_deletion::TenantDeletionService,
    tenant_provision::TenantProvisionService, tenants::TenantService,
    website_content::WebsiteContentService,
};

use crate::{config::Config, middleware::rate_limit::RateLimits};

/// Shared handler state. Every service is a thin handle over the same pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DBService,
    pub started_at: Instant,
    pub tenants: TenantService,
    pub provisioning: TenantProvisionService,
    pub applications: ApplicationReviewService,
    pub deletion: TenantDeletionService,
    pub catalog: ServiceCatalogService,
    pub reviews: ReviewService,
    pub content: WebsiteContentService,
    pub service_areas: ServiceAreaService,
    pub seo: SeoService,
    pub validator: DatabaseValidator,
    pub auth: AuthService,
    pub rate_limits: RateLimits,
}

impl AppState {
    pub fn new(config: Config, db: DBService) -> Self {
        let production = config.is_production();
        Self {
            tenants: TenantService::new(db.clone()),
            provisioning: TenantProvisionService::new(db.clone()),
            applications: ApplicationReviewService::new(db.clone()),
            deletion: TenantDeletionService::new(db.clone()),
            catalog: ServiceCatalogService::new(db.clone()),
            reviews: ReviewService::new(db.clone()),
            content: WebsiteContentService::new(db.clone(), production),
            service_areas: ServiceAreaService::new(db.clone()),
            seo: SeoService::new(db.clone()),
            validator: DatabaseValidator::new(db.pool.clone()),
            auth: AuthService::new(
                db.clone(),
                AuthSettings {
                    jwt_secret: config.jwt_secret.clone(),
                    token_ttl: config.token_ttl,
                    admin_emails: config.admin_emails.clone(),
                },
            ),
            rate_limits: RateLimits::new(),
            config: Arc::new(config),
            db,
            started_at: Instant::now(),
        }
    }
}
