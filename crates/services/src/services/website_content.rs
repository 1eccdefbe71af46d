use db::{
    DBService,
    models::{
        tenant::Tenant,
        website_content::{UpdateWebsiteContent, WebsiteContent, WebsiteContentView},
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;

use super::validation::{Checks, ValidationError};

#[derive(Debug, Error)]
pub enum WebsiteContentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("tenant '{0}' not found")]
    TenantNotFound(String),
}

/// Copy for the platform's own marketing site.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MainSiteContent {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub reviews_title: String,
    pub reviews_description: String,
    pub reviews_avg_rating: f64,
    pub reviews_total_ratings: i64,
    pub faq_title: String,
    pub faq_description: String,
    pub gallery_title: String,
    pub gallery_description: String,
}

pub fn main_site() -> MainSiteContent {
    MainSiteContent {
        hero_title: "Professional Mobile Detailing Services".into(),
        hero_subtitle: "Bringing the shine to your doorstep".into(),
        reviews_title: "Customer Reviews".into(),
        reviews_description: "What our customers say about our services".into(),
        reviews_avg_rating: 0.0,
        reviews_total_ratings: 0,
        faq_title: "Frequently Asked Questions".into(),
        faq_description: "Common questions about our services".into(),
        gallery_title: "Our Gallery".into(),
        gallery_description: "See our work in action".into(),
    }
}

pub fn validate_update(update: &UpdateWebsiteContent) -> Result<(), ValidationError> {
    let u = update;
    let mut checks = Checks::new();
    for (field, value) in [
        ("hero_title", &u.hero_title),
        ("services_title", &u.services_title),
        ("reviews_title", &u.reviews_title),
        ("faq_title", &u.faq_title),
    ] {
        checks.max_len(field, value.as_deref(), 255);
    }
    for (field, value) in [
        ("hero_subtitle", &u.hero_subtitle),
        ("services_subtitle", &u.services_subtitle),
        ("reviews_subtitle", &u.reviews_subtitle),
        ("faq_subtitle", &u.faq_subtitle),
    ] {
        checks.max_len(field, value.as_deref(), 500);
    }
    for (field, value) in [
        ("services_auto_description", &u.services_auto_description),
        ("services_marine_description", &u.services_marine_description),
        ("services_rv_description", &u.services_rv_description),
        ("services_ceramic_description", &u.services_ceramic_description),
        ("services_correction_description", &u.services_correction_description),
        ("services_ppf_description", &u.services_ppf_description),
    ] {
        checks.max_len(field, value.as_deref(), 2000);
    }
    checks
        .require(
            u.reviews_avg_rating.is_none_or(|r| (0.0..=5.0).contains(&r)),
            "reviews_avg_rating must be between 0 and 5",
        )
        .require(
            u.reviews_total_count.is_none_or(|c| c >= 0),
            "reviews_total_count must not be negative",
        );
    for item in u.faq_items.as_deref().unwrap_or_default() {
        checks
            .max_len("faq question", Some(item.question.as_str()), 500)
            .max_len("faq answer", Some(item.answer.as_str()), 2000);
    }
    checks.finish()
}

#[derive(Clone)]
pub struct WebsiteContentService {
    db: DBService,
    production: bool,
}

impl WebsiteContentService {
    /// Outside production, unknown tenants get empty content instead of a 404
    /// so local previews render.
    pub fn new(db: DBService, production: bool) -> Self {
        Self { db, production }
    }

    pub async fn get(&self, slug: &str) -> Result<WebsiteContentView, WebsiteContentError> {
        let Some(tenant) = Tenant::find_approved_by_slug(&self.db.pool, slug).await? else {
            if self.production {
                return Err(WebsiteContentError::TenantNotFound(slug.to_string()));
            }
            debug!(slug, "Unknown tenant, serving default content");
            return Ok(WebsiteContentView::default());
        };
        Ok(WebsiteContent::find_by_business(&self.db.pool, tenant.id)
            .await?
            .map(WebsiteContentView::from)
            .unwrap_or_default())
    }

    pub async fn upsert(
        &self,
        tenant: &Tenant,
        update: &UpdateWebsiteContent,
    ) -> Result<WebsiteContentView, WebsiteContentError> {
        validate_update(update)?;
        let saved = WebsiteContent::upsert(&self.db.pool, tenant.id, update).await?;
        info!(tenant_id = tenant.id, slug = %tenant.slug, "Website content saved");
        Ok(saved.into())
    }
}
