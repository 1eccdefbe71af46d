//! Self-service tenant signup: validates the application, reserves a unique
//! slug and creates the user, business and website content rows together.

use db::{
    DBService,
    models::{
        service_area::ServiceArea,
        tenant::{ApplicationStatus, CreateTenant, Industry, Tenant},
        user::{CreateUser, User},
        website_content::{FaqItem, InitialWebsiteContent, WebsiteContent},
    },
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use utils::slug::{tenant_slug, validate_slug, with_suffix};

use super::validation::{Checks, ValidationError};

/// Upper bound on `-n` suffixes tried before giving up on a slug.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("could not find a free slug for {0}")]
    SlugExhausted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BusinessAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HeroDefaults {
    pub h1: Option<String>,
    pub sub_title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct SectionDefaults {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ContentDefaults {
    pub hero: Option<HeroDefaults>,
    pub reviews: Option<SectionDefaults>,
    pub faq: Option<SectionDefaults>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SeoDefaults {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub twitter_image: Option<String>,
    pub canonical_path: Option<String>,
    pub robots: Option<String>,
}

/// Industry template content sent along with the signup form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct IndustryDefaults {
    pub content: Option<ContentDefaults>,
    pub seo: Option<SeoDefaults>,
    pub faq_items: Option<Vec<FaqItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub personal_phone: String,
    pub personal_email: String,
    pub business_name: String,
    pub business_phone: String,
    pub business_email: Option<String>,
    pub business_address: BusinessAddress,
    pub selected_plan: Plan,
    pub plan_price: f64,
    #[serde(default)]
    pub industry: Industry,
    pub defaults: Option<IndustryDefaults>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SignupResult {
    pub tenant_id: i64,
    pub slug: String,
    pub user_id: i64,
    pub website_url: String,
    pub dashboard_url: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let address = &self.business_address;
        let mut checks = Checks::new();
        checks
            .person_name("firstName", &self.first_name)
            .person_name("lastName", &self.last_name)
            .phone("personalPhone", &self.personal_phone)
            .email("personalEmail", &self.personal_email)
            .business_name(&self.business_name)
            .phone("businessPhone", &self.business_phone)
            .len_between("address", &address.address, 5, 255)
            .person_name("city", &address.city)
            .state(&address.state)
            .zip(&address.zip)
            .require(
                (0.0..=999_999.99).contains(&self.plan_price),
                "planPrice must be between 0 and 999999.99",
            );
        if let Some(email) = &self.business_email {
            checks.email("businessEmail", email);
        }
        checks.finish()
    }

    fn notes(&self) -> String {
        let a = &self.business_address;
        format!(
            "Plan: {} (${:.2}/month)\nAddress: {}, {}, {} {}",
            self.selected_plan, self.plan_price, a.address, a.city, a.state, a.zip
        )
    }

    /// Primary service area derived from the business address.
    fn initial_service_areas(&self) -> Vec<ServiceArea> {
        let a = &self.business_address;
        if a.city.trim().is_empty() || a.state.trim().is_empty() {
            return Vec::new();
        }
        let zip = a.zip.get(..5).and_then(|z| z.parse::<i32>().ok());
        let mut area = ServiceArea::new(&a.city, &a.state, zip);
        area.primary = true;
        vec![area]
    }

    fn initial_content(&self) -> InitialWebsiteContent {
        let defaults = self.defaults.clone().unwrap_or_default();
        let content = defaults.content.unwrap_or_default();
        let hero = content.hero.unwrap_or_default();
        let reviews = content.reviews.unwrap_or_default();
        let faq = content.faq.unwrap_or_default();
        let seo = defaults.seo.unwrap_or_default();
        let industry = self.industry.label();

        InitialWebsiteContent {
            hero_title: hero
                .h1
                .unwrap_or_else(|| format!("Welcome to {}", self.business_name)),
            hero_subtitle: hero
                .sub_title
                .unwrap_or_else(|| format!("Professional {industry} services")),
            reviews_title: reviews
                .title
                .unwrap_or_else(|| "What Our Customers Say".to_string()),
            reviews_subtitle: reviews.subtitle.unwrap_or_default(),
            faq_title: faq
                .title
                .unwrap_or_else(|| "Frequently Asked Questions".to_string()),
            faq_subtitle: faq.subtitle.unwrap_or_default(),
            faq_items: defaults.faq_items.unwrap_or_default(),
            seo_title: seo
                .title
                .unwrap_or_else(|| format!("{} | Professional {industry}", self.business_name)),
            seo_description: seo
                .description
                .unwrap_or_else(|| format!("Professional {industry} services")),
            seo_keywords: seo.keywords.unwrap_or_default(),
            seo_og_image: seo.og_image.unwrap_or_default(),
            seo_twitter_image: seo.twitter_image.unwrap_or_default(),
            seo_canonical_path: seo.canonical_path.unwrap_or_else(|| "/".to_string()),
            seo_robots: seo.robots.unwrap_or_else(|| "index,follow".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct TenantProvisionService {
    db: DBService,
}

impl TenantProvisionService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResult, ProvisionError> {
        request.validate()?;

        if User::find_by_email(&self.db.pool, &request.personal_email)
            .await?
            .is_some()
        {
            return Err(ProvisionError::EmailTaken);
        }

        let mut tx = self.db.pool.begin().await?;

        let base = tenant_slug(&request.business_name);
        let mut slug = None;
        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let candidate = with_suffix(&base, attempt);
            if !Tenant::slug_exists(&mut *tx, &candidate).await? {
                slug = Some(candidate);
                break;
            }
        }
        let slug = slug.ok_or_else(|| ProvisionError::SlugExhausted(base.clone()))?;
        validate_slug(&slug).map_err(|e| ValidationError::single(e.to_string()))?;

        let user = User::create(
            &mut *tx,
            &CreateUser {
                email: request.personal_email.clone(),
                name: format!("{} {}", request.first_name, request.last_name),
                phone: Some(request.personal_phone.clone()),
                password_hash: None,
                is_admin: false,
            },
        )
        .await?;

        let tenant = Tenant::create(
            &mut *tx,
            &CreateTenant {
                slug,
                business_name: request.business_name.clone(),
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                user_id: user.id,
                business_phone: request.business_phone.clone(),
                personal_phone: request.personal_phone.clone(),
                business_email: request
                    .business_email
                    .clone()
                    .unwrap_or_else(|| request.personal_email.clone()),
                personal_email: request.personal_email.clone(),
                industry: request.industry,
                application_status: ApplicationStatus::Approved,
                notes: request.notes(),
                service_areas: request.initial_service_areas(),
            },
        )
        .await?;

        WebsiteContent::create_initial(&mut *tx, tenant.id, &request.initial_content()).await?;

        tx.commit().await?;

        info!(
            tenant_id = tenant.id,
            slug = %tenant.slug,
            user_id = user.id,
            industry = %tenant.industry,
            "Tenant provisioned"
        );

        Ok(SignupResult {
            tenant_id: tenant.id,
            website_url: format!("/{}", tenant.slug),
            dashboard_url: format!("/{}/dashboard", tenant.slug),
            slug: tenant.slug,
            user_id: user.id,
        })
    }
}
