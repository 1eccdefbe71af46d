use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres, types::Json};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

/// Row of `website.content`, one per tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WebsiteContent {
    pub business_id: i64,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub services_title: Option<String>,
    pub services_subtitle: Option<String>,
    pub services_auto_description: Option<String>,
    pub services_marine_description: Option<String>,
    pub services_rv_description: Option<String>,
    pub services_ceramic_description: Option<String>,
    pub services_correction_description: Option<String>,
    pub services_ppf_description: Option<String>,
    pub reviews_title: Option<String>,
    pub reviews_subtitle: Option<String>,
    pub reviews_avg_rating: Option<f64>,
    pub reviews_total_count: Option<i32>,
    pub faq_title: Option<String>,
    pub faq_subtitle: Option<String>,
    #[ts(as = "Vec<FaqItem>")]
    pub faq_items: Json<Vec<FaqItem>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub seo_og_image: Option<String>,
    pub seo_twitter_image: Option<String>,
    pub seo_canonical_path: Option<String>,
    pub seo_robots: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content as served to the site renderer, with every gap filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct WebsiteContentView {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub services_title: String,
    pub services_subtitle: String,
    pub services_auto_description: String,
    pub services_marine_description: String,
    pub services_rv_description: String,
    pub services_ceramic_description: String,
    pub services_correction_description: String,
    pub services_ppf_description: String,
    pub reviews_title: String,
    pub reviews_subtitle: String,
    pub reviews_avg_rating: f64,
    pub reviews_total_count: i32,
    pub faq_title: String,
    pub faq_subtitle: String,
    pub faq_items: Vec<FaqItem>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub seo_og_image: String,
    pub seo_twitter_image: String,
    pub seo_canonical_path: String,
    pub seo_robots: String,
}

impl From<WebsiteContent> for WebsiteContentView {
    fn from(c: WebsiteContent) -> Self {
        Self {
            hero_title: c.hero_title.unwrap_or_default(),
            hero_subtitle: c.hero_subtitle.unwrap_or_default(),
            services_title: c.services_title.unwrap_or_default(),
            services_subtitle: c.services_subtitle.unwrap_or_default(),
            services_auto_description: c.services_auto_description.unwrap_or_default(),
            services_marine_description: c.services_marine_description.unwrap_or_default(),
            services_rv_description: c.services_rv_description.unwrap_or_default(),
            services_ceramic_description: c.services_ceramic_description.unwrap_or_default(),
            services_correction_description: c.services_correction_description.unwrap_or_default(),
            services_ppf_description: c.services_ppf_description.unwrap_or_default(),
            reviews_title: c.reviews_title.unwrap_or_default(),
            reviews_subtitle: c.reviews_subtitle.unwrap_or_default(),
            reviews_avg_rating: c.reviews_avg_rating.unwrap_or_default(),
            reviews_total_count: c.reviews_total_count.unwrap_or_default(),
            faq_title: c.faq_title.unwrap_or_default(),
            faq_subtitle: c.faq_subtitle.unwrap_or_default(),
            faq_items: c.faq_items.0,
            seo_title: c.seo_title.unwrap_or_default(),
            seo_description: c.seo_description.unwrap_or_default(),
            seo_keywords: c.seo_keywords.unwrap_or_default(),
            seo_og_image: c.seo_og_image.unwrap_or_default(),
            seo_twitter_image: c.seo_twitter_image.unwrap_or_default(),
            seo_canonical_path: c.seo_canonical_path.unwrap_or_default(),
            seo_robots: c.seo_robots.unwrap_or_default(),
        }
    }
}

/// Dashboard edit payload. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateWebsiteContent {
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub services_title: Option<String>,
    pub services_subtitle: Option<String>,
    pub services_auto_description: Option<String>,
    pub services_marine_description: Option<String>,
    pub services_rv_description: Option<String>,
    pub services_ceramic_description: Option<String>,
    pub services_correction_description: Option<String>,
    pub services_ppf_description: Option<String>,
    pub reviews_title: Option<String>,
    pub reviews_subtitle: Option<String>,
    pub reviews_avg_rating: Option<f64>,
    pub reviews_total_count: Option<i32>,
    pub faq_title: Option<String>,
    pub faq_subtitle: Option<String>,
    pub faq_items: Option<Vec<FaqItem>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub seo_og_image: Option<String>,
    pub seo_twitter_image: Option<String>,
    pub seo_canonical_path: Option<String>,
    pub seo_robots: Option<String>,
}

/// Content written when a tenant is provisioned.
#[derive(Debug, Clone)]
pub struct InitialWebsiteContent {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub reviews_title: String,
    pub reviews_subtitle: String,
    pub faq_title: String,
    pub faq_subtitle: String,
    pub faq_items: Vec<FaqItem>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub seo_og_image: String,
    pub seo_twitter_image: String,
    pub seo_canonical_path: String,
    pub seo_robots: String,
}

impl WebsiteContent {
    pub async fn find_by_business(
        pool: &PgPool,
        business_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WebsiteContent>(
            "SELECT * FROM website.content WHERE business_id = $1",
        )
        .bind(business_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create_initial<'e, E>(
        executor: E,
        business_id: i64,
        data: &InitialWebsiteContent,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, WebsiteContent>(
            r#"INSERT INTO website.content (
                   business_id, hero_title, hero_subtitle, reviews_title, reviews_subtitle,
                   faq_title, faq_subtitle, faq_items, seo_title, seo_description, seo_keywords,
                   seo_og_image, seo_twitter_image, seo_canonical_path, seo_robots
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
               RETURNING *"#,
        )
        .bind(business_id)
        .bind(&data.hero_title)
        .bind(&data.hero_subtitle)
        .bind(&data.reviews_title)
        .bind(&data.reviews_subtitle)
        .bind(&data.faq_title)
        .bind(&data.faq_subtitle)
        .bind(Json(&data.faq_items))
        .bind(&data.seo_title)
        .bind(&data.seo_description)
        .bind(&data.seo_keywords)
        .bind(&data.seo_og_image)
        .bind(&data.seo_twitter_image)
        .bind(&data.seo_canonical_path)
        .bind(&data.seo_robots)
        .fetch_one(executor)
        .await
    }

    /// Insert or merge. Fields left as `None` keep whatever is stored.
    pub async fn upsert(
        pool: &PgPool,
        business_id: i64,
        data: &UpdateWebsiteContent,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WebsiteContent>(
            r#"INSERT INTO website.content (
                   business_id, hero_title, hero_subtitle, services_title, services_subtitle,
                   services_auto_description, services_marine_description, services_rv_description,
                   services_ceramic_description, services_correction_description,
                   services_ppf_description, reviews_title, reviews_subtitle, reviews_avg_rating,
                   reviews_total_count, faq_title, faq_subtitle, faq_items, seo_title,
                   seo_description, seo_keywords, seo_og_image, seo_twitter_image,
                   seo_canonical_path, seo_robots
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                       $17, COALESCE($18, '[]'::jsonb), $19, $20, $21, $22, $23, $24, $25)
               ON CONFLICT (business_id) DO UPDATE SET
                   hero_title = COALESCE($2, website.content.hero_title),
                   hero_subtitle = COALESCE($3, website.content.hero_subtitle),
                   services_title = COALESCE($4, website.content.services_title),
                   services_subtitle = COALESCE($5, website.content.services_subtitle),
                   services_auto_description = COALESCE($6, website.content.services_auto_description),
                   services_marine_description = COALESCE($7, website.content.services_marine_description),
                   services_rv_description = COALESCE($8, website.content.services_rv_description),
                   services_ceramic_description = COALESCE($9, website.content.services_ceramic_description),
                   services_correction_description = COALESCE($10, website.content.services_correction_description),
                   services_ppf_description = COALESCE($11, website.content.services_ppf_description),
                   reviews_title = COALESCE($12, website.content.reviews_title),
                   reviews_subtitle = COALESCE($13, website.content.reviews_subtitle),
                   reviews_avg_rating = COALESCE($14, website.content.reviews_avg_rating),
                   reviews_total_count = COALESCE($15, website.content.reviews_total_count),
                   faq_title = COALESCE($16, website.content.faq_title),
                   faq_subtitle = COALESCE($17, website.content.faq_subtitle),
                   faq_items = COALESCE($18, website.content.faq_items),
                   seo_title = COALESCE($19, website.content.seo_title),
                   seo_description = COALESCE($20, website.content.seo_description),
                   seo_keywords = COALESCE($21, website.content.seo_keywords),
                   seo_og_image = COALESCE($22, website.content.seo_og_image),
                   seo_twitter_image = COALESCE($23, website.content.seo_twitter_image),
                   seo_canonical_path = COALESCE($24, website.content.seo_canonical_path),
                   seo_robots = COALESCE($25, website.content.seo_robots),
                   updated_at = NOW()
               RETURNING *"#,
        )
        .bind(business_id)
        .bind(&data.hero_title)
        .bind(&data.hero_subtitle)
        .bind(&data.services_title)
        .bind(&data.services_subtitle)
        .bind(&data.services_auto_description)
        .bind(&data.services_marine_description)
        .bind(&data.services_rv_description)
        .bind(&data.services_ceramic_description)
        .bind(&data.services_correction_description)
        .bind(&data.services_ppf_description)
        .bind(&data.reviews_title)
        .bind(&data.reviews_subtitle)
        .bind(data.reviews_avg_rating)
        .bind(data.reviews_total_count)
        .bind(&data.faq_title)
        .bind(&data.faq_subtitle)
        .bind(data.faq_items.as_ref().map(Json))
        .bind(&data.seo_title)
        .bind(&data.seo_description)
        .bind(&data.seo_keywords)
        .bind(&data.seo_og_image)
        .bind(&data.seo_twitter_image)
        .bind(&data.seo_canonical_path)
        .bind(&data.seo_robots)
        .fetch_one(pool)
        .await
    }
}
