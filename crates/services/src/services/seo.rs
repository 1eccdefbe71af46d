//! robots.txt and sitemap.xml for tenant sites, resolved by request host.

use std::{sync::Arc, time::Duration};

use chrono::{NaiveDate, Utc};
use db::{
    DBService,
    models::{service_area::ServiceArea, tenant::Tenant},
};
use moka::future::Cache;
use tracing::{info, warn};
use utils::slug::slugify;

const LIVE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const PREVIEW_TTL: Duration = Duration::from_secs(60 * 60);
const MAX_CACHED_HOSTS: u64 = 10_000;

const EMPTY_SITEMAP: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n</urlset>";

/// Whether a sitemap came from the cache; surfaced as `X-Sitemap-Cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sitemap {
    pub xml: Arc<str>,
    pub cache: CacheStatus,
}

pub fn is_preview_host(host: &str) -> bool {
    host.contains("preview") || host.contains("localhost")
}

pub fn robots_txt(host: &str, proto: &str) -> String {
    if is_preview_host(host) {
        "User-agent: *\nDisallow: /\n".to_string()
    } else {
        format!(
            "User-agent: *\nDisallow: /preview\nDisallow: /admin\nDisallow: /api\nSitemap: {proto}://{host}/sitemap.xml\n"
        )
    }
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

struct SitemapUrl {
    loc: String,
    changefreq: &'static str,
    priority: &'static str,
}

/// Render the sitemap for a live site rooted at `base` (`https://host`).
pub fn render_sitemap(base: &str, areas: &[ServiceArea], today: NaiveDate) -> String {
    let mut urls = vec![
        SitemapUrl { loc: base.to_string(), changefreq: "weekly", priority: "1.0" },
        SitemapUrl { loc: format!("{base}/services"), changefreq: "monthly", priority: "0.8" },
        SitemapUrl { loc: format!("{base}/reviews"), changefreq: "weekly", priority: "0.7" },
        SitemapUrl { loc: format!("{base}/faq"), changefreq: "monthly", priority: "0.6" },
    ];
    for area in areas {
        if area.city.trim().is_empty() || area.state.trim().is_empty() {
            continue;
        }
        urls.push(SitemapUrl {
            loc: format!(
                "{base}/service-areas/{}/{}",
                area.state.trim().to_lowercase(),
                slugify(&area.city)
            ),
            changefreq: "monthly",
            priority: "0.5",
        });
    }

    let lastmod = today.format("%Y-%m-%d");
    let body: Vec<String> = urls
        .iter()
        .map(|u| {
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
                xml_escape(&u.loc),
                u.changefreq,
                u.priority
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}\n</urlset>",
        body.join("\n")
    )
}

#[derive(Clone)]
pub struct SeoService {
    db: DBService,
    live: Cache<String, Arc<str>>,
    preview: Cache<String, Arc<str>>,
}

impl SeoService {
    pub fn new(db: DBService) -> Self {
        let cache = |ttl: Duration| -> Cache<String, Arc<str>> {
            Cache::builder()
                .max_capacity(MAX_CACHED_HOSTS)
                .time_to_live(ttl)
                .build()
        };
        Self {
            db,
            live: cache(LIVE_TTL),
            preview: cache(PREVIEW_TTL),
        }
    }

    /// Build or fetch the cached sitemap for `host`. Concurrent misses for the
    /// same host share one build. Lookup failures degrade to the static pages
    /// and are not cached.
    pub async fn sitemap(&self, host: &str, proto: &str) -> Sitemap {
        let base = format!("{proto}://{host}");
        let preview = is_preview_host(host);
        let cache = if preview { &self.preview } else { &self.live };

        let entry = cache
            .entry(base.clone())
            .or_try_insert_with(self.build_sitemap(&base, host, preview))
            .await;
        match entry {
            Ok(entry) => Sitemap {
                cache: if entry.is_fresh() { CacheStatus::Miss } else { CacheStatus::Hit },
                xml: entry.into_value(),
            },
            Err(e) => {
                warn!(host, error = %e, "Tenant lookup failed while generating sitemap");
                Sitemap {
                    xml: Arc::from(render_sitemap(&base, &[], Utc::now().date_naive())),
                    cache: CacheStatus::Miss,
                }
            }
        }
    }

    async fn build_sitemap(
        &self,
        base: &str,
        host: &str,
        preview: bool,
    ) -> Result<Arc<str>, sqlx::Error> {
        if preview {
            return Ok(Arc::from(EMPTY_SITEMAP));
        }
        let subdomain = host.split('.').next().unwrap_or(host);
        let tenant = Tenant::find_by_host(&self.db.pool, host, subdomain).await?;
        let areas = tenant.as_ref().map(Tenant::service_areas).unwrap_or_default();
        info!(
            host,
            tenant = tenant.as_ref().map(|t| t.slug.as_str()),
            areas = areas.len(),
            "Sitemap generated"
        );
        Ok(Arc::from(render_sitemap(base, &areas, Utc::now().date_naive())))
    }
}

#[cfg(test)]
mod tests {
    use db::PoolSettings;

    use super::*;

    #[test]
    fn test_robots_for_preview_and_live() {
        assert_eq!(robots_txt("localhost:5173", "http"), "User-agent: *\nDisallow: /\n");
        assert_eq!(robots_txt("shine-preview.example.com", "https"), "User-agent: *\nDisallow: /\n");
        let live = robots_txt("shine.example.com", "https");
        assert!(live.contains("Disallow: /admin"));
        assert!(live.ends_with("Sitemap: https://shine.example.com/sitemap.xml\n"));
    }

    #[test]
    fn test_render_sitemap_lists_pages_and_areas() {
        let mut area = ServiceArea::new("Fort Worth", "TX", None);
        area.primary = true;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let xml = render_sitemap("https://shine.example.com", &[area], today);
        assert!(xml.contains("<loc>https://shine.example.com</loc>"));
        assert!(xml.contains("<loc>https://shine.example.com/faq</loc>"));
        assert!(xml.contains("<loc>https://shine.example.com/service-areas/tx/fort-worth</loc>"));
        assert!(xml.contains("<lastmod>2025-06-01</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), 5);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
    }

    #[tokio::test]
    async fn test_preview_sitemap_is_cached() {
        let db = DBService::new_lazy("postgres://localhost/unused", &PoolSettings::default()).unwrap();
        let seo = SeoService::new(db);

        let first = seo.sitemap("localhost:3000", "http").await;
        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(&*first.xml, EMPTY_SITEMAP);

        let second = seo.sitemap("localhost:3000", "http").await;
        assert_eq!(second.cache, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_failed_lookup_serves_static_pages_uncached() {
        let settings = PoolSettings {
            acquire_timeout: Duration::from_millis(200),
            ..PoolSettings::default()
        };
        let db = DBService::new_lazy("postgres://127.0.0.1:1/unused", &settings).unwrap();
        let seo = SeoService::new(db);

        let first = seo.sitemap("shine.example.com", "https").await;
        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(first.xml.matches("<url>").count(), 4);

        let second = seo.sitemap("shine.example.com", "https").await;
        assert_eq!(second.cache, CacheStatus::Miss);
    }
}
