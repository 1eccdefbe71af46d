use std::str::FromStr;

use db::{
    DBService,
    models::{
        review::{
            CreateReview, Review, ReviewSource, ReviewSummary, ReviewVote, UpdateReview,
            VoteTally,
        },
        tenant::Tenant,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use utils::response::Paginated;

use super::validation::{Checks, ValidationError};

pub const VEHICLE_TYPES: [&str; 6] = ["car", "truck", "suv", "boat", "rv", "motorcycle"];
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_OFFSET: i64 = 1_000_000;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Review not found")]
    NotFound(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateReviewRequest {
    pub tenant_slug: String,
    pub customer_name: String,
    pub rating: i16,
    pub comment: String,
    pub reviewer_url: Option<String>,
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub paint_correction: bool,
    #[serde(default)]
    pub ceramic_coating: bool,
    #[serde(default)]
    pub paint_protection_film: bool,
    pub source: Option<String>,
}

impl CreateReviewRequest {
    /// Validate and resolve the review source.
    pub fn validate(&self) -> Result<ReviewSource, ValidationError> {
        let source = match self.source.as_deref().filter(|s| !s.is_empty()) {
            None => Some(ReviewSource::default()),
            Some(s) => ReviewSource::from_str(s).ok(),
        };
        let vehicle_ok = vehicle_type_ok(self.vehicle_type.as_deref());

        Checks::new()
            .require(!self.tenant_slug.trim().is_empty(), "tenant_slug is required")
            .person_name("customer_name", self.customer_name.trim())
            .require((1..=5).contains(&self.rating), "Rating must be between 1 and 5")
            .require(!self.comment.trim().is_empty(), "comment is required")
            .max_len("comment", Some(self.comment.as_str()), 2000)
            .http_url("reviewer_url", self.reviewer_url.as_deref().filter(|u| !u.is_empty()))
            .require(
                vehicle_ok,
                format!(
                    "Invalid vehicle type. Must be one of: {}",
                    VEHICLE_TYPES.join(", ")
                ),
            )
            .require(
                source.is_some(),
                "Invalid source. Must be one of: website, google, yelp, facebook",
            )
            .finish()?;
        Ok(source.unwrap_or_default())
    }
}

fn vehicle_type_ok(vehicle_type: Option<&str>) -> bool {
    vehicle_type.is_none_or(|v| v.is_empty() || VEHICLE_TYPES.contains(&v))
}

/// Admin edit of an existing review; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateReviewRequest {
    pub customer_name: Option<String>,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub reviewer_url: Option<String>,
    pub vehicle_type: Option<String>,
    pub paint_correction: Option<bool>,
    pub ceramic_coating: Option<bool>,
    pub paint_protection_film: Option<bool>,
    pub source: Option<String>,
}

impl UpdateReviewRequest {
    pub fn validate(&self) -> Result<UpdateReview, ValidationError> {
        let source = self.source.as_deref().map(ReviewSource::from_str);
        let changes = UpdateReview {
            customer_name: self.customer_name.as_deref().map(|n| n.trim().to_string()),
            rating: self.rating,
            comment: self.comment.as_deref().map(|c| c.trim().to_string()),
            reviewer_url: self.reviewer_url.clone(),
            vehicle_type: self.vehicle_type.clone(),
            paint_correction: self.paint_correction,
            ceramic_coating: self.ceramic_coating,
            paint_protection_film: self.paint_protection_film,
            source: source.and_then(Result::ok),
        };

        let mut checks = Checks::new();
        if let Some(name) = &changes.customer_name {
            checks.person_name("customer_name", name);
        }
        if let Some(comment) = &changes.comment {
            checks
                .require(!comment.is_empty(), "comment is required")
                .max_len("comment", Some(comment), 2000);
        }
        checks
            .require(
                self.rating.is_none_or(|r| (1..=5).contains(&r)),
                "Rating must be between 1 and 5",
            )
            .http_url("reviewer_url", self.reviewer_url.as_deref())
            .require(
                vehicle_type_ok(self.vehicle_type.as_deref()),
                format!(
                    "Invalid vehicle type. Must be one of: {}",
                    VEHICLE_TYPES.join(", ")
                ),
            )
            .require(
                source.is_none_or(|s| s.is_ok()),
                "Invalid source. Must be one of: website, google, yelp, facebook",
            )
            .require(
                self.has_changes(),
                "No valid fields to update",
            )
            .finish()?;
        Ok(changes)
    }

    fn has_changes(&self) -> bool {
        self.customer_name.is_some()
            || self.rating.is_some()
            || self.comment.is_some()
            || self.reviewer_url.is_some()
            || self.vehicle_type.is_some()
            || self.paint_correction.is_some()
            || self.ceramic_coating.is_some()
            || self.paint_protection_film.is_some()
            || self.source.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct VoteRequest {
    pub vote_type: ReviewVote,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ListReviewsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListReviewsQuery {
    /// `(limit, offset)` clamped to `1..=MAX_LIMIT` and `0..=MAX_OFFSET`.
    pub fn window(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).clamp(0, MAX_OFFSET);
        (limit, offset)
    }
}

#[derive(Clone)]
pub struct ReviewService {
    db: DBService,
}

impl ReviewService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: &CreateReviewRequest) -> Result<Review, ReviewError> {
        let source = request.validate()?;
        let slug = request.tenant_slug.trim();
        let business_id = Tenant::find_by_slug(&self.db.pool, slug)
            .await?
            .map(|t| t.id);

        let review = Review::create(
            &self.db.pool,
            &CreateReview {
                business_id,
                tenant_slug: slug.to_string(),
                customer_name: request.customer_name.trim().to_string(),
                rating: request.rating,
                comment: request.comment.trim().to_string(),
                reviewer_url: request.reviewer_url.clone().filter(|u| !u.is_empty()),
                vehicle_type: request.vehicle_type.clone().filter(|v| !v.is_empty()),
                paint_correction: request.paint_correction,
                ceramic_coating: request.ceramic_coating,
                paint_protection_film: request.paint_protection_film,
                source,
            },
        )
        .await?;
        info!(
            review_id = review.id,
            tenant_slug = %review.tenant_slug,
            rating = review.rating,
            linked = business_id.is_some(),
            "Review created"
        );
        Ok(review)
    }

    pub async fn list(
        &self,
        tenant_slug: &str,
        query: &ListReviewsQuery,
    ) -> Result<Paginated<Review>, ReviewError> {
        let (limit, offset) = query.window();
        let items = Review::find_by_slug(&self.db.pool, tenant_slug, limit, offset).await?;
        let total = Review::count_by_slug(&self.db.pool, tenant_slug).await?;
        Ok(Paginated::new(items, total, limit, offset))
    }

    pub async fn summary(&self, tenant_slug: &str) -> Result<ReviewSummary, ReviewError> {
        Ok(Review::summary(&self.db.pool, tenant_slug).await?)
    }

    pub async fn update(
        &self,
        id: i64,
        request: &UpdateReviewRequest,
    ) -> Result<Review, ReviewError> {
        let changes = request.validate()?;
        let review = Review::update(&self.db.pool, id, &changes)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        info!(review_id = id, tenant_slug = %review.tenant_slug, "Review updated");
        Ok(review)
    }

    pub async fn vote(
        &self,
        id: i64,
        vote: ReviewVote,
        voter_ip: &str,
    ) -> Result<VoteTally, ReviewError> {
        let tally = Review::vote(&self.db.pool, id, vote, voter_ip)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        info!(
            review_id = id,
            vote = %vote,
            helpful = tally.helpful_votes,
            total = tally.total_votes,
            "Review vote recorded"
        );
        Ok(tally)
    }

    pub async fn delete(&self, id: i64) -> Result<Review, ReviewError> {
        let review = Review::delete(&self.db.pool, id)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        info!(review_id = id, tenant_slug = %review.tenant_slug, "Review deleted");
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateReviewRequest {
        CreateReviewRequest {
            tenant_slug: "shine-co".into(),
            customer_name: "Dana Smith".into(),
            rating: 5,
            comment: "Spotless inside and out.".into(),
            reviewer_url: None,
            vehicle_type: Some("suv".into()),
            paint_correction: false,
            ceramic_coating: true,
            paint_protection_film: false,
            source: None,
        }
    }

    #[test]
    fn test_valid_review_defaults_source() {
        assert_eq!(request().validate().unwrap(), ReviewSource::Website);
    }

    #[test]
    fn test_rating_out_of_range() {
        let mut req = request();
        req.rating = 6;
        let err = req.validate().unwrap_err();
        assert_eq!(err.messages(), ["Rating must be between 1 and 5".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_vehicle_and_source() {
        let mut req = request();
        req.vehicle_type = Some("spaceship".into());
        req.source = Some("tripadvisor".into());
        assert_eq!(req.validate().unwrap_err().messages().len(), 2);
    }

    #[test]
    fn test_explicit_source() {
        let mut req = request();
        req.source = Some("google".into());
        assert_eq!(req.validate().unwrap(), ReviewSource::Google);
    }

    #[test]
    fn test_window_is_clamped() {
        let q = ListReviewsQuery::default();
        assert_eq!(q.window(), (10, 0));
        let q = ListReviewsQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert_eq!(q.window(), (100, 0));
        let q = ListReviewsQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(q.window(), (1, 20));
    }

    #[test]
    fn test_window_caps_huge_offset() {
        let q = ListReviewsQuery {
            limit: Some(i64::MAX),
            offset: Some(i64::MAX),
        };
        let (limit, offset) = q.window();
        assert_eq!((limit, offset), (MAX_LIMIT, MAX_OFFSET));
        assert!(!Paginated::<Review>::new(Vec::new(), 3, limit, offset).pagination.has_more);
    }

    #[test]
    fn test_update_needs_a_field() {
        let err = UpdateReviewRequest::default().validate().unwrap_err();
        assert_eq!(err.messages(), ["No valid fields to update".to_string()]);
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        let req = UpdateReviewRequest {
            rating: Some(4),
            source: Some("yelp".into()),
            ..Default::default()
        };
        let changes = req.validate().unwrap();
        assert_eq!(changes.rating, Some(4));
        assert_eq!(changes.source, Some(ReviewSource::Yelp));
        assert!(changes.comment.is_none());

        let req = UpdateReviewRequest {
            rating: Some(0),
            comment: Some("   ".into()),
            source: Some("myspace".into()),
            ..Default::default()
        };
        assert_eq!(req.validate().unwrap_err().messages().len(), 3);
    }
}
