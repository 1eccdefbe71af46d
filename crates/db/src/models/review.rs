use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "review_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewSource {
    #[default]
    Website,
    Google,
    Yelp,
    Facebook,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "review_vote", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewVote {
    Helpful,
    NotHelpful,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Review {
    pub id: i64,
    pub business_id: Option<i64>,
    pub tenant_slug: String,
    pub customer_name: String,
    pub rating: i16,
    pub comment: String,
    pub reviewer_url: Option<String>,
    pub vehicle_type: Option<String>,
    pub paint_correction: bool,
    pub ceramic_coating: bool,
    pub paint_protection_film: bool,
    pub source: ReviewSource,
    pub avatar_filename: Option<String>,
    pub helpful_votes: i32,
    pub total_votes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub business_id: Option<i64>,
    pub tenant_slug: String,
    pub customer_name: String,
    pub rating: i16,
    pub comment: String,
    pub reviewer_url: Option<String>,
    pub vehicle_type: Option<String>,
    pub paint_correction: bool,
    pub ceramic_coating: bool,
    pub paint_protection_film: bool,
    pub source: ReviewSource,
}

/// Moderation edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateReview {
    pub customer_name: Option<String>,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub reviewer_url: Option<String>,
    pub vehicle_type: Option<String>,
    pub paint_correction: Option<bool>,
    pub ceramic_coating: Option<bool>,
    pub paint_protection_film: Option<bool>,
    pub source: Option<ReviewSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize, TS)]
pub struct VoteTally {
    pub helpful_votes: i32,
    pub total_votes: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ReviewSummary {
    /// Rounded to one decimal; `0` when there are no reviews.
    pub average_rating: f64,
    pub total_count: i64,
}

impl Review {
    pub async fn create(pool: &PgPool, data: &CreateReview) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"INSERT INTO reputation.reviews (
                   business_id, tenant_slug, customer_name, rating, comment, reviewer_url,
                   vehicle_type, paint_correction, ceramic_coating, paint_protection_film, source
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING *"#,
        )
        .bind(data.business_id)
        .bind(&data.tenant_slug)
        .bind(&data.customer_name)
        .bind(data.rating)
        .bind(&data.comment)
        .bind(&data.reviewer_url)
        .bind(&data.vehicle_type)
        .bind(data.paint_correction)
        .bind(data.ceramic_coating)
        .bind(data.paint_protection_film)
        .bind(data.source)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        tenant_slug: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT * FROM reputation.reviews
               WHERE tenant_slug = $1
               ORDER BY rating DESC, created_at DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(tenant_slug)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_slug(pool: &PgPool, tenant_slug: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reputation.reviews WHERE tenant_slug = $1",
        )
        .bind(tenant_slug)
        .fetch_one(pool)
        .await
    }

    pub async fn summary(pool: &PgPool, tenant_slug: &str) -> Result<ReviewSummary, sqlx::Error> {
        sqlx::query_as::<_, ReviewSummary>(
            r#"SELECT COALESCE(ROUND(AVG(rating)::numeric, 1), 0)::float8 AS average_rating,
                      COUNT(*) AS total_count
               FROM reputation.reviews
               WHERE tenant_slug = $1"#,
        )
        .bind(tenant_slug)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: &UpdateReview,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"UPDATE reputation.reviews
               SET customer_name         = COALESCE($2, customer_name),
                   rating                = COALESCE($3, rating),
                   comment               = COALESCE($4, comment),
                   reviewer_url          = COALESCE($5, reviewer_url),
                   vehicle_type          = COALESCE($6, vehicle_type),
                   paint_correction      = COALESCE($7, paint_correction),
                   ceramic_coating       = COALESCE($8, ceramic_coating),
                   paint_protection_film = COALESCE($9, paint_protection_film),
                   source                = COALESCE($10, source),
                   updated_at            = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.customer_name)
        .bind(data.rating)
        .bind(&data.comment)
        .bind(&data.reviewer_url)
        .bind(&data.vehicle_type)
        .bind(data.paint_correction)
        .bind(data.ceramic_coating)
        .bind(data.paint_protection_film)
        .bind(data.source)
        .fetch_optional(pool)
        .await
    }

    /// Record or replace the vote of `voter_ip` and refresh the cached tallies.
    /// `None` when the review does not exist.
    pub async fn vote(
        pool: &PgPool,
        id: i64,
        vote: ReviewVote,
        voter_ip: &str,
    ) -> Result<Option<VoteTally>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM reputation.reviews WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"INSERT INTO reputation.review_votes (review_id, vote_type, voter_ip)
               VALUES ($1, $2, $3)
               ON CONFLICT (review_id, voter_ip)
               DO UPDATE SET vote_type = EXCLUDED.vote_type, updated_at = NOW()"#,
        )
        .bind(id)
        .bind(vote)
        .bind(voter_ip)
        .execute(&mut *tx)
        .await?;

        let tally = sqlx::query_as::<_, VoteTally>(
            r#"UPDATE reputation.reviews r
               SET helpful_votes = v.helpful, total_votes = v.total
               FROM (
                   SELECT COUNT(*) FILTER (WHERE vote_type = 'helpful')::int AS helpful,
                          COUNT(*)::int AS total
                   FROM reputation.review_votes
                   WHERE review_id = $1
               ) v
               WHERE r.id = $1
               RETURNING r.helpful_votes, r.total_votes"#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(tally))
    }

    /// Returns the deleted row.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>("DELETE FROM reputation.reviews WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_review_source_parses() {
        assert_eq!(ReviewSource::from_str("google").unwrap(), ReviewSource::Google);
        assert_eq!(ReviewSource::default(), ReviewSource::Website);
        assert!(ReviewSource::from_str("tripadvisor").is_err());
    }

    #[test]
    fn test_vote_wire_names() {
        assert_eq!(ReviewVote::from_str("not_helpful").unwrap(), ReviewVote::NotHelpful);
        assert_eq!(serde_json::to_value(ReviewVote::Helpful).unwrap(), "helpful");
        assert!(ReviewVote::from_str("meh").is_err());
    }
}
