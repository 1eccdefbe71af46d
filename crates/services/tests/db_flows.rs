//! Flows that only mean something against a real Postgres: transactions,
//! savepoints, row locks and cascades. Each test gets a fresh database with
//! every migration applied. Run them with
//! `DATABASE_URL=postgres://... cargo test -p services -- --ignored`.

use std::time::Duration;

use db::{
    DBService,
    models::{
        review::ReviewVote,
        tenant::{ApplicationStatus, Tenant},
    },
};
use serde_json::json;
use services::services::{
    application_review::{
        ApplicationReviewError, ApplicationReviewService, ApproveApplication, RejectApplication,
    },
    auth::{AuthError, AuthService, AuthSettings, LoginRequest, RegisterRequest},
    database_validator::DatabaseValidator,
    reviews::{CreateReviewRequest, ReviewError, ReviewService},
    service_areas::{ServiceAreaInput, ServiceAreaService},
    tenant_deletion::{
        DeleteOptions, DeletionIssueKind, DeletionOutcome, TenantDeletionError,
        TenantDeletionService,
    },
    tenant_provision::{ProvisionError, SignupRequest, TenantProvisionService},
};
use sqlx::PgPool;

fn db(pool: &PgPool) -> DBService {
    DBService { pool: pool.clone() }
}

async fn insert_tenant(pool: &PgPool, slug: &str, status: &str) -> i64 {
    sqlx::query_scalar(
        r#"INSERT INTO tenants.business (slug, business_name, application_status)
           VALUES ($1, $2, $3::application_status)
           RETURNING id"#,
    )
    .bind(slug)
    .bind(format!("{slug} detailing"))
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_booking(pool: &PgPool, tenant_id: i64, status: &str) {
    sqlx::query("INSERT INTO booking.bookings (tenant_id, status) VALUES ($1, $2)")
        .bind(tenant_id)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

async fn business_exists(pool: &PgPool, id: i64) -> bool {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants.business WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn signup(email: &str) -> SignupRequest {
    serde_json::from_value(json!({
        "firstName": "Jordan",
        "lastName": "Price",
        "personalPhone": "5125550100",
        "personalEmail": email,
        "businessName": "Jordan's Mobile Detail",
        "businessPhone": "+15125550199",
        "businessAddress": {
            "address": "100 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "zip": "78701"
        },
        "selectedPlan": "basic",
        "planPrice": 0.0
    }))
    .unwrap()
}

fn force() -> DeleteOptions {
    DeleteOptions {
        force: true,
        ..DeleteOptions::default()
    }
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_pending_bookings_block_deletion_without_force(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "shine-co", "approved").await;
    insert_booking(&pool, tenant_id, "pending").await;
    let deletion = TenantDeletionService::new(db(&pool));

    let outcome = deletion
        .delete(tenant_id, "ops@thatsmartsite.com", &DeleteOptions::default())
        .await
        .unwrap();
    match outcome {
        DeletionOutcome::Blocked { issues, tenant } => {
            assert_eq!(tenant.slug, "shine-co");
            assert!(issues.iter().any(|i| i.kind == DeletionIssueKind::PendingBookings));
            assert!(issues.iter().any(|i| i.kind == DeletionIssueKind::RecentActivity));
        }
        other => panic!("expected a blocked deletion, got {other:?}"),
    }
    assert!(business_exists(&pool, tenant_id).await);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_force_deletion_cascades_and_removes_the_owner(pool: PgPool) {
    let provisioning = TenantProvisionService::new(db(&pool));
    let created = provisioning.signup(&signup("jordan@example.com")).await.unwrap();
    insert_booking(&pool, created.tenant_id, "confirmed").await;
    sqlx::query("INSERT INTO tenants.tenant_images (tenant_slug, url) VALUES ($1, 'a.jpg')")
        .bind(&created.slug)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = TenantDeletionService::new(db(&pool))
        .delete(created.tenant_id, "ops@thatsmartsite.com", &force())
        .await
        .unwrap();
    let DeletionOutcome::Deleted(deleted) = outcome else {
        panic!("expected the tenant to be deleted");
    };
    assert!(deleted.skipped_cleanup.is_empty());
    assert_eq!(deleted.snapshot.counts.bookings_count, 1);

    assert!(!business_exists(&pool, created.tenant_id).await);
    let leftovers: (i64, i64, i64) = sqlx::query_as(
        r#"SELECT
             (SELECT COUNT(*) FROM booking.bookings WHERE tenant_id = $1),
             (SELECT COUNT(*) FROM tenants.tenant_images WHERE tenant_slug = $2),
             (SELECT COUNT(*) FROM auth.users WHERE id = $3)"#,
    )
    .bind(created.tenant_id)
    .bind(&created.slug)
    .bind(created.user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(leftovers, (0, 0, 0));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_failed_cleanup_step_is_skipped_not_fatal(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "shine-co", "approved").await;
    sqlx::query("DROP TABLE tenants.tenant_images")
        .execute(&pool)
        .await
        .unwrap();

    let outcome = TenantDeletionService::new(db(&pool))
        .delete(tenant_id, "ops@thatsmartsite.com", &DeleteOptions::default())
        .await
        .unwrap();
    let DeletionOutcome::Deleted(deleted) = outcome else {
        panic!("expected the tenant to be deleted");
    };
    assert_eq!(deleted.skipped_cleanup.len(), 1);
    assert_eq!(deleted.skipped_cleanup[0].table, "cleanup_images");
    assert!(!business_exists(&pool, tenant_id).await);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_orphaned_rows_roll_the_deletion_back(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "shine-co", "approved").await;
    sqlx::query("ALTER TABLE booking.bookings DROP CONSTRAINT bookings_tenant_id_fkey")
        .execute(&pool)
        .await
        .unwrap();
    insert_booking(&pool, tenant_id, "completed").await;

    let err = TenantDeletionService::new(db(&pool))
        .delete(tenant_id, "ops@thatsmartsite.com", &force())
        .await
        .unwrap_err();
    match err {
        TenantDeletionError::Verification(problem) => assert!(problem.contains("1 bookings")),
        other => panic!("expected a verification failure, got {other:?}"),
    }
    assert!(business_exists(&pool, tenant_id).await);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_soft_delete_keeps_the_row(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "shine-co", "approved").await;
    let tenant = TenantDeletionService::new(db(&pool))
        .soft_delete(tenant_id, "ops@thatsmartsite.com")
        .await
        .unwrap();
    assert_eq!(tenant.application_status, ApplicationStatus::Deleted);
    assert!(business_exists(&pool, tenant_id).await);
    assert!(
        Tenant::find_approved_by_slug(&pool, "shine-co")
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_signup_suffixes_taken_slugs_and_rejects_reused_email(pool: PgPool) {
    let provisioning = TenantProvisionService::new(db(&pool));
    let first = provisioning.signup(&signup("jordan@example.com")).await.unwrap();
    let second = provisioning.signup(&signup("price@example.com")).await.unwrap();

    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with(&first.slug));
    assert!(utils::slug::validate_slug(&second.slug).is_ok());

    let err = provisioning
        .signup(&signup("jordan@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::EmailTaken));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_only_pending_applications_can_be_decided(pool: PgPool) {
    let tenant_id = insert_tenant(&pool, "applicant", "pending").await;
    let review = ApplicationReviewService::new(db(&pool));

    let approved = review
        .approve(
            tenant_id,
            &ApproveApplication {
                approved_slug: "shine-co".into(),
                admin_notes: None,
            },
            "ops@thatsmartsite.com",
        )
        .await
        .unwrap();
    assert_eq!(approved.application_status, ApplicationStatus::Approved);
    assert_eq!(approved.slug, "shine-co");

    let err = review
        .reject(
            tenant_id,
            &RejectApplication {
                rejection_reason: "Outside our service region".into(),
                admin_notes: None,
            },
            "ops@thatsmartsite.com",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationReviewError::NotPending(ApplicationStatus::Approved)
    ));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_votes_are_one_per_address(pool: PgPool) {
    let reviews = ReviewService::new(db(&pool));
    let review = reviews
        .create(&CreateReviewRequest {
            tenant_slug: "shine-co".into(),
            customer_name: "Dana Smith".into(),
            rating: 5,
            comment: "Spotless".into(),
            reviewer_url: None,
            vehicle_type: None,
            paint_correction: false,
            ceramic_coating: false,
            paint_protection_film: false,
            source: None,
        })
        .await
        .unwrap();

    let tally = reviews.vote(review.id, ReviewVote::Helpful, "203.0.113.1").await.unwrap();
    assert_eq!((tally.helpful_votes, tally.total_votes), (1, 1));

    let tally = reviews.vote(review.id, ReviewVote::NotHelpful, "203.0.113.1").await.unwrap();
    assert_eq!((tally.helpful_votes, tally.total_votes), (0, 1));

    let tally = reviews.vote(review.id, ReviewVote::Helpful, "203.0.113.2").await.unwrap();
    assert_eq!((tally.helpful_votes, tally.total_votes), (1, 2));

    let err = reviews
        .vote(review.id + 1000, ReviewVote::Helpful, "203.0.113.1")
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_concurrent_area_adds_keep_both(pool: PgPool) {
    let created = TenantProvisionService::new(db(&pool))
        .signup(&signup("jordan@example.com"))
        .await
        .unwrap();
    let tenant = Tenant::find_approved_by_slug(&pool, &created.slug)
        .await
        .unwrap()
        .unwrap();
    let before = tenant.service_areas().len();
    let areas = ServiceAreaService::new(db(&pool));

    let input = |city: &str| -> ServiceAreaInput {
        serde_json::from_value(json!({ "city": city, "state": "TX" })).unwrap()
    };
    let (a, b) = tokio::join!(
        areas.add(&tenant, input("Round Rock")),
        areas.add(&tenant, input("Pflugerville")),
    );
    a.unwrap();
    b.unwrap();

    let stored = Tenant::find_by_id(&pool, tenant.id)
        .await
        .unwrap()
        .unwrap()
        .service_areas();
    assert_eq!(stored.len(), before + 2);
    assert!(stored.iter().any(|area| area.city == "Round Rock"));
    assert!(stored.iter().any(|area| area.city == "Pflugerville"));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_register_login_and_admin_promotion(pool: PgPool) {
    let auth = AuthService::new(
        db(&pool),
        AuthSettings {
            jwt_secret: "integration-secret".into(),
            token_ttl: Duration::from_secs(3600),
            admin_emails: vec!["owner@thatsmartsite.com".into()],
        },
    );

    let registered = auth
        .register(&RegisterRequest {
            email: "Owner@ThatSmartSite.com".into(),
            password: "correct horse".into(),
            name: "Owner".into(),
            phone: None,
        })
        .await
        .unwrap();
    assert!(registered.user.is_admin);
    assert_eq!(registered.user.email, "owner@thatsmartsite.com");

    let err = auth
        .login(&LoginRequest {
            email: "owner@thatsmartsite.com".into(),
            password: "wrong horse".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let login = auth
        .login(&LoginRequest {
            email: "owner@thatsmartsite.com".into(),
            password: "correct horse".into(),
        })
        .await
        .unwrap();
    assert_eq!(login.user.id, registered.user.id);
    let claims = utils::auth::decode_claims(&login.token, "integration-secret").unwrap();
    assert!(claims.is_admin);
    assert_eq!(auth.current_user(&claims).await.unwrap().id, registered.user.id);

    let err = auth
        .register(&RegisterRequest {
            email: "owner@thatsmartsite.com".into(),
            password: "another horse".into(),
            name: "Owner".into(),
            phone: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_migrated_schema_passes_validation(pool: PgPool) {
    let validator = DatabaseValidator::new(pool);
    let result = validator.validate().await.unwrap();
    assert!(result.is_initialized);
    assert_eq!(result.migrations_applied, 3);
    assert!(result.missing_tables.is_empty(), "{:?}", result.missing_tables);
    assert_eq!(
        validator.latest_migration().await.unwrap().as_deref(),
        Some("review votes")
    );
}
