//! Writes the TypeScript declarations of every wire type to `shared/types.ts`.
//! Pass `--check` to fail instead of writing when the file is stale.

use std::{env, fs, path::PathBuf, process::ExitCode};

use ts_rs::TS;

fn declarations() -> Vec<String> {
    use db::models::{
        catalog::{ServiceCategory, Vehicle},
        review::{Review, ReviewSource, ReviewSummary, ReviewVote, VoteTally},
        service::{Service, ServiceTier, ServiceWithTiers, TierView},
        service_area::ServiceArea,
        tenant::{ApplicationStatus, Industry, IndustryCount, Tenant},
        user::User,
        website_content::{FaqItem, UpdateWebsiteContent, WebsiteContentView},
    };
    use server::{error::DeletionBlocked, routes::admin::DeletionResponse};
    use services::services::{
        application_review::{ApproveApplication, RejectApplication},
        auth::{AuthResponse, ListUsersQuery, LoginRequest, RegisterRequest, UserFilter},
        reviews::{CreateReviewRequest, ListReviewsQuery, UpdateReviewRequest, VoteRequest},
        service_areas::{ReplaceServiceAreas, ServiceAreaInput},
        service_catalog::{CreateServiceRequest, TierInput, UpdateServiceRequest},
        tenant_deletion::{
            DeleteOptions, DeletedTenant, DeletionImpact, DeletionIssue, DeletionIssueKind,
            DeletionValidation, DryRunReport, RecordCounts, SkippedCleanup, SnapshotCounts,
            TenantInfo, TenantSnapshot,
        },
        tenant_provision::{
            BusinessAddress, ContentDefaults, HeroDefaults, IndustryDefaults, Plan,
            SectionDefaults, SeoDefaults, SignupRequest, SignupResult,
        },
        tenants::{DashboardOverview, ListTenantsQuery, TenantProfile},
        website_content::MainSiteContent,
    };
    use utils::response::{ApiResponse, Paginated, Pagination};

    vec![
        ApiResponse::<(), ()>::decl(),
        Pagination::decl(),
        Paginated::<()>::decl(),
        User::decl(),
        RegisterRequest::decl(),
        LoginRequest::decl(),
        AuthResponse::decl(),
        UserFilter::decl(),
        ListUsersQuery::decl(),
        ApplicationStatus::decl(),
        Industry::decl(),
        Tenant::decl(),
        IndustryCount::decl(),
        ListTenantsQuery::decl(),
        TenantProfile::decl(),
        DashboardOverview::decl(),
        ServiceArea::decl(),
        ServiceAreaInput::decl(),
        ReplaceServiceAreas::decl(),
        Vehicle::decl(),
        ServiceCategory::decl(),
        Service::decl(),
        ServiceTier::decl(),
        TierView::decl(),
        ServiceWithTiers::decl(),
        TierInput::decl(),
        CreateServiceRequest::decl(),
        UpdateServiceRequest::decl(),
        ReviewSource::decl(),
        Review::decl(),
        ReviewSummary::decl(),
        CreateReviewRequest::decl(),
        ListReviewsQuery::decl(),
        UpdateReviewRequest::decl(),
        ReviewVote::decl(),
        VoteRequest::decl(),
        VoteTally::decl(),
        FaqItem::decl(),
        WebsiteContentView::decl(),
        UpdateWebsiteContent::decl(),
        MainSiteContent::decl(),
        Plan::decl(),
        BusinessAddress::decl(),
        HeroDefaults::decl(),
        SectionDefaults::decl(),
        ContentDefaults::decl(),
        SeoDefaults::decl(),
        IndustryDefaults::decl(),
        SignupRequest::decl(),
        SignupResult::decl(),
        ApproveApplication::decl(),
        RejectApplication::decl(),
        TenantInfo::decl(),
        DeletionIssueKind::decl(),
        DeletionIssue::decl(),
        DeletionValidation::decl(),
        SnapshotCounts::decl(),
        TenantSnapshot::decl(),
        RecordCounts::decl(),
        DeletionImpact::decl(),
        DryRunReport::decl(),
        DeleteOptions::decl(),
        SkippedCleanup::decl(),
        DeletedTenant::decl(),
        DeletionResponse::decl(),
        DeletionBlocked::decl(),
    ]
}

fn render() -> String {
    let mut out = String::from(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n",
    );
    for decl in declarations() {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn main() -> ExitCode {
    let check = env::args().any(|a| a == "--check");
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts");
    let contents = render();

    if check {
        return match fs::read_to_string(&path) {
            Ok(existing) if existing == contents => {
                println!("shared/types.ts is up to date");
                ExitCode::SUCCESS
            }
            _ => {
                eprintln!("shared/types.ts is stale; run `cargo run --bin generate_types`");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("failed to create {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    }
    match fs::write(&path, contents) {
        Ok(()) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to write {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}
