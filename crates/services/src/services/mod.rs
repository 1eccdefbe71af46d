pub mod application_review;
pub mod auth;
pub mod database_validator;
pub mod reviews;
pub mod seo;
pub mod service_areas;
pub mod service_catalog;
pub mod tenant_deletion;
pub mod tenant_provision;
pub mod tenants;
pub mod validation;
pub mod website_content;
