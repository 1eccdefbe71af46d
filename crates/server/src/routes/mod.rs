pub mod admin;
pub mod auth;
pub mod health;
pub mod reviews;
pub mod seo;
pub mod service_areas;
pub mod services;
pub mod tenants;
pub mod website_content;
