pub mod admin;
pub mod rate_limit;
pub mod tenant;

pub use admin::{AdminUser, AuthUser};
pub use tenant::load_approved_tenant;
