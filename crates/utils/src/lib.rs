pub mod auth;
pub mod logging;
pub mod response;
pub mod sentry;
pub mod slug;
