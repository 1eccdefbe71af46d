pub mod catalog;
pub mod review;
pub mod service;
pub mod service_area;
pub mod tenant;
pub mod user;
pub mod website_content;
