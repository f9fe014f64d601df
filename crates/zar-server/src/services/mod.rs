//! The engines behind the HTTP surface.

pub mod analytics;
pub mod domains;
pub mod redirect;
pub mod sessions;
pub mod shorten;
