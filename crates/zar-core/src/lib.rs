//! Core types shared across the Zar workspace.
//!
//! This crate holds the pieces every other crate leans on: the typed
//! configuration loaded once at startup, the service-wide constants, the
//! error taxonomy the HTTP layer funnels into responses, short-code and
//! hashing primitives, and the pagination envelope.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod pagination;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{LogLevel, ServiceError, ServiceResult};
pub use pagination::{Page, PageParams};
