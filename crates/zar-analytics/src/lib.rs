//! Click-event enrichment: user-agent classification and GeoIP lookup.

pub mod geo;
pub mod ua;

pub use geo::{GeoLocation, GeoReader};
pub use ua::{parse_user_agent, DeviceType, ParsedUserAgent};
