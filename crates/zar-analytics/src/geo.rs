//! GeoIP city lookup.
//!
//! The reader memory-maps the MaxMind database once at startup. Lookups
//! are synchronous and never fail the caller: any miss, parse error or
//! absent database yields empty fields.

use maxminddb::geoip2;
use serde::Serialize;
use std::net::IpAddr;
use std::path::Path;

/// Result of a lookup. Fields are `None` whenever the database has no
/// answer for the address.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoLocation {
    pub country_code: Option<String>,
    pub city: Option<String>,
}

/// Optional handle to the MaxMind city database.
pub struct GeoReader {
    reader: Option<maxminddb::Reader<Vec<u8>>>,
}

impl GeoReader {
    /// Open the database at `path`. A missing or unreadable file is
    /// tolerated: lookups simply return empty locations.
    pub fn open(path: Option<&Path>) -> Self {
        let reader = path.and_then(|p| match maxminddb::Reader::open_readfile(p) {
            Ok(reader) => Some(reader),
            Err(err) => {
                tracing::warn!(path = %p.display(), error = %err, "geoip database unavailable");
                None
            }
        });
        Self { reader }
    }

    /// A reader with no backing database.
    pub fn disabled() -> Self {
        Self { reader: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    /// Look up a textual IP address.
    pub fn lookup(&self, ip_address: &str) -> GeoLocation {
        let Some(reader) = &self.reader else {
            return GeoLocation::default();
        };
        let Ok(addr) = ip_address.parse::<IpAddr>() else {
            return GeoLocation::default();
        };

        let Ok(Some(city)) = reader
            .lookup(addr)
            .and_then(|result| result.decode::<geoip2::City>())
        else {
            return GeoLocation::default();
        };

        GeoLocation {
            country_code: city.country.iso_code.map(str::to_string),
            city: city.city.names.english.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_reader_returns_empty_location() {
        let reader = GeoReader::disabled();
        let location = reader.lookup("93.184.216.34");
        assert!(location.country_code.is_none());
        assert!(location.city.is_none());
    }

    #[test]
    fn unparseable_address_is_tolerated() {
        let reader = GeoReader::disabled();
        let location = reader.lookup("not-an-ip");
        assert!(location.country_code.is_none());
    }

    #[test]
    fn missing_database_file_is_tolerated() {
        let reader = GeoReader::open(Some(Path::new("/nonexistent/GeoLite2-City.mmdb")));
        assert!(!reader.is_enabled());
    }
}
