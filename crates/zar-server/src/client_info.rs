//! Client identity derived from the request.

use crate::funnel::ApiError;
use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::net::SocketAddr;
use zar_db::sessions::DeviceInfo;

/// Everything about the caller the engines care about: stable identifier,
/// user agent, referer and the base URL short links are minted under.
#[derive(Debug, Clone)]
pub struct ClientDetails {
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub base_url: String,
}

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl ClientDetails {
    /// Derive the stable client identifier: first `X-Forwarded-For` token,
    /// then `X-Real-IP`, then the socket peer address.
    pub fn from_parts(parts: &Parts, is_production: bool) -> Self {
        let ip = header_str(parts, "x-forwarded-for")
            .and_then(|xff| xff.split(',').next().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty())
            .or_else(|| header_str(parts, "x-real-ip"))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let scheme = if is_production { "https" } else { "http" };
        let host = header_str(parts, "host").unwrap_or_else(|| "localhost".to_string());

        Self {
            ip,
            user_agent: header_str(parts, "user-agent"),
            referer: header_str(parts, "referer"),
            base_url: format!("{scheme}://{host}"),
        }
    }

    /// Crude device naming for the session listing.
    pub fn device_info(&self) -> DeviceInfo {
        let device_name = self.user_agent.as_deref().and_then(|ua| {
            if ua.contains("Windows") {
                Some("Windows PC")
            } else if ua.contains("Macintosh") {
                Some("Mac")
            } else if ua.contains("iPhone") {
                Some("iPhone")
            } else if ua.contains("Android") {
                Some("Android")
            } else if ua.contains("Linux") {
                Some("Linux")
            } else {
                None
            }
        });

        DeviceInfo {
            device_name: device_name.map(str::to_string),
            device_ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl FromRequestParts<AppState> for ClientDetails {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientDetails::from_parts(
            parts,
            state.config().server.is_production(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn forwarded_for_takes_first_token() {
        let parts = parts_with(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        let details = ClientDetails::from_parts(&parts, false);
        assert_eq!(details.ip, "203.0.113.9");
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let parts = parts_with(&[("x-real-ip", "198.51.100.7")]);
        let details = ClientDetails::from_parts(&parts, false);
        assert_eq!(details.ip, "198.51.100.7");
    }

    #[test]
    fn base_url_follows_host_and_environment() {
        let parts = parts_with(&[("host", "zar.example")]);
        assert_eq!(
            ClientDetails::from_parts(&parts, true).base_url,
            "https://zar.example"
        );
        assert_eq!(
            ClientDetails::from_parts(&parts, false).base_url,
            "http://zar.example"
        );
    }

    #[test]
    fn device_name_heuristics() {
        let parts = parts_with(&[("user-agent", "Mozilla/5.0 (Windows NT 10.0)")]);
        let details = ClientDetails::from_parts(&parts, false);
        assert_eq!(details.device_info().device_name.as_deref(), Some("Windows PC"));
    }
}
