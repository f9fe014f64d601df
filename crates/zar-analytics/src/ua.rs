//! User-agent classification.

use serde::Serialize;
use woothee::parser::Parser;

/// Device class stored with every click.
///
/// Classification priority: mobile > tablet > desktop > bot > unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Bot,
    Unknown,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::Bot => "bot",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// What the analytics row keeps from a user-agent string.
#[derive(Debug, Clone)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: DeviceType,
}

/// Parse a raw user-agent string.
///
/// Woothee does not separate tablets from phones, so tablets are picked
/// out of the raw string first, then the parser's category decides.
pub fn parse_user_agent(user_agent: &str) -> ParsedUserAgent {
    let parsed = Parser::new().parse(user_agent);

    let is_tablet = user_agent.contains("iPad") || user_agent.contains("Tablet");

    let device_type = match &parsed {
        Some(result) => match result.category {
            "smartphone" | "mobilephone" if !is_tablet => DeviceType::Mobile,
            "smartphone" | "mobilephone" => DeviceType::Tablet,
            _ if is_tablet => DeviceType::Tablet,
            "pc" => DeviceType::Desktop,
            "crawler" => DeviceType::Bot,
            _ => DeviceType::Unknown,
        },
        None if is_tablet => DeviceType::Tablet,
        None => DeviceType::Unknown,
    };

    ParsedUserAgent {
        browser: parsed
            .as_ref()
            .map(|r| r.name.to_string())
            .filter(|n| n != "UNKNOWN"),
        os: parsed
            .as_ref()
            .map(|r| r.os.to_string())
            .filter(|o| o != "UNKNOWN"),
        device_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) \
         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";
    const GOOGLEBOT: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[test]
    fn desktop_browser() {
        let parsed = parse_user_agent(CHROME_DESKTOP);
        assert_eq!(parsed.device_type, DeviceType::Desktop);
        assert_eq!(parsed.browser.as_deref(), Some("Chrome"));
    }

    #[test]
    fn phone_is_mobile() {
        let parsed = parse_user_agent(IPHONE);
        assert_eq!(parsed.device_type, DeviceType::Mobile);
    }

    #[test]
    fn ipad_is_tablet() {
        let parsed = parse_user_agent(IPAD);
        assert_eq!(parsed.device_type, DeviceType::Tablet);
    }

    #[test]
    fn crawler_is_bot() {
        let parsed = parse_user_agent(GOOGLEBOT);
        assert_eq!(parsed.device_type, DeviceType::Bot);
    }

    #[test]
    fn garbage_is_unknown() {
        let parsed = parse_user_agent("definitely not a user agent");
        assert_eq!(parsed.device_type, DeviceType::Unknown);
    }
}
