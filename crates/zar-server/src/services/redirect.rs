//! The redirect engine.

use crate::client_info::ClientDetails;
use crate::pages;
use crate::services::analytics::record_click;
use crate::state::AppState;
use zar_core::{ServiceError, ServiceResult};
use zar_db::urls::{self, RedirectRow};
use zar_security::passwords::verify_password;

/// How a resolution ends. The handler maps each arm onto its HTTP shape.
pub enum Resolution {
    /// 307 to the original URL.
    Redirect { location: String },
    /// 303 to the original URL, after a password verify.
    SeeOther { location: String },
    /// 307 to the expired page.
    Expired { location: String },
    /// The password challenge page. 200 on first sight, 401 after a
    /// wrong password.
    Challenge { html: String, wrong_password: bool },
}

fn expired_location(row: &RedirectRow) -> String {
    let expired_at = row
        .expires_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    format!(
        "expired/?original_url={}&expired_at={}",
        urlencoding::encode(&row.original_url),
        urlencoding::encode(&expired_at)
    )
}

fn is_expired(state: &AppState, row: &RedirectRow) -> bool {
    // The bound is exclusive: at the instant of expiry the link is gone.
    row.expires_at
        .is_some_and(|expires_at| state.clock().now() >= expires_at)
}

async fn load(state: &AppState, short_code: &str) -> ServiceResult<RedirectRow> {
    urls::get_redirect(state.db(), short_code)
        .await?
        .ok_or_else(|| ServiceError::not_found("URL not found"))
}

/// `GET /{short_code}`.
pub async fn resolve(
    state: &AppState,
    short_code: &str,
    client: &ClientDetails,
) -> ServiceResult<Resolution> {
    let row = load(state, short_code).await?;

    if is_expired(state, &row) {
        return Ok(Resolution::Expired {
            location: expired_location(&row),
        });
    }

    if row.p_hash.is_some() {
        return Ok(Resolution::Challenge {
            html: pages::password_challenge(short_code, false),
            wrong_password: false,
        });
    }

    record_click(state, row.id, client).await?;
    Ok(Resolution::Redirect {
        location: row.original_url,
    })
}

/// `POST /{short_code}/verify`.
pub async fn verify_and_redirect(
    state: &AppState,
    short_code: &str,
    password: &str,
    client: &ClientDetails,
) -> ServiceResult<Resolution> {
    let row = load(state, short_code).await?;

    if is_expired(state, &row) {
        return Ok(Resolution::Expired {
            location: expired_location(&row),
        });
    }

    let Some(p_hash) = row.p_hash.as_deref() else {
        // Not actually protected; record and send the caller on.
        record_click(state, row.id, client).await?;
        return Ok(Resolution::SeeOther {
            location: row.original_url,
        });
    };

    if !verify_password(password, p_hash).await? {
        return Ok(Resolution::Challenge {
            html: pages::password_challenge(short_code, true),
            wrong_password: true,
        });
    }

    record_click(state, row.id, client).await?;
    Ok(Resolution::SeeOther {
        location: row.original_url,
    })
}
