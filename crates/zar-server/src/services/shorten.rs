//! The shorten engine.

use crate::client_info::ClientDetails;
use crate::services::domains::{canonical_domain, ensure_safe};
use crate::state::AppState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zar_core::constants::{REFRESH_TOKEN_EXPIRE_DAYS, SHORT_CODE_LEN, SHORT_CODE_RETRY_BUDGET};
use zar_core::ids::{md5_bytes, short_code};
use zar_core::{ServiceError, ServiceResult};
use zar_db::domains as domains_repo;
use zar_db::sessions as sessions_repo;
use zar_db::{blacklist, tags};
use zar_db::urls::{self, NewUrl, OwnedUrlRow, UrlRow};
use zar_db::users::User;
use zar_db::DbError;
use zar_security::passwords::hash_password;
use zar_security::SessionToken;

/// Shorten request payload.
#[derive(Debug, Deserialize)]
pub struct UrlCreate {
    pub url: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub descr: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The canonical URL response shape.
#[derive(Debug, Clone, Serialize)]
pub struct UrlResponse {
    pub id: i64,
    pub domain_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub clicks: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UrlResponse {
    pub fn from_owned(row: OwnedUrlRow, base_url: &str) -> Self {
        Self {
            short_url: format!("{base_url}/api/v1/{}", row.short_code),
            id: row.id,
            domain_id: row.domain_id,
            user_id: row.user_id,
            original_url: row.original_url,
            short_code: row.short_code,
            clicks: row.clicks,
            is_favorite: row.is_favorite,
            title: row.title,
            descr: row.descr,
            qrcode_url: row.qrcode_url,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

fn owned(row: UrlRow, user_id: Option<Uuid>, is_favorite: Option<bool>) -> OwnedUrlRow {
    OwnedUrlRow {
        id: row.id,
        domain_id: row.domain_id,
        original_url: row.original_url,
        short_code: row.short_code,
        clicks: row.clicks,
        title: row.title,
        descr: row.descr,
        qrcode_url: row.qrcode_url,
        expires_at: row.expires_at,
        is_active: row.is_active,
        created_at: row.created_at,
        user_id,
        is_favorite,
    }
}

/// What the handler needs back: the response body plus cookies to set
/// when the session was silently refreshed.
pub struct ShortenOutcome {
    pub url: UrlResponse,
    pub refreshed: Option<SessionToken>,
}

pub async fn shorten(
    state: &AppState,
    payload: UrlCreate,
    user: Option<User>,
    refresh_cookie: Option<Uuid>,
    client: &ClientDetails,
) -> ServiceResult<ShortenOutcome> {
    let original_url = payload.url.trim().to_string();
    let canonical = canonical_domain(&original_url)?;

    if let Some(expires_at) = payload.expires_at {
        if expires_at <= state.clock().now() {
            return Err(ServiceError::invalid_input(
                "expires_at must be in the future",
            ));
        }
    }

    // Silent refresh: a valid refresh cookie on an unauthenticated call
    // mints a fresh access token and keeps the shorten attributed.
    let mut user = user;
    let mut refreshed = None;
    if user.is_none() {
        if let Some(token) = refresh_cookie {
            if let Some(found) =
                sessions_repo::get_user_by_refresh_token(state.db(), token).await?
            {
                let access_token = state.tokens().create_access_token(found.id)?;
                let refresh_expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRE_DAYS);
                sessions_repo::extend_session(state.db(), token, refresh_expires_at).await?;
                refreshed = Some(SessionToken {
                    access_token,
                    refresh_token: token,
                    refresh_expires_at,
                });
                user = Some(found);
            }
        }
    }

    let url_hash = md5_bytes(&original_url);

    // Long-term verdicts first, then the domain-level screen.
    if blacklist::is_blacklisted(state.db(), &url_hash).await? {
        return Err(ServiceError::invalid_input(
            "URL rejected by the safety screen",
        ));
    }
    let domain_hash = md5_bytes(&canonical);
    let domain = domains_repo::upsert_domain(state.db(), &canonical, &domain_hash).await?;
    if !domain.is_secure || !ensure_safe(state, &domain).await? {
        if let Err(err) = blacklist::add_to_blacklist(state.db(), &original_url, &url_hash).await
        {
            tracing::warn!(error = %err, "failed to blacklist url");
        }
        return Err(ServiceError::invalid_input(
            "URL rejected by the safety screen",
        ));
    }
    let user_id = user.as_ref().map(|u| u.id);

    // Plain links dedup against an existing active row in the same
    // ownership slot; password- or expiry-carrying requests always create.
    if payload.password.is_none() && payload.expires_at.is_none() {
        if let Some(row) = urls::find_reusable(
            state.db(),
            domain.id,
            &url_hash,
            payload.title.as_deref(),
            user_id,
        )
        .await?
        {
            let row = backfill_qrcode(state, row, client).await;
            return Ok(ShortenOutcome {
                url: UrlResponse::from_owned(row, &client.base_url),
                refreshed,
            });
        }
    }

    let p_hash = match payload.password.as_deref() {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    // Short-code collisions retry in place with a bounded budget.
    let mut inserted = None;
    for _ in 0..SHORT_CODE_RETRY_BUDGET {
        let code = short_code(SHORT_CODE_LEN);
        let new = NewUrl {
            domain_id: domain.id,
            original_url: &original_url,
            original_url_hash: &url_hash,
            short_code: &code,
            p_hash: p_hash.as_deref(),
            title: payload.title.as_deref(),
            descr: payload.descr.as_deref(),
            expires_at: payload.expires_at,
        };
        match urls::insert_url(state.db(), &new).await {
            Ok(row) => {
                inserted = Some(row);
                break;
            }
            Err(DbError::UniqueViolation(_)) => continue,
            Err(DbError::CheckViolation(_)) => {
                return Err(ServiceError::invalid_input(format!(
                    "Invalid URL: {original_url}"
                )));
            }
            Err(other) => return Err(other.into()),
        }
    }
    let Some(row) = inserted else {
        return Err(ServiceError::conflict(
            "Could not allocate a short code, try again",
        ));
    };

    let is_favorite = payload.is_favorite.unwrap_or(false);
    if let Some(user_id) = user_id {
        urls::attach_owner(state.db(), row.id, user_id, is_favorite).await?;
    }

    for name in payload.tags.iter().take(10) {
        let tag = tags::get_or_create_tag(state.db(), name).await?;
        tags::tag_url(state.db(), row.id, tag.id).await?;
    }

    let row = owned(row, user_id, user_id.map(|_| is_favorite));
    let row = backfill_qrcode(state, row, client).await;

    Ok(ShortenOutcome {
        url: UrlResponse::from_owned(row, &client.base_url),
        refreshed,
    })
}

/// Render and upload the QR code when the row lacks one. Fail-soft: any
/// error leaves the row as it was.
async fn backfill_qrcode(
    state: &AppState,
    mut row: OwnedUrlRow,
    client: &ClientDetails,
) -> OwnedUrlRow {
    let Some(store) = state.object_store() else {
        return row;
    };
    if row.qrcode_url.is_some() {
        return row;
    }

    let short_url = format!("{}/api/v1/{}", client.base_url, row.short_code);
    match crate::qr::generate_and_upload(store.as_ref(), &short_url).await {
        Ok(qrcode_url) => {
            if let Err(err) = urls::set_qrcode_url(state.db(), row.id, &qrcode_url).await {
                tracing::warn!(error = %err, "failed to persist qrcode url");
            }
            row.qrcode_url = Some(qrcode_url);
        }
        Err(err) => {
            tracing::warn!(error = %err, short_code = %row.short_code, "qr generation failed");
        }
    }
    row
}
