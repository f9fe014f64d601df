//! Click recording: parse, geolocate, persist.
//!
//! The counter update and the analytic row are grouped in one transaction
//! so a cancelled request never leaves a half-written click.

use crate::client_info::ClientDetails;
use crate::state::AppState;
use zar_analytics::parse_user_agent;
use zar_core::constants::USER_AGENT_MAX_LEN;
use zar_core::ServiceResult;
use zar_db::analytics::{self, ClickEvent};
use zar_db::{urls, DbError};

/// Record one successful resolution of `url_id`.
pub async fn record_click(
    state: &AppState,
    url_id: i64,
    client: &ClientDetails,
) -> ServiceResult<()> {
    let user_agent = client.user_agent.as_deref().unwrap_or("");
    let parsed = parse_user_agent(user_agent);
    let location = state.geo().lookup(&client.ip);

    let event = ClickEvent {
        url_id,
        ip_address: Some(client.ip.clone()),
        country_code: location.country_code,
        city: location.city,
        user_agent: (!user_agent.is_empty())
            .then(|| user_agent.chars().take(USER_AGENT_MAX_LEN).collect()),
        referer: client.referer.clone(),
        device_type: parsed.device_type.as_str().to_string(),
        browser: parsed.browser,
        os: parsed.os,
    };

    let mut tx = state.db().begin().await.map_err(DbError::from)?;
    urls::increment_clicks(&mut *tx, url_id).await?;
    analytics::insert_click(&mut *tx, &event).await?;
    tx.commit().await.map_err(DbError::from)?;
    Ok(())
}
