use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use sqlx::{Error as SqlxError, PgExecutor, Row};
use tracing::instrument;

use crate::database::connection::DbConnection;
use crate::models::event::{ActionType, EventId, UserId};
use crate::models::resource::ContentId;

impl DbConnection {
    pub async fn record_event(
        &self,
        resource_id: ContentId,
        action: ActionType,
        user_id: Option<UserId>,
        raw_ip: &str,
    ) -> Result<EventId, SqlxError> {
        record_event(self.pool(), resource_id, action, user_id, raw_ip).await
    }
}

/// Appends one event row. The address is anonymized before it reaches the
/// database; the raw value is never stored. `action_date` is set to the
/// current UTC timestamp by the insert itself.
#[instrument(skip(executor, raw_ip))]
pub async fn record_event<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ContentId,
    action: ActionType,
    user_id: Option<UserId>,
    raw_ip: &str,
) -> Result<EventId, SqlxError> {
    let user_ip = anonymize_ip(raw_ip);
    let id = sqlx::query(
        "INSERT INTO resource_events (resource_id, user_id, action_type, action_date, user_ip) \
         VALUES ($1, $2, $3, now(), $4) RETURNING id;",
    )
    .bind(resource_id)
    .bind(user_id.filter(|id| *id > 0))
    .bind(action)
    .bind(&user_ip)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    Ok(id)
}

/// IPv4 keeps the /24 prefix (last octet zeroed), IPv6 keeps the /48 prefix
/// (trailing 80 bits zeroed). Anything unparsable becomes the empty string.
pub fn anonymize_ip(raw: &str) -> String {
    match raw.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            Ipv4Addr::new(octets[0], octets[1], octets[2], 0).to_string()
        }
        Ok(IpAddr::V6(addr)) => {
            let segments = addr.segments();
            Ipv6Addr::new(segments[0], segments[1], segments[2], 0, 0, 0, 0, 0).to_string()
        }
        Err(_) => String::new(),
    }
}
