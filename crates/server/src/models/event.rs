use strum_macros::{Display, EnumString};

pub type EventId = i64;
pub type UserId = i64;

/// Recorded actions. Anything else fails to parse at the boundary and is
/// never written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, sqlx::Type)]
#[sqlx(type_name = "action_type")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    View,
    Download,
}
