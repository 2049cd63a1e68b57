use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderId, OrderLineId, PartnerId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Calendar entry to be persisted by the calendar collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub attendee: PartnerId,
    pub location: Option<String>,
    pub reminder_minutes: Option<u32>,
    pub order_id: OrderId,
    pub line_id: OrderLineId,
}
