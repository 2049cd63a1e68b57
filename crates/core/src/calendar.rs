use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::event::EventRequest;
use crate::domain::order::Order;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventShape {
    /// Fixed-length session starting at midnight of the training date.
    Session { duration_hours: u32 },
    /// Whole training day, ending one second before the next midnight.
    AllDay,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub shape: EventShape,
    pub reminder_minutes: Option<u32>,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self { shape: EventShape::Session { duration_hours: 2 }, reminder_minutes: Some(60) }
    }
}

impl TrainingPlan {
    fn length(&self) -> Duration {
        match self.shape {
            EventShape::Session { duration_hours } => Duration::hours(i64::from(duration_hours)),
            EventShape::AllDay => Duration::hours(24) - Duration::seconds(1),
        }
    }
}

/// One calendar request per line that carries both a training date and a product.
pub fn schedule_training_events(order: &Order, plan: &TrainingPlan) -> Vec<EventRequest> {
    order
        .lines
        .iter()
        .filter_map(|line| {
            let date = line.training_date?;
            let product = line.product.as_ref()?;
            let start = date.and_hms_opt(0, 0, 0)?;

            Some(EventRequest {
                title: format!("Training: {}", product.name),
                description: format!("Training for product: {}", product.name),
                start,
                stop: start + plan.length(),
                attendee: order.partner.id.clone(),
                location: order.partner.city.clone(),
                reminder_minutes: plan.reminder_minutes,
                order_id: order.id.clone(),
                line_id: line.id.clone(),
            })
        })
        .collect()
}
