use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::employee::{EmployeeId, UserId};
use crate::domain::product::Product;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLineId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Draft,
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    #[serde(default)]
    pub description: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub training_date: Option<NaiveDate>,
    #[serde(default)]
    pub employee: Option<EmployeeId>,
    #[serde(default)]
    pub product: Option<Product>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub partner: Partner,
    pub owner: UserId,
    #[serde(default)]
    pub state: OrderState,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Sum of line unit prices. Quantities are not weighted in.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|line| line.unit_price).sum()
    }

    pub fn can_transition_to(&self, next: OrderState) -> bool {
        matches!(
            (self.state, next),
            (OrderState::Draft, OrderState::Confirmed)
                | (OrderState::Draft, OrderState::Cancelled)
                | (OrderState::Confirmed, OrderState::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: OrderState) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.state = next;
            return Ok(());
        }

        Err(DomainError::InvalidOrderTransition { from: self.state, to: next })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::employee::UserId;

    use super::{Order, OrderId, OrderLine, OrderLineId, OrderState, Partner, PartnerId};

    fn line(id: &str, cents: i64) -> OrderLine {
        OrderLine {
            id: OrderLineId(id.to_string()),
            description: String::new(),
            unit_price: Decimal::new(cents, 2),
            training_date: None,
            employee: None,
            product: None,
        }
    }

    fn order(state: OrderState) -> Order {
        Order {
            id: OrderId("S00042".to_string()),
            name: "S00042".to_string(),
            partner: Partner {
                id: PartnerId("P-1".to_string()),
                name: "Acme Realty".to_string(),
                city: None,
            },
            owner: UserId("u-sales".to_string()),
            state,
            lines: vec![line("L1", 12_050), line("L2", 7_950)],
        }
    }

    #[test]
    fn total_sums_unit_prices() {
        assert_eq!(order(OrderState::Draft).total(), Decimal::new(200, 0));
    }

    #[test]
    fn empty_order_totals_zero() {
        let mut order = order(OrderState::Draft);
        order.lines.clear();
        assert_eq!(order.total(), Decimal::ZERO);
    }

    #[test]
    fn draft_orders_confirm_and_confirmed_orders_cancel() {
        let mut order = order(OrderState::Draft);
        order.transition_to(OrderState::Confirmed).expect("draft -> confirmed");
        order.transition_to(OrderState::Cancelled).expect("confirmed -> cancelled");
        assert_eq!(order.state, OrderState::Cancelled);
    }

    #[test]
    fn cancelled_orders_cannot_be_confirmed() {
        let mut order = order(OrderState::Cancelled);
        let error =
            order.transition_to(OrderState::Confirmed).expect_err("cancelled -> confirmed fails");
        assert!(matches!(error, crate::errors::DomainError::InvalidOrderTransition { .. }));
    }
}
