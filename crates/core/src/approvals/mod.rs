use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collaborators::EmployeeDirectory;
use crate::domain::employee::{Employee, Role};
use crate::errors::CollaboratorError;

/// Amount bands that decide which roles may confirm an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Standard,
    ManagerReview,
    SeniorReview,
    Executive,
}

impl Tier {
    /// Lowest role allowed to confirm at this tier.
    pub fn required_role(self) -> Role {
        match self {
            Self::Standard => Role::EmployeeLimited,
            Self::ManagerReview => Role::Manager1,
            Self::SeniorReview => Role::Manager2,
            Self::Executive => Role::Administrator,
        }
    }

    /// Roles searched, in order, when the order has to be routed to an approver.
    pub fn routing_roles(self) -> &'static [Role] {
        match self {
            Self::Standard => &[],
            Self::ManagerReview => &[Role::Manager1, Role::Manager2],
            Self::SeniorReview => &[Role::Manager2],
            Self::Executive => &[Role::Administrator],
        }
    }

    pub fn authorizes(self, role: Role) -> bool {
        role.satisfies(self.required_role())
    }
}

/// Thresholds of the tier table plus the absolute cap for limited employees.
///
/// The manager band is `[manager_threshold, senior_threshold]`, the senior band is
/// `(senior_threshold, executive_threshold]` and anything above `executive_threshold` needs an
/// administrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    pub manager_threshold: Decimal,
    pub senior_threshold: Decimal,
    pub executive_threshold: Decimal,
    pub limited_cap: Decimal,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            manager_threshold: Decimal::new(500, 0),
            senior_threshold: Decimal::new(1000, 0),
            executive_threshold: Decimal::new(5000, 0),
            limited_cap: Decimal::new(250, 0),
        }
    }
}

impl ApprovalPolicy {
    pub fn tier_for(&self, total: Decimal) -> Tier {
        if total < self.manager_threshold {
            Tier::Standard
        } else if total <= self.senior_threshold {
            Tier::ManagerReview
        } else if total <= self.executive_threshold {
            Tier::SeniorReview
        } else {
            Tier::Executive
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    PartnerLimitExceeded { total: Decimal, cap: Decimal },
    MissingActingRole { total: Decimal },
    NegativeAmount { total: Decimal },
    UnknownRole { token: String },
}

impl RejectReason {
    /// Warning posted on the order when confirmation is refused.
    pub fn message(&self) -> String {
        match self {
            Self::PartnerLimitExceeded { total, cap } => format!(
                "Sale order not confirmed: amount {total} above the partner limit of {cap}."
            ),
            Self::MissingActingRole { total } => {
                format!("Sale order not confirmed: amount {total} above the partner limit (no role).")
            }
            Self::NegativeAmount { total } => {
                format!("Sale order not confirmed: total {total} cannot be negative.")
            }
            Self::UnknownRole { token } => {
                format!("Sale order not confirmed: unknown role `{token}`.")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow { tier: Tier },
    RouteToApprover { tier: Tier, role: Role },
    Reject { reason: RejectReason },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Pure decision procedure gating order confirmation.
#[derive(Clone, Debug, Default)]
pub struct ApprovalResolver {
    policy: ApprovalPolicy,
}

impl ApprovalResolver {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    pub fn resolve(&self, total: Decimal, acting_role: Option<Role>) -> Decision {
        if total < Decimal::ZERO {
            return Decision::Reject { reason: RejectReason::NegativeAmount { total } };
        }

        let tier = self.policy.tier_for(total);
        match acting_role {
            Some(role) if tier.authorizes(role) => Decision::Allow { tier },
            _ if tier == Tier::Standard => {
                Decision::Reject { reason: RejectReason::MissingActingRole { total } }
            }
            _ => Decision::RouteToApprover { tier, role: tier.required_role() },
        }
    }

    /// Same as [`ApprovalResolver::resolve`] for a raw role token. Unknown tokens reject
    /// before any tier lookup.
    pub fn resolve_token(&self, total: Decimal, acting_role: Option<&str>) -> Decision {
        let role = match acting_role.map(str::trim).filter(|token| !token.is_empty()) {
            None => None,
            Some(token) => match token.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    return Decision::Reject {
                        reason: RejectReason::UnknownRole { token: token.to_string() },
                    }
                }
            },
        };

        self.resolve(total, role)
    }

    /// `false` when a limited employee is attached to an order whose total exceeds `cap`.
    pub fn check_employee_cap(
        employee: Option<&Employee>,
        order_total: Decimal,
        cap: Decimal,
    ) -> bool {
        match employee {
            Some(employee) if employee.role == Role::EmployeeLimited => order_total <= cap,
            _ => true,
        }
    }

    pub fn check_order_caps<'a, I>(
        &self,
        order_total: Decimal,
        employees: I,
    ) -> Result<(), RejectReason>
    where
        I: IntoIterator<Item = &'a Employee>,
    {
        let cap = self.policy.limited_cap;
        let blocked = employees
            .into_iter()
            .any(|employee| !Self::check_employee_cap(Some(employee), order_total, cap));

        if blocked {
            return Err(RejectReason::PartnerLimitExceeded { total: order_total, cap });
        }

        Ok(())
    }

    pub fn find_approver<D>(
        &self,
        tier: Tier,
        directory: &D,
    ) -> Result<Option<Employee>, CollaboratorError>
    where
        D: EmployeeDirectory + ?Sized,
    {
        for role in tier.routing_roles() {
            if let Some(employee) = directory.find_by_role(*role)? {
                return Ok(Some(employee));
            }
        }

        Ok(None)
    }
}
