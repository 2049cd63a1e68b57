use quoteguard_core::approvals::{ApprovalResolver, Decision};
use quoteguard_core::config::AppConfig;
use rust_decimal::Decimal;

use crate::commands::CommandResult;

pub fn run(config: &AppConfig, total: Decimal, role: Option<&str>) -> CommandResult {
    let resolver = ApprovalResolver::new(config.approval_policy());
    let decision = resolver.resolve_token(total, role);

    let message = match &decision {
        Decision::Allow { tier } => format!("total {total} may be confirmed directly ({tier:?})"),
        Decision::RouteToApprover { tier, role } => {
            format!("total {total} needs approval by {role} ({tier:?})")
        }
        Decision::Reject { reason } => reason.message(),
    };

    CommandResult::success_with_data("resolve", message, &decision)
}
