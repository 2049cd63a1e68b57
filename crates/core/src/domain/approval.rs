use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::employee::{EmployeeId, Role, UserId};
use crate::domain::order::OrderId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub String);

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Done,
}

/// Follow-up task asking an approver to confirm an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    pub order_id: OrderId,
    pub approver_id: EmployeeId,
    pub approver_name: String,
    pub required_role: Role,
    pub assignee: Option<UserId>,
    pub note: String,
    pub status: ApprovalStatus,
    pub feedback: Option<String>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn mark_done(&mut self, feedback: impl Into<String>, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Done;
        self.feedback = Some(feedback.into());
        self.resolved_at = Some(at);
    }

    /// Approvers without a linked user act under their employee id.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        match &self.assignee {
            Some(assignee) => assignee == user,
            None => self.approver_id.0 == user.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::employee::{EmployeeId, Role, UserId};
    use crate::domain::order::OrderId;

    use super::{ApprovalId, ApprovalRequest, ApprovalStatus};

    fn request(assignee: Option<&str>) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: ApprovalId("A-1".to_string()),
            order_id: OrderId("S1".to_string()),
            approver_id: EmployeeId("e-mia".to_string()),
            approver_name: "Mia".to_string(),
            required_role: Role::Manager1,
            assignee: assignee.map(|user| UserId(user.to_string())),
            note: String::new(),
            status: ApprovalStatus::Pending,
            feedback: None,
            deadline: now + Duration::days(7),
            created_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn assignment_follows_linked_user_or_employee_id() {
        let linked = request(Some("u-mia"));
        assert!(linked.is_assigned_to(&UserId("u-mia".to_string())));
        assert!(!linked.is_assigned_to(&UserId("e-mia".to_string())));

        let unlinked = request(None);
        assert!(unlinked.is_assigned_to(&UserId("e-mia".to_string())));
        assert!(!unlinked.is_assigned_to(&UserId("u-sam".to_string())));
    }

    #[test]
    fn mark_done_records_feedback() {
        let mut task = request(Some("u-mia"));
        let at = Utc::now();
        task.mark_done("ok", at);

        assert!(!task.is_pending());
        assert_eq!(task.feedback.as_deref(), Some("ok"));
        assert_eq!(task.resolved_at, Some(at));
    }
}
