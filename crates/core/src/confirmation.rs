//! Order confirmation pipeline: cap check, tier resolution, then side-effect dispatch.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::approvals::{ApprovalResolver, Decision, RejectReason, Tier};
use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, NoopAuditSink};
use crate::calendar::{schedule_training_events, TrainingPlan};
use crate::collaborators::{
    Calendar, EmployeeDirectory, Notice, NoticeBoard, OrderStore, TaskScheduler,
};
use crate::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
use crate::domain::employee::{Employee, Role, UserId};
use crate::domain::event::{EventId, EventRequest};
use crate::domain::order::{Order, OrderId, OrderState};
use crate::errors::ApplicationError;

pub const APPROVER_FEEDBACK: &str = "Quotation confirmed by the approver.";

/// The user attempting an action. The role is optional; a missing role never confirms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub name: String,
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Option<Role>) -> Self {
        Self { user_id: UserId(user_id.into()), name: name.into(), role }
    }

    /// Acting as an employee: their linked user (or their id) and their role.
    pub fn from_employee(employee: &Employee) -> Self {
        let user_id = employee.user_id.clone().unwrap_or_else(|| UserId(employee.id.0.clone()));
        Self { user_id, name: employee.name.clone(), role: Some(employee.role) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub event_id: EventId,
    pub request: EventRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    Confirmed {
        order_id: OrderId,
        tier: Tier,
        events: Vec<ScheduledEvent>,
        closed_approval: Option<ApprovalId>,
    },
    PendingApproval {
        order_id: OrderId,
        approval: ApprovalRequest,
    },
    MissingApprover {
        order_id: OrderId,
        tier: Tier,
        role: Role,
    },
    Rejected {
        order_id: OrderId,
        reason: RejectReason,
    },
    Skipped {
        order_id: OrderId,
        state: OrderState,
    },
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

pub struct Collaborators {
    pub orders: Box<dyn OrderStore>,
    pub directory: Box<dyn EmployeeDirectory>,
    pub notices: Box<dyn NoticeBoard>,
    pub tasks: Box<dyn TaskScheduler>,
    pub calendar: Box<dyn Calendar>,
}

pub struct ConfirmationService {
    resolver: ApprovalResolver,
    plan: TrainingPlan,
    approval_deadline: Duration,
    collaborators: Collaborators,
    audit: Box<dyn AuditSink>,
}

impl ConfirmationService {
    pub fn new(
        resolver: ApprovalResolver,
        plan: TrainingPlan,
        approval_deadline: Duration,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            resolver,
            plan,
            approval_deadline,
            collaborators,
            audit: Box::new(NoopAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Box::new(sink);
        self
    }

    /// Runs one confirmation attempt for `order_id` on behalf of `actor`.
    ///
    /// Policy outcomes (rejection, routing, missing approver) are returned as values; only
    /// collaborator failures and unknown orders are errors.
    pub fn confirm(
        &self,
        order_id: &OrderId,
        actor: &Actor,
    ) -> Result<ConfirmationOutcome, ApplicationError> {
        let audit = AuditContext::new(
            Some(order_id.clone()),
            Uuid::new_v4().to_string(),
            actor.user_id.0.clone(),
        );
        let order = self
            .collaborators
            .orders
            .find_order(order_id)?
            .ok_or_else(|| ApplicationError::OrderNotFound(order_id.clone()))?;

        if order.state != OrderState::Draft {
            debug!(
                event_name = "order.confirmation.skipped",
                correlation_id = %audit.correlation_id,
                order_id = %order.id,
                state = ?order.state,
                "order is not a draft; nothing to confirm"
            );
            return Ok(ConfirmationOutcome::Skipped { order_id: order.id, state: order.state });
        }

        let total = order.total();
        let employees = self.line_employees(&order)?;
        if let Err(reason) = self.resolver.check_order_caps(total, employees.iter()) {
            return self.reject(&order, reason, &audit);
        }

        let decision = self.resolver.resolve(total, actor.role);
        info!(
            event_name = "order.confirmation.decided",
            correlation_id = %audit.correlation_id,
            order_id = %order.id,
            total = %total,
            acting_role = ?actor.role,
            decision = ?decision,
            "approval decision resolved"
        );
        self.audit.emit(
            audit
                .event("order.decision", AuditCategory::Policy, AuditOutcome::Success)
                .with_metadata("total", total.to_string())
                .with_metadata("decision", format!("{decision:?}")),
        );

        match decision {
            Decision::Allow { tier } => self.confirm_allowed(order, tier, actor, &audit),
            Decision::RouteToApprover { tier, role } => self.route(&order, tier, role, &audit),
            Decision::Reject { reason } => self.reject(&order, reason, &audit),
        }
    }

    /// Confirms each order in turn. One failing order does not stop the batch.
    pub fn confirm_batch(
        &self,
        order_ids: &[OrderId],
        actor: &Actor,
    ) -> Vec<(OrderId, Result<ConfirmationOutcome, ApplicationError>)> {
        order_ids.iter().map(|order_id| (order_id.clone(), self.confirm(order_id, actor))).collect()
    }

    /// Marks an approval task done and retries confirmation as the approver.
    ///
    /// The approver's role must satisfy the role the task was raised for.
    pub fn complete_approval(
        &self,
        approval_id: &ApprovalId,
        approver: &Actor,
        outcome_note: &str,
    ) -> Result<ConfirmationOutcome, ApplicationError> {
        let task = self
            .collaborators
            .tasks
            .find_task(approval_id)?
            .ok_or_else(|| ApplicationError::ApprovalNotFound(approval_id.clone()))?;
        if task.status == ApprovalStatus::Done {
            return Err(ApplicationError::ApprovalAlreadyDone(approval_id.clone()));
        }

        let audit = AuditContext::new(
            Some(task.order_id.clone()),
            Uuid::new_v4().to_string(),
            approver.user_id.0.clone(),
        );
        if !approver.role.is_some_and(|role| role.satisfies(task.required_role)) {
            warn!(
                event_name = "order.approval.unauthorized",
                correlation_id = %audit.correlation_id,
                order_id = %task.order_id,
                approval_id = %task.id,
                acting_role = ?approver.role,
                required_role = %task.required_role,
                "approval completion refused"
            );
            self.audit.emit(
                audit
                    .event("approval.unauthorized", AuditCategory::Approval, AuditOutcome::Rejected)
                    .with_metadata("approval_id", task.id.0.clone()),
            );
            return Err(ApplicationError::ApproverNotAuthorized {
                approval: task.id,
                required: task.required_role,
            });
        }

        let done = self.collaborators.tasks.complete_task(approval_id, outcome_note)?;
        self.collaborators.notices.post_notice(Notice::info(
            done.order_id.clone(),
            format!("{} completed approval {}: {}", approver.name, done.id, outcome_note),
        ))?;

        self.audit.emit(
            audit
                .event("approval.completed", AuditCategory::Approval, AuditOutcome::Success)
                .with_metadata("approval_id", done.id.0.clone()),
        );

        self.confirm(&done.order_id, approver)
    }

    pub fn cancel(&self, order_id: &OrderId, actor: &Actor) -> Result<Order, ApplicationError> {
        let mut order = self
            .collaborators
            .orders
            .find_order(order_id)?
            .ok_or_else(|| ApplicationError::OrderNotFound(order_id.clone()))?;

        order.transition_to(OrderState::Cancelled)?;
        self.collaborators.orders.write_state(&order.id, OrderState::Cancelled)?;
        self.collaborators.notices.post_notice(Notice::info(
            order.id.clone(),
            format!("{} cancelled the quotation {}.", actor.name, order.name),
        ))?;

        let audit =
            AuditContext::new(Some(order.id.clone()), Uuid::new_v4().to_string(), &actor.user_id.0);
        let cancelled_note = format!("Quotation cancelled by {}.", actor.name);
        self.close_pending_approvals(&order.id, actor, &cancelled_note, &cancelled_note, &audit)?;
        self.audit.emit(audit.event(
            "order.cancelled",
            AuditCategory::Lifecycle,
            AuditOutcome::Success,
        ));
        info!(
            event_name = "order.cancelled",
            correlation_id = %audit.correlation_id,
            order_id = %order.id,
            "order cancelled"
        );

        Ok(order)
    }

    /// Employees assigned to the order's lines. References that no longer resolve count as
    /// unassigned.
    fn line_employees(&self, order: &Order) -> Result<Vec<Employee>, ApplicationError> {
        let mut employees = Vec::new();
        for line in &order.lines {
            let Some(employee_id) = &line.employee else {
                continue;
            };
            match self.collaborators.directory.find_by_id(employee_id)? {
                Some(employee) => employees.push(employee),
                None => debug!(
                    event_name = "order.line.employee_cleared",
                    order_id = %order.id,
                    employee_id = %employee_id.0,
                    "line employee no longer exists; treating line as unassigned"
                ),
            }
        }
        Ok(employees)
    }

    fn confirm_allowed(
        &self,
        mut order: Order,
        tier: Tier,
        actor: &Actor,
        audit: &AuditContext,
    ) -> Result<ConfirmationOutcome, ApplicationError> {
        order.transition_to(OrderState::Confirmed)?;
        self.collaborators.orders.write_state(&order.id, OrderState::Confirmed)?;
        self.audit.emit(
            audit
                .event("order.confirmed", AuditCategory::Lifecycle, AuditOutcome::Success)
                .with_metadata("tier", format!("{tier:?}")),
        );

        let superseded_note = format!("Quotation confirmed by {}.", actor.name);
        let closed_approval = self.close_pending_approvals(
            &order.id,
            actor,
            APPROVER_FEEDBACK,
            &superseded_note,
            audit,
        )?;
        if closed_approval.is_none() {
            self.collaborators.notices.post_notice(Notice::info(
                order.id.clone(),
                format!("{} confirmed the quotation {}.", actor.name, order.name),
            ))?;
        }

        let mut events = Vec::new();
        for request in schedule_training_events(&order, &self.plan) {
            let event_id = self.collaborators.calendar.create_event(&request)?;
            self.audit.emit(
                audit
                    .event("calendar.event_created", AuditCategory::Calendar, AuditOutcome::Success)
                    .with_metadata("event_id", event_id.0.clone())
                    .with_metadata("line_id", request.line_id.0.clone()),
            );
            events.push(ScheduledEvent { event_id, request });
        }

        info!(
            event_name = "order.confirmed",
            correlation_id = %audit.correlation_id,
            order_id = %order.id,
            tier = ?tier,
            training_events = events.len(),
            "order confirmed"
        );

        Ok(ConfirmationOutcome::Confirmed { order_id: order.id, tier, events, closed_approval })
    }

    /// Closes every open approval on the order. The first task assigned to `actor` gets
    /// `own_note` and is returned; the rest get `other_note`.
    fn close_pending_approvals(
        &self,
        order_id: &OrderId,
        actor: &Actor,
        own_note: &str,
        other_note: &str,
        audit: &AuditContext,
    ) -> Result<Option<ApprovalId>, ApplicationError> {
        let mut own = None;
        for task in self.collaborators.tasks.pending_for_order(order_id)? {
            let note = if own.is_none() && task.is_assigned_to(&actor.user_id) {
                own = Some(task.id.clone());
                own_note
            } else {
                other_note
            };
            self.collaborators.tasks.complete_task(&task.id, note)?;
            self.audit.emit(
                audit
                    .event("approval.closed", AuditCategory::Approval, AuditOutcome::Success)
                    .with_metadata("approval_id", task.id.0.clone())
                    .with_metadata("note", note),
            );
        }

        Ok(own)
    }

    fn route(
        &self,
        order: &Order,
        tier: Tier,
        role: Role,
        audit: &AuditContext,
    ) -> Result<ConfirmationOutcome, ApplicationError> {
        let directory = self.collaborators.directory.as_ref();
        let Some(approver) = self.resolver.find_approver(tier, directory)? else {
            warn!(
                event_name = "order.approval.missing_approver",
                correlation_id = %audit.correlation_id,
                order_id = %order.id,
                role = %role,
                "no employee holds the role required to approve this order"
            );
            self.collaborators.notices.post_notice(Notice::warning(
                order.id.clone(),
                format!(
                    "No approver configured for role {role}; quotation {} stays in draft.",
                    order.name
                ),
            ))?;
            self.audit.emit(
                audit
                    .event(
                        "approval.missing_approver",
                        AuditCategory::Approval,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("role", role.to_string()),
            );
            return Ok(ConfirmationOutcome::MissingApprover {
                order_id: order.id.clone(),
                tier,
                role,
            });
        };

        let existing = self
            .collaborators
            .tasks
            .pending_for_order(&order.id)?
            .into_iter()
            .find(|task| task.approver_id == approver.id);
        if let Some(existing) = existing {
            debug!(
                event_name = "order.approval.already_pending",
                correlation_id = %audit.correlation_id,
                order_id = %order.id,
                approval_id = %existing.id,
                "approval already requested from this approver"
            );
            return Ok(ConfirmationOutcome::PendingApproval {
                order_id: order.id.clone(),
                approval: existing,
            });
        }

        self.collaborators.notices.post_notice(Notice::info(
            order.id.clone(),
            format!("Request for approval sent to {}.", approver.name),
        ))?;

        let now = Utc::now();
        let approval = ApprovalRequest {
            id: ApprovalId(Uuid::new_v4().to_string()),
            order_id: order.id.clone(),
            approver_id: approver.id.clone(),
            approver_name: approver.name.clone(),
            required_role: role,
            assignee: approver.user_id.clone(),
            note: format!("Quotation {} needs to be confirmed by {}.", order.name, approver.name),
            status: ApprovalStatus::Pending,
            feedback: None,
            deadline: now + self.approval_deadline,
            created_at: now,
            resolved_at: None,
        };
        self.collaborators.tasks.schedule_task(approval.clone())?;

        self.audit.emit(
            audit
                .event("approval.requested", AuditCategory::Approval, AuditOutcome::Success)
                .with_metadata("approval_id", approval.id.0.clone())
                .with_metadata("approver_id", approver.id.0.clone())
                .with_metadata("role", role.to_string()),
        );
        info!(
            event_name = "order.approval.requested",
            correlation_id = %audit.correlation_id,
            order_id = %order.id,
            approval_id = %approval.id,
            approver = %approver.name,
            "approval requested"
        );

        Ok(ConfirmationOutcome::PendingApproval { order_id: order.id.clone(), approval })
    }

    fn reject(
        &self,
        order: &Order,
        reason: RejectReason,
        audit: &AuditContext,
    ) -> Result<ConfirmationOutcome, ApplicationError> {
        let message = reason.message();
        warn!(
            event_name = "order.confirmation.rejected",
            correlation_id = %audit.correlation_id,
            order_id = %order.id,
            reason = %message,
            "order confirmation rejected"
        );
        self.collaborators.notices.post_notice(Notice::warning(order.id.clone(), message))?;
        self.audit.emit(
            audit
                .event("order.rejected", AuditCategory::Policy, AuditOutcome::Rejected)
                .with_metadata("reason", format!("{reason:?}")),
        );

        Ok(ConfirmationOutcome::Rejected { order_id: order.id.clone(), reason })
    }
}
