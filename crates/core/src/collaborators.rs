//! Narrow contracts with the systems that own records, people, feeds, tasks and calendars.
//!
//! The confirmation pipeline only talks to these traits. In-memory implementations back the
//! CLI and the tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::approval::{ApprovalId, ApprovalRequest};
use crate::domain::employee::{Employee, EmployeeId, Role};
use crate::domain::event::{EventId, EventRequest};
use crate::domain::order::{Order, OrderId, OrderState};
use crate::errors::CollaboratorError;

pub trait OrderStore {
    fn find_order(&self, id: &OrderId) -> Result<Option<Order>, CollaboratorError>;
    fn write_state(&self, id: &OrderId, state: OrderState) -> Result<(), CollaboratorError>;
}

pub trait EmployeeDirectory {
    fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, CollaboratorError>;
    /// First employee holding `role`, in directory order.
    fn find_by_role(&self, role: Role) -> Result<Option<Employee>, CollaboratorError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub target: OrderId,
    pub level: NoticeLevel,
    pub body: String,
    pub posted_at: DateTime<Utc>,
}

impl Notice {
    pub fn info(target: OrderId, body: impl Into<String>) -> Self {
        Self { target, level: NoticeLevel::Info, body: body.into(), posted_at: Utc::now() }
    }

    pub fn warning(target: OrderId, body: impl Into<String>) -> Self {
        Self { target, level: NoticeLevel::Warning, body: body.into(), posted_at: Utc::now() }
    }
}

pub trait NoticeBoard {
    fn post_notice(&self, notice: Notice) -> Result<(), CollaboratorError>;
}

pub trait TaskScheduler {
    fn schedule_task(&self, request: ApprovalRequest) -> Result<ApprovalId, CollaboratorError>;
    fn find_task(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, CollaboratorError>;
    /// Open approval tasks for the order, oldest first.
    fn pending_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<ApprovalRequest>, CollaboratorError>;
    fn complete_task(
        &self,
        id: &ApprovalId,
        outcome_note: &str,
    ) -> Result<ApprovalRequest, CollaboratorError>;
}

pub trait Calendar {
    fn create_event(&self, request: &EventRequest) -> Result<EventId, CollaboratorError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<Mutex<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new(orders: Vec<Order>) -> Self {
        let store = Self::default();
        for order in orders {
            store.insert(order);
        }
        store
    }

    pub fn insert(&self, order: Order) {
        lock(&self.orders).insert(order.id.clone(), order);
    }
}

impl OrderStore for InMemoryOrderStore {
    fn find_order(&self, id: &OrderId) -> Result<Option<Order>, CollaboratorError> {
        Ok(lock(&self.orders).get(id).cloned())
    }

    fn write_state(&self, id: &OrderId, state: OrderState) -> Result<(), CollaboratorError> {
        let mut orders = lock(&self.orders);
        let order = orders.get_mut(id).ok_or_else(|| CollaboratorError::NotFound {
            collaborator: "order store",
            key: id.0.clone(),
        })?;
        order.state = state;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: Arc<Mutex<Vec<Employee>>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees: Arc::new(Mutex::new(employees)) }
    }

    /// Removing an employee leaves line references dangling; lookups then report nothing,
    /// which callers treat as an unassigned line.
    pub fn remove(&self, id: &EmployeeId) {
        lock(&self.employees).retain(|employee| &employee.id != id);
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, CollaboratorError> {
        Ok(lock(&self.employees).iter().find(|employee| &employee.id == id).cloned())
    }

    fn find_by_role(&self, role: Role) -> Result<Option<Employee>, CollaboratorError> {
        Ok(lock(&self.employees).iter().find(|employee| employee.role == role).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryNoticeBoard {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl InMemoryNoticeBoard {
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn notices_for(&self, target: &OrderId) -> Vec<Notice> {
        lock(&self.notices).iter().filter(|notice| &notice.target == target).cloned().collect()
    }
}

impl NoticeBoard for InMemoryNoticeBoard {
    fn post_notice(&self, notice: Notice) -> Result<(), CollaboratorError> {
        lock(&self.notices).push(notice);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTaskScheduler {
    tasks: Arc<Mutex<Vec<ApprovalRequest>>>,
}

impl InMemoryTaskScheduler {
    pub fn new(tasks: Vec<ApprovalRequest>) -> Self {
        Self { tasks: Arc::new(Mutex::new(tasks)) }
    }

    pub fn tasks(&self) -> Vec<ApprovalRequest> {
        lock(&self.tasks).clone()
    }
}

impl TaskScheduler for InMemoryTaskScheduler {
    fn schedule_task(&self, request: ApprovalRequest) -> Result<ApprovalId, CollaboratorError> {
        let id = request.id.clone();
        lock(&self.tasks).push(request);
        Ok(id)
    }

    fn find_task(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, CollaboratorError> {
        Ok(lock(&self.tasks).iter().find(|task| &task.id == id).cloned())
    }

    fn pending_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<ApprovalRequest>, CollaboratorError> {
        Ok(lock(&self.tasks)
            .iter()
            .filter(|task| task.is_pending() && &task.order_id == order_id)
            .cloned()
            .collect())
    }

    fn complete_task(
        &self,
        id: &ApprovalId,
        outcome_note: &str,
    ) -> Result<ApprovalRequest, CollaboratorError> {
        let mut tasks = lock(&self.tasks);
        let task = tasks.iter_mut().find(|task| &task.id == id).ok_or_else(|| {
            CollaboratorError::NotFound { collaborator: "task scheduler", key: id.0.clone() }
        })?;
        task.mark_done(outcome_note, Utc::now());
        Ok(task.clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCalendar {
    events: Arc<Mutex<Vec<(EventId, EventRequest)>>>,
}

impl InMemoryCalendar {
    pub fn events(&self) -> Vec<(EventId, EventRequest)> {
        lock(&self.events).clone()
    }
}

impl Calendar for InMemoryCalendar {
    fn create_event(&self, request: &EventRequest) -> Result<EventId, CollaboratorError> {
        let id = EventId(Uuid::new_v4().to_string());
        lock(&self.events).push((id.clone(), request.clone()));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use crate::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
    use crate::domain::employee::{Employee, EmployeeId, Role, UserId};
    use crate::domain::order::{Order, OrderId, OrderState, Partner, PartnerId};
    use crate::errors::CollaboratorError;

    use super::{
        EmployeeDirectory, InMemoryEmployeeDirectory, InMemoryOrderStore, InMemoryTaskScheduler,
        OrderStore, TaskScheduler,
    };

    fn employee(id: &str, role: Role) -> Employee {
        Employee { id: EmployeeId(id.to_string()), name: id.to_string(), role, user_id: None }
    }

    fn approval(id: &str, assignee: &str) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: ApprovalId(id.to_string()),
            order_id: OrderId("S1".to_string()),
            approver_id: EmployeeId("e-m1".to_string()),
            approver_name: "Morgan".to_string(),
            required_role: Role::Manager1,
            assignee: Some(UserId(assignee.to_string())),
            note: "Quotation S1 needs to be confirmed by Morgan.".to_string(),
            status: ApprovalStatus::Pending,
            feedback: None,
            deadline: now + Duration::days(7),
            created_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn directory_returns_first_employee_with_role() {
        let directory = InMemoryEmployeeDirectory::new(vec![
            employee("e-1", Role::Manager2),
            employee("e-2", Role::Manager2),
        ]);

        let found = directory.find_by_role(Role::Manager2).expect("lookup");
        assert_eq!(found.map(|employee| employee.id), Some(EmployeeId("e-1".to_string())));
        assert!(directory.find_by_role(Role::Administrator).expect("lookup").is_none());
    }

    #[test]
    fn removed_employees_no_longer_resolve() {
        let directory = InMemoryEmployeeDirectory::new(vec![employee("e-1", Role::Employee)]);
        directory.remove(&EmployeeId("e-1".to_string()));
        assert!(directory.find_by_id(&EmployeeId("e-1".to_string())).expect("lookup").is_none());
    }

    #[test]
    fn order_store_writes_state_and_reports_missing_orders() {
        let store = InMemoryOrderStore::new(vec![Order {
            id: OrderId("S1".to_string()),
            name: "S1".to_string(),
            partner: Partner { id: PartnerId("P".to_string()), name: "P".to_string(), city: None },
            owner: UserId("u".to_string()),
            state: OrderState::Draft,
            lines: Vec::new(),
        }]);

        store.write_state(&OrderId("S1".to_string()), OrderState::Confirmed).expect("write");
        let order = store.find_order(&OrderId("S1".to_string())).expect("read").expect("order");
        assert_eq!(order.state, OrderState::Confirmed);
        assert_eq!(order.total(), Decimal::ZERO);

        let error = store
            .write_state(&OrderId("S9".to_string()), OrderState::Confirmed)
            .expect_err("missing order");
        assert!(matches!(error, CollaboratorError::NotFound { .. }));
    }

    #[test]
    fn scheduler_lists_pending_tasks_per_order_and_completes_them() {
        let scheduler = InMemoryTaskScheduler::default();
        scheduler.schedule_task(approval("A-1", "u-m1")).expect("schedule");
        let mut other_order = approval("A-2", "u-m1");
        other_order.order_id = OrderId("S2".to_string());
        scheduler.schedule_task(other_order).expect("schedule");

        let order_id = OrderId("S1".to_string());
        let pending = scheduler.pending_for_order(&order_id).expect("lookup");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, ApprovalId("A-1".to_string()));

        let done = scheduler.complete_task(&pending[0].id, "approved").expect("complete");
        assert_eq!(done.status, ApprovalStatus::Done);
        assert_eq!(done.feedback.as_deref(), Some("approved"));
        assert!(scheduler.pending_for_order(&order_id).expect("lookup").is_empty());
    }
}
