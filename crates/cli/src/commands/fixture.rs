//! JSON workspace file backing the in-memory collaborators between CLI invocations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quoteguard_core::approvals::ApprovalResolver;
use quoteguard_core::collaborators::{
    InMemoryCalendar, InMemoryEmployeeDirectory, InMemoryNoticeBoard, InMemoryOrderStore,
    InMemoryTaskScheduler, OrderStore,
};
use quoteguard_core::config::AppConfig;
use quoteguard_core::confirmation::{Actor, Collaborators, ConfirmationService};
use quoteguard_core::domain::approval::ApprovalRequest;
use quoteguard_core::domain::employee::Employee;
use quoteguard_core::domain::order::Order;
use serde::{Deserialize, Serialize};

use crate::commands::CommandResult;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub approvals: Vec<ApprovalRequest>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture `{}`", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("failed to serialize fixture")?;
        fs::write(path, raw).with_context(|| format!("failed to write fixture `{}`", path.display()))
    }

    pub fn actor(&self, employee_id: &str) -> Option<Actor> {
        self.employees
            .iter()
            .find(|employee| employee.id.0 == employee_id)
            .map(Actor::from_employee)
    }
}

pub struct Workspace {
    pub service: ConfirmationService,
    pub notices: InMemoryNoticeBoard,
    orders: InMemoryOrderStore,
    tasks: InMemoryTaskScheduler,
}

impl Workspace {
    pub fn open(fixture: &Fixture, config: &AppConfig) -> Self {
        let orders = InMemoryOrderStore::new(fixture.orders.clone());
        let tasks = InMemoryTaskScheduler::new(fixture.approvals.clone());
        let notices = InMemoryNoticeBoard::default();

        let service = ConfirmationService::new(
            ApprovalResolver::new(config.approval_policy()),
            config.training_plan(),
            config.approval_deadline(),
            Collaborators {
                orders: Box::new(orders.clone()),
                directory: Box::new(InMemoryEmployeeDirectory::new(fixture.employees.clone())),
                notices: Box::new(notices.clone()),
                tasks: Box::new(tasks.clone()),
                calendar: Box::new(InMemoryCalendar::default()),
            },
        );

        Self { service, notices, orders, tasks }
    }

    /// Fixture with order states and approvals as they stand now. Order sequence is preserved.
    pub fn snapshot(&self, fixture: &Fixture) -> Fixture {
        let orders = fixture
            .orders
            .iter()
            .map(|order| match self.orders.find_order(&order.id) {
                Ok(Some(current)) => current,
                _ => order.clone(),
            })
            .collect();

        Fixture { employees: fixture.employees.clone(), orders, approvals: self.tasks.tasks() }
    }
}

/// Loads the fixture and the acting employee, or the failure to print.
pub fn open_for(
    command: &str,
    path: &Path,
    actor_id: &str,
) -> Result<(Fixture, Actor), CommandResult> {
    let fixture = Fixture::load(path).map_err(|error| {
        CommandResult::failure(command, "fixture", format!("{error:#}"), 3)
    })?;
    let actor = fixture.actor(actor_id).ok_or_else(|| {
        CommandResult::failure(
            command,
            "unknown_actor",
            format!("no employee `{actor_id}` in fixture `{}`", path.display()),
            3,
        )
    })?;

    Ok((fixture, actor))
}

pub fn persist(
    command: &str,
    workspace: &Workspace,
    fixture: &Fixture,
    path: &Path,
) -> Result<(), CommandResult> {
    workspace.snapshot(fixture).save(path).map_err(|error| {
        CommandResult::failure(command, "fixture", format!("{error:#}"), 3)
    })
}
