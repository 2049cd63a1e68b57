pub mod approvals;
pub mod audit;
pub mod calendar;
pub mod collaborators;
pub mod config;
pub mod confirmation;
pub mod domain;
pub mod errors;

pub use approvals::{ApprovalPolicy, ApprovalResolver, Decision, RejectReason, Tier};
pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use calendar::{schedule_training_events, EventShape, TrainingPlan};
pub use collaborators::{
    Calendar, EmployeeDirectory, InMemoryCalendar, InMemoryEmployeeDirectory, InMemoryNoticeBoard,
    InMemoryOrderStore, InMemoryTaskScheduler, Notice, NoticeBoard, NoticeLevel, OrderStore,
    TaskScheduler,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use confirmation::{
    Actor, Collaborators, ConfirmationOutcome, ConfirmationService, ScheduledEvent,
};
pub use domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
pub use domain::employee::{Employee, EmployeeId, Role, UserId};
pub use domain::event::{EventId, EventRequest};
pub use domain::order::{Order, OrderId, OrderLine, OrderLineId, OrderState, Partner, PartnerId};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, CollaboratorError, DomainError};
