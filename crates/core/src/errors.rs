use thiserror::Error;

use crate::domain::approval::ApprovalId;
use crate::domain::employee::Role;
use crate::domain::order::{OrderId, OrderState};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid order transition from {from:?} to {to:?}")]
    InvalidOrderTransition { from: OrderState, to: OrderState },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failure reported by an external collaborator (record store, directory, calendar...).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{collaborator} unavailable: {message}")]
    Unavailable { collaborator: &'static str, message: String },
    #[error("{collaborator} has no record `{key}`")]
    NotFound { collaborator: &'static str, key: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("order `{0}` not found")]
    OrderNotFound(OrderId),
    #[error("approval `{0}` not found")]
    ApprovalNotFound(ApprovalId),
    #[error("approval `{0}` is already done")]
    ApprovalAlreadyDone(ApprovalId),
    #[error("approval `{approval}` requires role {required}")]
    ApproverNotAuthorized { approval: ApprovalId, required: Role },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class for structured command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidOrderTransition { .. }) => "invalid_transition",
            Self::Domain(DomainError::InvalidInput(_)) => "invalid_input",
            Self::Collaborator(CollaboratorError::Unavailable { .. }) => "collaborator_unavailable",
            Self::Collaborator(CollaboratorError::NotFound { .. }) => "collaborator_not_found",
            Self::OrderNotFound(_) | Self::ApprovalNotFound(_) => "not_found",
            Self::ApprovalAlreadyDone(_) => "approval_closed",
            Self::ApproverNotAuthorized { .. } => "not_authorized",
            Self::Configuration(_) => "configuration",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) | Self::OrderNotFound(_) | Self::ApprovalNotFound(_) => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ApprovalAlreadyDone(_) => "This approval request has already been handled.",
            Self::ApproverNotAuthorized { .. } => {
                "Your role does not allow you to complete this approval."
            }
            Self::Collaborator(_) => "A dependent service is unavailable. Please retry shortly.",
            Self::Configuration(_) => "An unexpected internal error occurred.",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::approval::ApprovalId;
    use crate::domain::employee::Role;
    use crate::domain::order::{OrderId, OrderState};
    use crate::errors::{ApplicationError, CollaboratorError, DomainError};

    #[test]
    fn domain_error_maps_to_invalid_transition_class() {
        let error = ApplicationError::from(DomainError::InvalidOrderTransition {
            from: OrderState::Cancelled,
            to: OrderState::Confirmed,
        });

        assert_eq!(error.error_class(), "invalid_transition");
        assert_eq!(
            error.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn collaborator_outage_maps_to_retryable_message() {
        let error = ApplicationError::from(CollaboratorError::Unavailable {
            collaborator: "calendar",
            message: "connection reset".to_owned(),
        });

        assert_eq!(error.error_class(), "collaborator_unavailable");
        assert!(error.to_string().contains("calendar unavailable"));
    }

    #[test]
    fn missing_order_names_the_order() {
        let error = ApplicationError::OrderNotFound(OrderId("S00077".to_owned()));
        assert_eq!(error.to_string(), "order `S00077` not found");
        assert_eq!(error.error_class(), "not_found");
    }

    #[test]
    fn unauthorized_approver_names_required_role() {
        let error = ApplicationError::ApproverNotAuthorized {
            approval: ApprovalId("A-9".to_owned()),
            required: Role::Manager1,
        };
        assert_eq!(error.to_string(), "approval `A-9` requires role manager_level_1");
        assert_eq!(error.error_class(), "not_authorized");
    }
}
