use std::path::Path;

use quoteguard_core::collaborators::Notice;
use quoteguard_core::config::AppConfig;
use quoteguard_core::confirmation::ConfirmationOutcome;
use quoteguard_core::domain::approval::ApprovalId;
use serde::Serialize;

use crate::commands::fixture::{open_for, persist, Workspace};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ApproveReport {
    outcome: ConfirmationOutcome,
    notices: Vec<Notice>,
}

pub fn run(
    config: &AppConfig,
    fixture_path: &Path,
    approval_id: &str,
    approver_id: &str,
    note: &str,
) -> CommandResult {
    let (fixture, approver) = match open_for("approve", fixture_path, approver_id) {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };
    let workspace = Workspace::open(&fixture, config);

    let outcome = match workspace.service.complete_approval(
        &ApprovalId(approval_id.to_string()),
        &approver,
        note,
    ) {
        Ok(outcome) => outcome,
        Err(error) => {
            return CommandResult::failure("approve", error.error_class(), error.to_string(), 4);
        }
    };

    if let Err(failure) = persist("approve", &workspace, &fixture, fixture_path) {
        return failure;
    }

    let message = format!("approval {approval_id} completed by {}", approver.name);
    CommandResult::success_with_data(
        "approve",
        message,
        &ApproveReport { outcome, notices: workspace.notices.notices() },
    )
}
