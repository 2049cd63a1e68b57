use std::path::Path;

use quoteguard_core::collaborators::Notice;
use quoteguard_core::config::AppConfig;
use quoteguard_core::confirmation::ConfirmationOutcome;
use quoteguard_core::domain::order::OrderId;
use serde::Serialize;

use crate::commands::fixture::{open_for, persist, Workspace};
use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfirmReport {
    results: Vec<OrderReport>,
    notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
struct OrderReport {
    order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<ConfirmationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(
    config: &AppConfig,
    fixture_path: &Path,
    order_ids: &[String],
    actor_id: &str,
) -> CommandResult {
    let (fixture, actor) = match open_for("confirm", fixture_path, actor_id) {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };
    let workspace = Workspace::open(&fixture, config);

    let ids = order_ids.iter().map(|id| OrderId(id.clone())).collect::<Vec<_>>();
    let results = workspace
        .service
        .confirm_batch(&ids, &actor)
        .into_iter()
        .map(|(order_id, result)| match result {
            Ok(outcome) => {
                OrderReport { order_id, outcome: Some(outcome), error_class: None, error: None }
            }
            Err(error) => OrderReport {
                order_id,
                outcome: None,
                error_class: Some(error.error_class().to_string()),
                error: Some(error.to_string()),
            },
        })
        .collect::<Vec<_>>();

    if let Err(failure) = persist("confirm", &workspace, &fixture, fixture_path) {
        return failure;
    }

    let confirmed = results
        .iter()
        .filter(|report| report.outcome.as_ref().is_some_and(ConfirmationOutcome::is_confirmed))
        .count();
    let message = format!("{confirmed} of {} orders confirmed by {}", results.len(), actor.name);

    CommandResult::success_with_data(
        "confirm",
        message,
        &ConfirmReport { results, notices: workspace.notices.notices() },
    )
}
