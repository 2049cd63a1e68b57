use std::path::Path;

use quoteguard_core::config::AppConfig;
use quoteguard_core::domain::order::OrderId;

use crate::commands::fixture::{open_for, persist, Workspace};
use crate::commands::CommandResult;

pub fn run(
    config: &AppConfig,
    fixture_path: &Path,
    order_id: &str,
    actor_id: &str,
) -> CommandResult {
    let (fixture, actor) = match open_for("cancel", fixture_path, actor_id) {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };
    let workspace = Workspace::open(&fixture, config);

    let order = match workspace.service.cancel(&OrderId(order_id.to_string()), &actor) {
        Ok(order) => order,
        Err(error) => {
            return CommandResult::failure("cancel", error.error_class(), error.to_string(), 4);
        }
    };

    if let Err(failure) = persist("cancel", &workspace, &fixture, fixture_path) {
        return failure;
    }

    CommandResult::success("cancel", format!("quotation {} cancelled by {}", order.name, actor.name))
}
