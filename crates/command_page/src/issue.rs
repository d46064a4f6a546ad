use std::{sync::Arc, time::Duration};

use shared::{domain::IssueResult, protocol::CommandDefinition};
use tracing::{debug, info};

use crate::ports::{
    DialogData, DialogKind, DialogOptions, DialogService, HorizontalPosition, NotificationOptions,
    Notifier,
};

pub const ISSUE_DIALOG_WIDTH: &str = "400px";
pub const ISSUED_MESSAGE: &str = "Command issued";
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSettings {
    pub dialog_width: String,
    pub message: String,
    pub action_label: Option<String>,
    pub horizontal_position: HorizontalPosition,
    pub duration: Duration,
}

impl Default for IssueSettings {
    fn default() -> Self {
        Self {
            dialog_width: ISSUE_DIALOG_WIDTH.to_string(),
            message: ISSUED_MESSAGE.to_string(),
            action_label: None,
            horizontal_position: HorizontalPosition::End,
            duration: NOTIFICATION_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    Issued(IssueResult),
    Cancelled,
}

/// Opens the issue dialog once for `command`, waits for it to close and
/// confirms a truthy result with a notification.
pub async fn run_issue_workflow(
    command: Arc<CommandDefinition>,
    dialogs: &dyn DialogService,
    notifier: &dyn Notifier,
    settings: &IssueSettings,
) -> IssueOutcome {
    debug!(
        qualified_name = %command.qualified_name,
        width = %settings.dialog_width,
        "issue: opening dialog"
    );
    let handle = dialogs.open(
        DialogKind::IssueCommand,
        DialogOptions {
            width: settings.dialog_width.clone(),
            data: DialogData {
                command: Arc::clone(&command),
            },
        },
    );

    match handle.after_closed().await {
        Some(result) if result.is_truthy() => {
            info!(
                qualified_name = %command.qualified_name,
                result = %result.value(),
                "issue: command issued"
            );
            notifier.show(
                &settings.message,
                settings.action_label.as_deref(),
                NotificationOptions {
                    horizontal_position: settings.horizontal_position,
                    duration: settings.duration,
                },
            );
            IssueOutcome::Issued(result)
        }
        _ => {
            debug!(qualified_name = %command.qualified_name, "issue: dialog dismissed");
            IssueOutcome::Cancelled
        }
    }
}

#[cfg(test)]
#[path = "tests/issue_tests.rs"]
mod tests;
