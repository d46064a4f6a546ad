//! Terminal implementations of the page collaborators.

use std::{
    io::{IsTerminal, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use command_page::{
    DialogCloser, DialogHandle, DialogKind, DialogOptions, DialogService, ErrorSink,
    HorizontalPosition, IssueOutcome, LoggingErrorSink, NavigationParameterSource,
    NavigationStream, NotificationOptions, Notifier, PageController, PageError, TitleManager,
};
use futures::StreamExt;
use shared::domain::{IssueResult, NavigationParams};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

const DEFAULT_COLUMNS: usize = 80;

/// Navigation fed by the input loop. The stream can be taken once per page.
pub struct InputNavigation {
    rx: Mutex<Option<mpsc::UnboundedReceiver<NavigationParams>>>,
}

impl InputNavigation {
    pub fn channel() -> (mpsc::UnboundedSender<NavigationParams>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }
}

impl NavigationParameterSource for InputNavigation {
    fn subscribe(&self) -> NavigationStream {
        match self.rx.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => {
                warn!("navigation: stream already taken");
                futures::stream::empty().boxed()
            }
        }
    }
}

/// Prints the command summary and waits for `:yes` / `:no` from the input loop.
#[derive(Default)]
pub struct ConsoleDialog {
    pending: Mutex<Option<DialogCloser>>,
    issuing: AtomicBool,
}

/// Held by an issue workflow from dispatch until it finishes.
pub struct IssueReservation {
    dialogs: Arc<ConsoleDialog>,
}

impl Drop for IssueReservation {
    fn drop(&mut self) {
        self.dialogs.issuing.store(false, Ordering::Release);
    }
}

impl ConsoleDialog {
    /// At most one issue workflow runs at a time; `None` while one is being
    /// dispatched or its dialog is still waiting for an answer.
    pub fn reserve(self: &Arc<Self>) -> Option<IssueReservation> {
        if self.is_open() {
            return None;
        }
        self.issuing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(IssueReservation {
            dialogs: Arc::clone(self),
        })
    }

    pub fn is_open(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|closer| !closer.is_abandoned())
    }

    /// Returns false when no dialog is waiting for an answer.
    pub fn answer(&self, result: Option<IssueResult>) -> bool {
        let closer = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match closer {
            Some(closer) => {
                closer.close(result);
                true
            }
            None => false,
        }
    }
}

impl DialogService for ConsoleDialog {
    fn open(&self, kind: DialogKind, options: DialogOptions) -> DialogHandle {
        let (closer, handle) = DialogHandle::channel();
        let replaced = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(closer);
        if replaced.is_some() {
            debug!("dialog: previous dialog dismissed by a new one");
        }

        let command = &options.data.command;
        let rule = "-".repeat(width_in_columns(&options.width));
        println!("{rule}");
        println!("{kind:?}: {} ({})", command.display_name(), command.qualified_name);
        if let Some(description) = &command.short_description {
            println!("  {description}");
        }
        if command.is_abstract {
            println!("  note: abstract command");
        }
        if let Some(significance) = &command.significance {
            println!(
                "  significance: {:?}{}",
                significance.consequence_level,
                significance
                    .reason_for_warning
                    .as_deref()
                    .map(|reason| format!(" ({reason})"))
                    .unwrap_or_default()
            );
        }
        for argument in command.all_arguments() {
            println!(
                "  {} = {}",
                argument.name,
                argument.initial_value.as_deref().unwrap_or("<required>")
            );
        }
        println!("issue? :yes [json] / :no");
        println!("{rule}");

        handle
    }
}

// "400px" at roughly 8px per cell, clamped to something printable.
fn width_in_columns(css_width: &str) -> usize {
    css_width
        .trim()
        .trim_end_matches("px")
        .parse::<usize>()
        .map(|px| (px / 8).clamp(20, 120))
        .unwrap_or(50)
}

pub struct ConsoleNotifier {
    columns: usize,
}

impl ConsoleNotifier {
    pub fn from_env() -> Self {
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_COLUMNS);
        Self { columns }
    }

    pub fn with_columns(columns: usize) -> Self {
        Self { columns }
    }

    pub fn render(
        &self,
        message: &str,
        action_label: Option<&str>,
        position: HorizontalPosition,
    ) -> String {
        let text = match action_label {
            Some(action) => format!("[ {message} | {action} ]"),
            None => format!("[ {message} ]"),
        };
        let free = self.columns.saturating_sub(text.chars().count());
        let indent = match position {
            HorizontalPosition::Start => 0,
            HorizontalPosition::Center => free / 2,
            HorizontalPosition::End => free,
        };
        format!("{}{text}", " ".repeat(indent))
    }
}

impl Notifier for ConsoleNotifier {
    fn show(&self, message: &str, action_label: Option<&str>, options: NotificationOptions) {
        debug!(
            notification = message,
            position = %options.horizontal_position,
            duration_ms = options.duration.as_millis() as u64,
            "notification: shown"
        );
        println!(
            "{}",
            self.render(message, action_label, options.horizontal_position)
        );
    }
}

/// Runs `:issue` in the background unless another issue is still pending.
pub fn spawn_issue(
    page: Arc<PageController>,
    dialogs: &Arc<ConsoleDialog>,
) -> Option<JoinHandle<Result<IssueOutcome, PageError>>> {
    let reservation = dialogs.reserve()?;
    Some(tokio::spawn(async move {
        let outcome = page.issue_command().await;
        drop(reservation);
        match &outcome {
            Ok(IssueOutcome::Issued(result)) => {
                debug!(result = %result.value(), "console: issue confirmed")
            }
            Ok(IssueOutcome::Cancelled) => println!("issue cancelled"),
            Err(PageError::NoCommandLoaded) => eprintln!("no command shown yet; open one first"),
            Err(err) => eprintln!("error: {err}"),
        }
        outcome
    }))
}

pub struct TerminalTitle;

impl TitleManager for TerminalTitle {
    fn set_title(&self, text: &str) {
        info!(title = %text, "title: updated");
        let mut stdout = std::io::stdout();
        if stdout.is_terminal() {
            let _ = write!(stdout, "\x1b]0;{text}\x07");
            let _ = stdout.flush();
        }
    }
}

/// Global surface for failures the page leaves unhandled: logged, then
/// printed for the user.
pub struct StderrErrorSink;

impl ErrorSink for StderrErrorSink {
    fn report(&self, error: &PageError) {
        LoggingErrorSink.report(error);
        match error {
            PageError::Resolution { source, .. } => eprintln!("error: {error}: {source:#}"),
            PageError::MissingParameter(_) => {
                eprintln!("fatal: {error}; navigation is no longer processed")
            }
            other => eprintln!("error: {other}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
