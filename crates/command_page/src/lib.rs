//! Page controller for a single command definition: navigation-driven loading,
//! a replayable state store for views and the issue-command dialog workflow.

mod controller;
mod issue;
mod ports;
mod store;

pub use controller::{
    PageController, PageDependencies, PageError, PageOptions, PagePhase, ResolutionOrdering,
};
pub use issue::{
    run_issue_workflow, IssueOutcome, IssueSettings, ISSUED_MESSAGE, ISSUE_DIALOG_WIDTH,
    NOTIFICATION_DURATION,
};
pub use ports::{
    CommandResolver, DialogCloser, DialogData, DialogHandle, DialogKind, DialogOptions,
    DialogService, ErrorSink, HorizontalPosition, LoggingErrorSink, NavigationParameterSource,
    NavigationStream, NotificationOptions, Notifier, TitleManager,
};
pub use store::{CommandStateStore, Subscription};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
