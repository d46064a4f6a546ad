use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::{
    domain::{InstanceName, IssueResult, NavigationParams, QualifiedName},
    protocol::CommandDefinition,
};
use tokio::sync::oneshot;
use tracing::error;

use crate::controller::PageError;

pub type NavigationStream = BoxStream<'static, NavigationParams>;

/// Emits one parameter snapshot per navigation to the page, starting with the
/// current location.
pub trait NavigationParameterSource: Send + Sync {
    fn subscribe(&self) -> NavigationStream;
}

#[async_trait]
pub trait CommandResolver: Send + Sync {
    async fn resolve(
        &self,
        instance: &InstanceName,
        qualified_name: &QualifiedName,
    ) -> Result<CommandDefinition>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    IssueCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogData {
    pub command: Arc<CommandDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub width: String,
    pub data: DialogData,
}

/// Receiving side of an opened dialog. Resolves exactly once.
#[derive(Debug)]
pub struct DialogHandle {
    result: oneshot::Receiver<Option<IssueResult>>,
}

/// Closing side of an opened dialog, kept by the dialog implementation.
#[derive(Debug)]
pub struct DialogCloser {
    tx: oneshot::Sender<Option<IssueResult>>,
}

impl DialogHandle {
    pub fn channel() -> (DialogCloser, DialogHandle) {
        let (tx, result) = oneshot::channel();
        (DialogCloser { tx }, DialogHandle { result })
    }

    /// A closer dropped without a result counts as a dismissed dialog.
    pub async fn after_closed(self) -> Option<IssueResult> {
        self.result.await.ok().flatten()
    }
}

impl DialogCloser {
    pub fn close(self, result: Option<IssueResult>) {
        let _ = self.tx.send(result);
    }

    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

pub trait DialogService: Send + Sync {
    fn open(&self, kind: DialogKind, options: DialogOptions) -> DialogHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalPosition {
    Start,
    Center,
    #[default]
    End,
}

impl HorizontalPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
        }
    }
}

impl fmt::Display for HorizontalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HorizontalPosition {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "start" | "left" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" | "right" => Ok(Self::End),
            other => Err(format!("unknown horizontal position '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationOptions {
    pub horizontal_position: HorizontalPosition,
    pub duration: Duration,
}

/// Fire-and-forget toast display.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, action_label: Option<&str>, options: NotificationOptions);
}

pub trait TitleManager: Send + Sync {
    fn set_title(&self, text: &str);
}

/// Host-provided surface for failures the page does not handle itself.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &PageError);
}

pub struct LoggingErrorSink;

impl ErrorSink for LoggingErrorSink {
    fn report(&self, error: &PageError) {
        error!(error = %error, cause = ?std::error::Error::source(error), "page: unhandled error");
    }
}
