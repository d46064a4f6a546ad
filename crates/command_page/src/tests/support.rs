//! Recording fakes for the page collaborators.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use shared::{
    domain::{InstanceName, IssueResult, NavigationParams, QualifiedName},
    protocol::CommandDefinition,
};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    CommandResolver, DialogHandle, DialogKind, DialogOptions, DialogService, ErrorSink,
    NavigationParameterSource, NavigationStream, NotificationOptions, Notifier, PageError,
    TitleManager,
};

pub fn qualified(raw: &str) -> QualifiedName {
    QualifiedName::parse(raw).expect("qualified name")
}

pub fn instance() -> InstanceName {
    InstanceName::parse("simulator").expect("instance")
}

pub fn command(raw_name: &str, display_name: &str) -> CommandDefinition {
    CommandDefinition::new(display_name, qualified(raw_name))
}

/// Lets spawned tasks on the current-thread runtime run to their next await.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for value")
        .expect("channel closed")
}

pub struct ChannelNavigation {
    rx: Mutex<Option<mpsc::UnboundedReceiver<NavigationParams>>>,
}

impl ChannelNavigation {
    pub fn new() -> (mpsc::UnboundedSender<NavigationParams>, Arc<Self>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Arc::new(Self {
                rx: Mutex::new(Some(rx)),
            }),
        )
    }
}

impl NavigationParameterSource for ChannelNavigation {
    fn subscribe(&self) -> NavigationStream {
        match self.rx.lock().expect("navigation lock").take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => futures::stream::empty().boxed(),
        }
    }
}

/// Resolves from a fixed table and records every call.
#[derive(Default)]
pub struct TableResolver {
    commands: HashMap<String, CommandDefinition>,
    pub calls: Mutex<Vec<(InstanceName, QualifiedName)>>,
}

impl TableResolver {
    pub fn with(mut self, definition: CommandDefinition) -> Self {
        self.commands
            .insert(definition.qualified_name.to_string(), definition);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl CommandResolver for TableResolver {
    async fn resolve(
        &self,
        instance: &InstanceName,
        qualified_name: &QualifiedName,
    ) -> Result<CommandDefinition> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((instance.clone(), qualified_name.clone()));
        self.commands
            .get(qualified_name.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("command {qualified_name} not found"))
    }
}

pub type PendingResolution = (QualifiedName, oneshot::Sender<Result<CommandDefinition>>);

/// Parks every resolution until the test answers it, so completion order is
/// under the test's control.
pub struct GatedResolver {
    requests: mpsc::UnboundedSender<PendingResolution>,
}

impl GatedResolver {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingResolution>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { requests }), rx)
    }
}

#[async_trait]
impl CommandResolver for GatedResolver {
    async fn resolve(
        &self,
        _instance: &InstanceName,
        qualified_name: &QualifiedName,
    ) -> Result<CommandDefinition> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send((qualified_name.clone(), tx))
            .map_err(|_| anyhow!("test dropped the request receiver"))?;
        rx.await.map_err(|_| anyhow!("test dropped the pending resolution"))?
    }
}

#[derive(Default)]
pub struct RecordingTitle {
    pub titles: Mutex<Vec<String>>,
}

impl RecordingTitle {
    pub fn last(&self) -> Option<String> {
        self.titles.lock().expect("titles lock").last().cloned()
    }
}

impl TitleManager for RecordingTitle {
    fn set_title(&self, text: &str) {
        self.titles.lock().expect("titles lock").push(text.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownNotification {
    pub message: String,
    pub action_label: Option<String>,
    pub options: NotificationOptions,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<ShownNotification>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<ShownNotification> {
        self.shown.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: &str, action_label: Option<&str>, options: NotificationOptions) {
        self.shown
            .lock()
            .expect("notifier lock")
            .push(ShownNotification {
                message: message.to_string(),
                action_label: action_label.map(str::to_string),
                options,
            });
    }
}

pub enum DialogReply {
    Close(Option<IssueResult>),
    Abandon,
}

/// Closes every dialog right after opening it with the configured reply.
pub struct ScriptedDialog {
    reply: Mutex<DialogReply>,
    pub opened: Mutex<Vec<(DialogKind, DialogOptions)>>,
}

impl ScriptedDialog {
    pub fn replying(reply: DialogReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().expect("dialog lock").len()
    }
}

impl DialogService for ScriptedDialog {
    fn open(&self, kind: DialogKind, options: DialogOptions) -> DialogHandle {
        self.opened
            .lock()
            .expect("dialog lock")
            .push((kind, options));
        let (closer, handle) = DialogHandle::channel();
        match &*self.reply.lock().expect("reply lock") {
            DialogReply::Close(result) => closer.close(result.clone()),
            DialogReply::Abandon => drop(closer),
        }
        handle
    }
}

#[derive(Default)]
pub struct RecordingErrorSink {
    pub reported: Mutex<Vec<String>>,
    pub missing_parameter: Mutex<usize>,
}

impl RecordingErrorSink {
    pub fn reported(&self) -> Vec<String> {
        self.reported.lock().expect("errors lock").clone()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn report(&self, error: &PageError) {
        if matches!(error, PageError::MissingParameter(_)) {
            *self.missing_parameter.lock().expect("errors lock") += 1;
        }
        self.reported
            .lock()
            .expect("errors lock")
            .push(error.to_string());
    }
}
