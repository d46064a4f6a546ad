use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use futures::StreamExt;
use shared::{
    domain::{InstanceName, QualifiedName},
    error::ParseNameError,
    protocol::CommandDefinition,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    issue::{run_issue_workflow, IssueOutcome, IssueSettings},
    ports::{
        CommandResolver, DialogService, ErrorSink, NavigationParameterSource, NavigationStream,
        Notifier, TitleManager,
    },
    store::{lock, CommandStateStore},
};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation contract violated: {0}")]
    MissingParameter(#[source] ParseNameError),
    #[error("failed to resolve command {name}")]
    Resolution {
        name: QualifiedName,
        #[source]
        source: anyhow::Error,
    },
    #[error("resolution of {name} was superseded by a newer navigation")]
    Superseded { name: QualifiedName },
    #[error("no command is loaded yet")]
    NoCommandLoaded,
}

/// How completions of overlapping resolutions reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionOrdering {
    /// Every completion is published in the order it arrives, so a slow
    /// earlier navigation can overwrite a faster later one.
    #[default]
    CompletionOrder,
    /// Completions belonging to an older navigation are dropped.
    LatestNavigation,
}

impl FromStr for ResolutionOrdering {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "completion-order" | "completion" => Ok(Self::CompletionOrder),
            "latest-navigation" | "latest" => Ok(Self::LatestNavigation),
            other => Err(format!("unknown resolution ordering '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub ordering: ResolutionOrdering,
    pub issue: IssueSettings,
}

pub struct PageDependencies {
    pub instance: InstanceName,
    pub navigation: Arc<dyn NavigationParameterSource>,
    pub resolver: Arc<dyn CommandResolver>,
    pub title: Arc<dyn TitleManager>,
    pub dialogs: Arc<dyn DialogService>,
    pub notifier: Arc<dyn Notifier>,
    pub errors: Arc<dyn ErrorSink>,
}

/// Controller for one visit of the command page. Dropping it stops listening
/// to navigation and aborts resolutions still in flight.
pub struct PageController {
    shared: Arc<PageShared>,
    navigation_task: JoinHandle<()>,
}

struct PageShared {
    instance: InstanceName,
    resolver: Arc<dyn CommandResolver>,
    title: Arc<dyn TitleManager>,
    dialogs: Arc<dyn DialogService>,
    notifier: Arc<dyn Notifier>,
    errors: Arc<dyn ErrorSink>,
    options: PageOptions,
    store: CommandStateStore,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    load_tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct InFlight(Arc<PageShared>);

impl InFlight {
    fn begin(shared: &Arc<PageShared>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PageController {
    /// Must be called from within a tokio runtime.
    pub fn mount(dependencies: PageDependencies, options: PageOptions) -> Self {
        let PageDependencies {
            instance,
            navigation,
            resolver,
            title,
            dialogs,
            notifier,
            errors,
        } = dependencies;

        info!(instance = %instance, ordering = ?options.ordering, "page: mounted");
        let shared = Arc::new(PageShared {
            instance,
            resolver,
            title,
            dialogs,
            notifier,
            errors,
            options,
            store: CommandStateStore::new(),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            load_tasks: Mutex::new(Vec::new()),
        });

        let navigation_task = tokio::spawn(run_navigation(
            Arc::clone(&shared),
            navigation.subscribe(),
        ));

        Self {
            shared,
            navigation_task,
        }
    }

    pub fn instance(&self) -> &InstanceName {
        &self.shared.instance
    }

    pub fn store(&self) -> &CommandStateStore {
        &self.shared.store
    }

    pub fn options(&self) -> &PageOptions {
        &self.shared.options
    }

    pub fn phase(&self) -> PagePhase {
        if self.shared.in_flight.load(Ordering::SeqCst) > 0 {
            PagePhase::Loading
        } else if self.shared.store.current().is_some() {
            PagePhase::Loaded
        } else {
            PagePhase::Idle
        }
    }

    /// Resolves `name` as if it had been navigated to and publishes the result.
    pub async fn load_command(
        &self,
        name: QualifiedName,
    ) -> Result<Arc<CommandDefinition>, PageError> {
        let generation = self.shared.next_generation();
        let in_flight = InFlight::begin(&self.shared);
        let result = self.shared.load(name, generation).await;
        drop(in_flight);
        result
    }

    pub async fn issue_command(&self) -> Result<IssueOutcome, PageError> {
        let Some(command) = self.shared.store.current() else {
            warn!(instance = %self.shared.instance, "page: issue requested before any command loaded");
            return Err(PageError::NoCommandLoaded);
        };

        Ok(run_issue_workflow(
            command,
            self.shared.dialogs.as_ref(),
            self.shared.notifier.as_ref(),
            &self.shared.options.issue,
        )
        .await)
    }

    pub fn unmount(self) {}
}

impl Drop for PageController {
    fn drop(&mut self) {
        self.navigation_task.abort();
        let tasks = std::mem::take(&mut *lock(&self.shared.load_tasks));
        for task in tasks {
            task.abort();
        }
        debug!(instance = %self.shared.instance, "page: unmounted");
    }
}

impl PageShared {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.options.ordering == ResolutionOrdering::LatestNavigation
            && self.generation.load(Ordering::SeqCst) != generation
    }

    fn spawn_load(self: &Arc<Self>, name: QualifiedName, generation: u64) {
        let in_flight = InFlight::begin(self);
        let shared = Arc::clone(self);
        let task = tokio::spawn(async move {
            let _ = shared.load(name, generation).await;
            drop(in_flight);
        });

        let mut tasks = lock(&self.load_tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    async fn load(
        &self,
        name: QualifiedName,
        generation: u64,
    ) -> Result<Arc<CommandDefinition>, PageError> {
        debug!(qualified_name = %name, generation, "page: resolving command");
        let resolved = self.resolver.resolve(&self.instance, &name).await;

        if self.is_stale(generation) {
            debug!(qualified_name = %name, generation, "page: dropping stale resolution");
            return Err(PageError::Superseded { name });
        }

        match resolved {
            Ok(command) => {
                let command = self.store.publish(command);
                self.title.set_title(command.display_name());
                info!(
                    qualified_name = %name,
                    display_name = %command.display_name(),
                    generation,
                    "page: command loaded"
                );
                Ok(command)
            }
            Err(source) => {
                warn!(qualified_name = %name, error = %format!("{source:#}"), "page: resolution failed");
                let err = PageError::Resolution { name, source };
                self.errors.report(&err);
                Err(err)
            }
        }
    }
}

async fn run_navigation(shared: Arc<PageShared>, mut navigation: NavigationStream) {
    while let Some(params) = navigation.next().await {
        let name = match params.qualified_name() {
            Ok(name) => name,
            Err(source) => {
                let err = PageError::MissingParameter(source);
                error!(error = %err, "page: navigation stopped");
                shared.errors.report(&err);
                return;
            }
        };

        let generation = shared.next_generation();
        debug!(qualified_name = %name, generation, "page: navigation");
        shared.spawn_load(name, generation);
    }

    debug!("page: navigation source completed");
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
