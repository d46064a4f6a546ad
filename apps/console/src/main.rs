use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use command_page::{PageController, PageDependencies, ResolutionOrdering};
use mdb_client::MdbClient;
use shared::domain::InstanceName;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod host;
mod router;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use host::{
    spawn_issue, ConsoleDialog, ConsoleNotifier, InputNavigation, StderrErrorSink, TerminalTitle,
};
use router::{parse_input, parse_startup_argument, ConsoleInput};

const HELP: &str = "\
/mdb/commands/<qualified name>  open a command (a bare /qualified/name works too)
:issue                          issue the shown command
:yes [json] | :no               close the issue dialog
:show                           print the shown command
:quit                           leave the page";

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    instance: Option<String>,
    #[arg(long)]
    ordering: Option<ResolutionOrdering>,
    /// Qualified name to open right away, with or without the leading '/'.
    command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(instance) = args.instance {
        settings.instance = instance;
    }
    if let Some(ordering) = args.ordering {
        settings.resolution_ordering = ordering;
    }
    debug!(?settings, "console: settings loaded");

    let instance = InstanceName::parse(settings.instance.clone()).context("invalid instance")?;
    let resolver = MdbClient::new(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let (nav_tx, navigation) = InputNavigation::channel();
    let dialogs = Arc::new(ConsoleDialog::default());

    let page = Arc::new(PageController::mount(
        PageDependencies {
            instance,
            navigation: Arc::new(navigation),
            resolver: Arc::new(resolver),
            title: Arc::new(TerminalTitle),
            dialogs: dialogs.clone(),
            notifier: Arc::new(ConsoleNotifier::from_env()),
            errors: Arc::new(StderrErrorSink),
        },
        settings.page_options(),
    ));
    info!(server_url = %settings.server_url, instance = %page.instance(), "console: page ready");

    let _view = page.store().subscribe(|command| {
        println!(
            "== {} ({})",
            command.display_name(),
            command.qualified_name
        );
    });

    if let Some(arg) = args.command {
        match parse_startup_argument(&arg) {
            ConsoleInput::Navigate(params) => {
                let _ = nav_tx.send(params);
            }
            ConsoleInput::Invalid(reason) => eprintln!("cannot open '{arg}': {reason}"),
            other => eprintln!("ignoring startup directive {other:?}; type it at the prompt"),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            ConsoleInput::Navigate(params) => {
                if nav_tx.send(params).is_err() {
                    eprintln!("navigation is closed; restart the console");
                }
            }
            ConsoleInput::Issue => {
                if spawn_issue(Arc::clone(&page), &dialogs).is_none() {
                    eprintln!("a dialog is already open; answer it with :yes or :no");
                }
            }
            ConsoleInput::Answer(result) => {
                if !dialogs.answer(result) {
                    eprintln!("no dialog is open");
                }
            }
            ConsoleInput::Show => match page.store().current() {
                Some(command) => println!("{}", serde_json::to_string_pretty(&*command)?),
                None => println!("no command shown ({:?})", page.phase()),
            },
            ConsoleInput::Help => println!("{HELP}"),
            ConsoleInput::Quit => break,
            ConsoleInput::Invalid(reason) => eprintln!("{reason}"),
        }
    }

    info!("console: leaving page");
    Ok(())
}
