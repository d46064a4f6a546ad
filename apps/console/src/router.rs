use serde_json::{json, Value};
use shared::domain::{IssueResult, NavigationParams, QualifiedName};

const COMMAND_ROUTE: &str = "/mdb/commands/";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Navigate(NavigationParams),
    Issue,
    Answer(Option<IssueResult>),
    Show,
    Help,
    Quit,
    Invalid(String),
}

/// Maps one line of user input to an action. Paths under `/mdb/commands/`
/// carry the qualified name after the prefix; any other path is taken as a
/// qualified name itself.
pub fn parse_input(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(directive) = line.strip_prefix(':') {
        let (word, rest) = directive
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((directive, ""));
        return Some(match word {
            "issue" => ConsoleInput::Issue,
            "yes" | "y" => parse_acceptance(rest),
            "no" | "n" => ConsoleInput::Answer(None),
            "show" => ConsoleInput::Show,
            "help" | "h" => ConsoleInput::Help,
            "quit" | "q" => ConsoleInput::Quit,
            other => ConsoleInput::Invalid(format!("unknown directive ':{other}'")),
        });
    }

    Some(match route(line) {
        Some(params) => ConsoleInput::Navigate(params),
        None => ConsoleInput::Invalid(format!("no route matches '{line}'")),
    })
}

/// The positional argument of the binary: a qualified name with or without
/// its leading '/', or a full `/mdb/commands/...` path. Directives are
/// returned as parsed so the caller can refuse them.
pub fn parse_startup_argument(arg: &str) -> ConsoleInput {
    let arg = arg.trim();
    let line = if arg.starts_with('/') || arg.starts_with(':') {
        arg.to_string()
    } else {
        format!("/{arg}")
    };
    parse_input(&line)
        .unwrap_or_else(|| ConsoleInput::Invalid("no command given to open".to_string()))
}

fn route(path: &str) -> Option<NavigationParams> {
    if !path.starts_with('/') {
        return None;
    }

    let name = match path.strip_prefix(COMMAND_ROUTE) {
        Some(rest) => format!("/{}", rest.trim_start_matches('/')),
        None => path.to_string(),
    };
    let name = QualifiedName::parse(name).ok()?;
    Some(NavigationParams::for_command(name))
}

fn parse_acceptance(rest: &str) -> ConsoleInput {
    if rest.is_empty() {
        return ConsoleInput::Answer(Some(IssueResult::new(json!({ "accepted": true }))));
    }
    match serde_json::from_str::<Value>(rest) {
        Ok(value) => ConsoleInput::Answer(Some(IssueResult::new(value))),
        Err(err) => ConsoleInput::Invalid(format!("dialog result is not valid JSON: {err}")),
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
