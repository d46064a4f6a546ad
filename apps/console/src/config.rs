use std::{collections::HashMap, fs, path::Path, time::Duration};

use command_page::{HorizontalPosition, IssueSettings, PageOptions, ResolutionOrdering};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub instance: String,
    pub resolution_ordering: ResolutionOrdering,
    pub dialog_width: String,
    pub notification_duration_ms: u64,
    pub notification_position: HorizontalPosition,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8090".into(),
            instance: "simulator".into(),
            resolution_ordering: ResolutionOrdering::CompletionOrder,
            dialog_width: command_page::ISSUE_DIALOG_WIDTH.into(),
            notification_duration_ms: command_page::NOTIFICATION_DURATION.as_millis() as u64,
            notification_position: HorizontalPosition::End,
        }
    }
}

/// Defaults, overlaid by the TOML file at `path` (if readable), overlaid by
/// `CONSOLE_*` environment variables.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());

    settings
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    let value = match value {
                        toml::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    self.apply(&key, &value);
                }
            }
            Err(err) => warn!(error = %err, "config: ignoring unparsable settings file"),
        }
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in [
            "server_url",
            "instance",
            "resolution_ordering",
            "dialog_width",
            "notification_duration_ms",
            "notification_position",
        ] {
            let var = format!("CONSOLE_{}", key.to_ascii_uppercase());
            if let Some(value) = lookup(&var) {
                self.apply(key, &value);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "server_url" => self.server_url = value.to_string(),
            "instance" => self.instance = value.to_string(),
            "dialog_width" => self.dialog_width = value.to_string(),
            "resolution_ordering" => match value.parse() {
                Ok(ordering) => self.resolution_ordering = ordering,
                Err(err) => warn!(key, error = %err, "config: keeping default"),
            },
            "notification_duration_ms" => match value.trim().parse() {
                Ok(ms) => self.notification_duration_ms = ms,
                Err(err) => warn!(key, error = %err, "config: keeping default"),
            },
            "notification_position" => match value.parse() {
                Ok(position) => self.notification_position = position,
                Err(err) => warn!(key, error = %err, "config: keeping default"),
            },
            other => warn!(key = other, "config: unknown setting"),
        }
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            ordering: self.resolution_ordering,
            issue: IssueSettings {
                dialog_width: self.dialog_width.clone(),
                horizontal_position: self.notification_position,
                duration: Duration::from_millis(self.notification_duration_ms),
                ..IssueSettings::default()
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
