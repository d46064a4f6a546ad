use serde::{Deserialize, Serialize};

use crate::domain::QualifiedName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedObjectId {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentType {
    #[serde(default)]
    pub eng_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub argument_type: Option<ArgumentType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequenceLevel {
    None,
    Watch,
    Warning,
    Distress,
    Critical,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Significance {
    pub consequence_level: ConsequenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_warning: Option<String>,
}

/// Immutable description of one command as served by the mission database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    pub name: String,
    pub qualified_name: QualifiedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(rename = "alias", default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<NamedObjectId>,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_command: Option<Box<CommandDefinition>>,
    #[serde(rename = "argument", default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<Significance>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, qualified_name: QualifiedName) -> Self {
        Self {
            name: name.into(),
            qualified_name,
            short_description: None,
            long_description: None,
            aliases: Vec::new(),
            is_abstract: false,
            base_command: None,
            arguments: Vec::new(),
            significance: None,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Arguments in declaration order, inherited ones from the base chain first.
    pub fn all_arguments(&self) -> Vec<&ArgumentInfo> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(command) = current {
            chain.push(command);
            current = command.base_command.as_deref();
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|command| command.arguments.iter())
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
