use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseNameError;

/// Navigation parameter key carrying the command's qualified name.
pub const QUALIFIED_NAME_PARAM: &str = "qualifiedName";

macro_rules! name_newtype {
    ($name:ident, $kind:literal, $check:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: impl Into<String>) -> Result<Self, ParseNameError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ParseNameError::Empty { kind: $kind });
                }
                $check(&raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseNameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

name_newtype!(QualifiedName, "qualified name", check_qualified_name);
name_newtype!(InstanceName, "instance name", check_instance_name);

fn check_qualified_name(raw: &str) -> Result<(), ParseNameError> {
    if raw.split('/').all(|segment| segment.trim().is_empty()) {
        return Err(ParseNameError::NoSegments {
            raw: raw.to_string(),
        });
    }
    Ok(())
}

fn check_instance_name(raw: &str) -> Result<(), ParseNameError> {
    if raw.contains('/') {
        return Err(ParseNameError::InvalidCharacter {
            kind: "instance name",
            found: '/',
        });
    }
    Ok(())
}

impl QualifiedName {
    /// Path segments of the hierarchical name, without empty leading/trailing parts.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }
}

/// One snapshot of the parameters extracted from the current navigation location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationParams(HashMap<String, String>);

impl NavigationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn for_command(qualified_name: impl Into<String>) -> Self {
        Self::new().with(QUALIFIED_NAME_PARAM, qualified_name)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Extracts the command identifier. A missing key is reported as
    /// [`ParseNameError::Missing`], an empty value as [`ParseNameError::Empty`].
    pub fn qualified_name(&self) -> Result<QualifiedName, ParseNameError> {
        let raw = self
            .get(QUALIFIED_NAME_PARAM)
            .ok_or(ParseNameError::Missing {
                key: QUALIFIED_NAME_PARAM,
            })?;
        QualifiedName::parse(raw)
    }
}

impl From<HashMap<String, String>> for NavigationParams {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

/// Opaque value a dialog closes with. Only its truthiness is inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueResult(pub Value);

impl IssueResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// `null`, `false`, zero and the empty string are falsy; objects and arrays
    /// are truthy even when empty.
    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
