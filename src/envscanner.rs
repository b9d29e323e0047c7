//! Finds `.Env.NAME` placeholders referenced by a profile or group.
use anyhow::{Context as _, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.Env\.([A-Za-z_][A-Za-z0-9_]*)").ok());

/// Parsed document, kept in its native value type.
enum Document {
    Yaml(serde_yaml::Value),
    Toml(toml::Table),
}

/// Return the sorted, unique environment variable names referenced under
/// `profiles.<name>` (or `groups.<name>` when no such profile exists).
///
/// A missing profile or group, or an empty file, yields an empty list.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn scan_for_env_variables(config_file: &Path, name: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(config_file)
        .with_context(|| format!("failed to read config file {}", config_file.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let is_toml = config_file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let document = if is_toml {
        Document::Toml(
            toml::from_str(&content)
                .with_context(|| format!("failed to parse TOML from {}", config_file.display()))?,
        )
    } else {
        Document::Yaml(
            serde_yaml::from_str(&content).with_context(|| {
                format!("failed to unmarshal YAML from {}", config_file.display())
            })?,
        )
    };

    let mut found = BTreeSet::new();
    match &document {
        Document::Yaml(root) => {
            let section = ["profiles", "groups"]
                .into_iter()
                .find_map(|top| root.get(top).and_then(|t| t.get(name)));
            if let Some(section) = section {
                scan_yaml(section, &mut found);
            }
        }
        Document::Toml(root) => {
            let section = ["profiles", "groups"]
                .into_iter()
                .find_map(|top| root.get(top).and_then(|t| t.get(name)));
            if let Some(section) = section {
                scan_toml(section, &mut found);
            }
        }
    }
    Ok(found.into_iter().collect())
}

fn scan_str(value: &str, found: &mut BTreeSet<String>) {
    let Some(re) = ENV_VAR.as_ref() else {
        return;
    };
    for captures in re.captures_iter(value) {
        if let Some(name) = captures.get(1) {
            found.insert(name.as_str().to_string());
        }
    }
}

fn scan_yaml(value: &serde_yaml::Value, found: &mut BTreeSet<String>) {
    use serde_yaml::Value;
    match value {
        Value::String(s) => scan_str(s, found),
        Value::Sequence(items) => items.iter().for_each(|v| scan_yaml(v, found)),
        Value::Mapping(map) => {
            for (key, value) in map {
                scan_yaml(key, found);
                scan_yaml(value, found);
            }
        }
        Value::Tagged(tagged) => scan_yaml(&tagged.value, found),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn scan_toml(value: &toml::Value, found: &mut BTreeSet<String>) {
    use toml::Value;
    match value {
        Value::String(s) => scan_str(s, found),
        Value::Array(items) => items.iter().for_each(|v| scan_toml(v, found)),
        Value::Table(table) => {
            for (key, value) in table {
                scan_str(key, found);
                scan_toml(value, found);
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => {}
    }
}
