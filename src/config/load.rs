use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use super::ConfigGroups;
use crate::error::StartupError;

pub const DEFAULT_PROFILE: &str = "local";
const PROFILES_KEY: &str = "profiles";

/// Load configuration groups from a YAML, JSON or TOML file.
///
/// Top-level tables are groups. Nested tables inside a group flatten into
/// dotted keys, so `tokenAuth: { token: x }` and `tokenAuth.token: x` are the
/// same entry. Scalars are stored as strings and arrays are joined with `,`.
/// A `profiles.<profile>` section is overlaid on the base groups.
pub fn load_config_file(path: &Path, profile: Option<&str>) -> Result<ConfigGroups, StartupError> {
    let fail = |reason: String| StartupError::ConfigLoad {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let value: Value = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| fail(e.to_string()))?,
        "toml" => toml::from_str(&content).map_err(|e| fail(e.to_string()))?,
        "json" => serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?,
        other => return Err(fail(format!("unsupported config format '{other}'"))),
    };

    let profile = profile.unwrap_or(DEFAULT_PROFILE);
    let groups = groups_from_value(&value, profile).map_err(fail)?;
    info!(
        path = %path.display(),
        profile = %profile,
        groups = groups.group_names().count(),
        "Configuration loaded"
    );
    Ok(groups)
}

fn groups_from_value(value: &Value, profile: &str) -> Result<ConfigGroups, String> {
    let root = match value {
        Value::Object(root) => root,
        Value::Null => return Ok(ConfigGroups::new()),
        _ => return Err("top level must be a table of groups".to_string()),
    };

    let mut groups = ConfigGroups::new();
    for (name, body) in root.iter().filter(|(name, _)| name.as_str() != PROFILES_KEY) {
        add_group(&mut groups, name, body)?;
    }

    if let Some(overlay) = root.get(PROFILES_KEY).and_then(|p| p.get(profile)) {
        let Value::Object(overlay) = overlay else {
            return Err(format!("profile '{profile}' must be a table of groups"));
        };
        debug!(profile = %profile, "Applying configuration profile");
        let mut profiled = ConfigGroups::new();
        for (name, body) in overlay {
            add_group(&mut profiled, name, body)?;
        }
        groups.merge(profiled);
    }
    Ok(groups)
}

fn add_group(groups: &mut ConfigGroups, name: &str, body: &Value) -> Result<(), String> {
    match body {
        Value::Object(entries) => {
            for (key, value) in entries {
                flatten_into(groups, name, key, value);
            }
            Ok(())
        }
        Value::Null => Ok(()),
        _ => Err(format!("group '{name}' must be a table")),
    }
}

fn flatten_into(groups: &mut ConfigGroups, group: &str, key: &str, value: &Value) {
    match value {
        Value::Object(entries) => {
            for (child, value) in entries {
                flatten_into(groups, group, &format!("{key}.{child}"), value);
            }
        }
        Value::Null => {}
        Value::Array(items) => {
            let joined: Vec<String> = items.iter().filter_map(scalar_text).collect();
            groups.put(group, key, joined.join(","));
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                groups.put(group, key, text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
