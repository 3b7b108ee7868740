//! # Configuration
//!
//! Configuration is a two-level `group -> key -> value` string map,
//! [`ConfigGroups`]. The router reads the `web` group through the typed
//! [`WebConfig`] view:
//!
//! | Key | Meaning |
//! |---|---|
//! | `workBase` | handler discovery root, default `handlers` |
//! | `ignoreUrl` | regex selecting static asset paths; unset disables static serving |
//! | `filterNames` | comma-separated, ordered list of filter names |
//! | `<filterName>.<key>` | per-filter settings, handed to that filter's factory |
//!
//! Groups come either from `(group, key, value)` triples, the shape of a
//! relational config table, or from a YAML, JSON or TOML file (see
//! [`load_config_file`]).

mod load;

use std::collections::BTreeMap;

use tracing::warn;

pub use load::{load_config_file, DEFAULT_PROFILE};

/// Group holding the router settings.
pub const WEB_GROUP: &str = "web";
pub const DEFAULT_WORK_BASE: &str = "handlers";
/// Environment variable consulted when no web root is configured explicitly.
pub const WEB_ROOT_ENV: &str = "ROUTER_WEB_ROOT";

pub type ConfigGroup = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigGroups {
    groups: BTreeMap<String, ConfigGroup>,
}

impl ConfigGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(group, key, value)` rows. Later rows win.
    pub fn from_triples<I, G, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (G, K, V)>,
        G: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut groups = Self::new();
        for (group, key, value) in rows {
            groups.put(group, key, value);
        }
        groups
    }

    pub fn put(
        &mut self,
        group: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&ConfigGroup> {
        self.groups.get(name)
    }

    #[must_use]
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.group(group)?.get(key).map(String::as_str)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Overlay every entry of `other` onto `self`.
    pub fn merge(&mut self, other: ConfigGroups) {
        for (group, entries) in other.groups {
            self.groups.entry(group).or_default().extend(entries);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Remove every `<prefix><key>` entry from `map` and return them keyed by
/// `<key>`.
pub fn remove_sub_map(map: &mut ConfigGroup, prefix: &str) -> ConfigGroup {
    let keys: Vec<String> = map
        .keys()
        .filter(|k| k.len() > prefix.len() && k.starts_with(prefix))
        .cloned()
        .collect();

    keys.into_iter()
        .filter_map(|key| {
            let value = map.remove(&key)?;
            Some((key[prefix.len()..].to_string(), value))
        })
        .collect()
}

/// Settings of one configured filter, its name prefix already stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    name: String,
    values: ConfigGroup,
}

impl FilterConfig {
    pub fn new(name: impl Into<String>, values: ConfigGroup) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed value of `key`; blank values count as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn require(&self, key: &str) -> anyhow::Result<&str> {
        self.get(key)
            .ok_or_else(|| anyhow::anyhow!("missing required setting '{}.{}'", self.name, key))
    }

    #[must_use]
    pub fn values(&self) -> &ConfigGroup {
        &self.values
    }
}

/// Typed view of the `web` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub work_base: String,
    pub ignore_url: Option<String>,
    /// Filters in chain order.
    pub filters: Vec<FilterConfig>,
    /// Entries of the group not claimed by any of the above.
    pub extra: ConfigGroup,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            work_base: DEFAULT_WORK_BASE.to_string(),
            ignore_url: None,
            filters: Vec::new(),
            extra: ConfigGroup::new(),
        }
    }
}

impl WebConfig {
    #[must_use]
    pub fn from_groups(groups: &ConfigGroups) -> Self {
        groups
            .group(WEB_GROUP)
            .map(Self::from_group)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn from_group(group: &ConfigGroup) -> Self {
        let mut map = group.clone();
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let work_base =
            non_blank(map.remove("workBase")).unwrap_or_else(|| DEFAULT_WORK_BASE.to_string());
        let ignore_url = non_blank(map.remove("ignoreUrl"));

        let mut filters: Vec<FilterConfig> = Vec::new();
        if let Some(names) = map.remove("filterNames") {
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if filters.iter().any(|f| f.name() == name) {
                    warn!(filter = %name, "Filter listed twice in filterNames; keeping the first");
                    continue;
                }
                let values = remove_sub_map(&mut map, &format!("{name}."));
                filters.push(FilterConfig::new(name, values));
            }
        }

        Self {
            work_base,
            ignore_url,
            filters,
            extra: map,
        }
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(FilterConfig::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web(rows: &[(&str, &str)]) -> WebConfig {
        let groups = ConfigGroups::from_triples(rows.iter().map(|(k, v)| (WEB_GROUP, *k, *v)));
        WebConfig::from_groups(&groups)
    }

    #[test]
    fn test_defaults_without_web_group() {
        let config = WebConfig::from_groups(&ConfigGroups::new());
        assert_eq!(config, WebConfig::default());
        assert_eq!(config.work_base, "handlers");
    }

    #[test]
    fn test_filter_names_keep_order_and_skip_blanks() {
        let config = web(&[("filterNames", " auth, ,log ,metrics,")]);
        let names: Vec<&str> = config.filter_names().collect();
        assert_eq!(names, ["auth", "log", "metrics"]);
    }

    #[test]
    fn test_filter_settings_are_split_out() {
        let config = web(&[
            ("filterNames", "auth"),
            ("auth.token", "s3cret"),
            ("auth.pattern", "^/api/"),
            ("authority", "unrelated"),
            ("ignoreUrl", "  "),
        ]);
        let auth = &config.filters[0];
        assert_eq!(auth.get("token"), Some("s3cret"));
        assert_eq!(auth.get("pattern"), Some("^/api/"));
        assert_eq!(auth.values().len(), 2);
        assert_eq!(config.ignore_url, None);
        assert_eq!(config.extra.get("authority").map(String::as_str), Some("unrelated"));
    }

    #[test]
    fn test_remove_sub_map_strips_prefix() {
        let mut map = ConfigGroup::from([
            ("log.level".to_string(), "debug".to_string()),
            ("log.".to_string(), "empty key".to_string()),
            ("login".to_string(), "x".to_string()),
        ]);
        let sub = remove_sub_map(&mut map, "log.");
        assert_eq!(sub.get("level").map(String::as_str), Some("debug"));
        assert_eq!(sub.len(), 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_require_names_missing_key() {
        let filter = FilterConfig::new("tokenAuth", ConfigGroup::new());
        let err = filter.require("token").unwrap_err();
        assert_eq!(err.to_string(), "missing required setting 'tokenAuth.token'");
        assert_eq!(filter.get_or("header", "authorization"), "authorization");
    }

    #[test]
    fn test_triples_later_rows_win() {
        let groups = ConfigGroups::from_triples([
            ("web", "workBase", "a"),
            ("db", "url", "postgres://"),
            ("web", "workBase", "b"),
        ]);
        assert_eq!(groups.get("web", "workBase"), Some("b"));
        assert_eq!(groups.group_names().collect::<Vec<_>>(), ["db", "web"]);
    }
}
