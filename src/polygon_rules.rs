use crate::error::ConfigError;
use crate::osm::Tags;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

const BUNDLED_POLYGON_FEATURES: &str = include_str!("../data/polygon-features.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    /// The key alone makes an area.
    All,
    /// The key makes an area, except for the listed values.
    Whitelist,
    /// The key makes a line, except for the listed values.
    Blacklist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonRule {
    pub mode: RuleMode,
    pub values: HashSet<String>,
}

impl PolygonRule {
    /// Area verdict for one tag value.
    fn verdict(&self, value: &str) -> bool {
        match self.mode {
            RuleMode::All => true,
            RuleMode::Whitelist => !self.values.contains(value),
            RuleMode::Blacklist => self.values.contains(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    key: String,
    mode: RuleMode,
    #[serde(default)]
    values: Vec<String>,
}

/// Precompiled tag key -> rule table consulted by [`is_area`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolygonRules {
    rules: HashMap<String, PolygonRule>,
}

impl PolygonRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing rule for `key`.
    pub fn with_rule<I, S>(mut self, key: &str, mode: RuleMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.insert(
            key.to_string(),
            PolygonRule {
                mode,
                values: values.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Parse a JSON list of `{"key", "mode", "values"}` entries.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<RuleEntry> = serde_json::from_str(json)?;
        let mut rules = HashMap::with_capacity(entries.len());
        for entry in entries {
            if rules.contains_key(&entry.key) {
                return Err(ConfigError::DuplicateRule(entry.key));
            }
            rules.insert(
                entry.key,
                PolygonRule {
                    mode: entry.mode,
                    values: entry.values.into_iter().collect(),
                },
            );
        }
        Ok(PolygonRules { rules })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = read_table(path)?;
        Self::from_json_str(&json)
    }

    /// The table shipped in `data/polygon-features.json`.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json_str(BUNDLED_POLYGON_FEATURES)
    }

    pub fn get(&self, key: &str) -> Option<&PolygonRule> {
        self.rules.get(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Decide whether a closed line with these tags is an area.
///
/// `area=no` and `area=yes` are decisive, then `type=multipolygon` or
/// `type=boundary`. Otherwise every tag with a rule votes; any non-area vote
/// wins, any area vote without one makes an area, and no votes at all means a
/// line.
pub fn is_area(tags: &Tags, rules: &PolygonRules) -> bool {
    match tags.get("area").map(String::as_str) {
        Some("no") => return false,
        Some("yes") => return true,
        _ => {}
    }

    if matches!(
        tags.get("type").map(String::as_str),
        Some("multipolygon") | Some("boundary")
    ) {
        return true;
    }

    let mut area_vote = false;
    for (key, value) in tags {
        if let Some(rule) = rules.get(key) {
            if !rule.verdict(value) {
                return false;
            }
            area_vote = true;
        }
    }
    area_vote
}

#[derive(Debug, Deserialize)]
struct AreaKeysFile {
    #[serde(rename = "areaKeys")]
    area_keys: HashMap<String, serde_json::Value>,
}

/// Tag keys kept on the properties of relation-derived areas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaKeys {
    keys: BTreeSet<String>,
}

impl AreaKeys {
    /// Parse `{"areaKeys": {key: {...}, ...}}`; only the keys are used.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: AreaKeysFile = serde_json::from_str(json)?;
        Ok(file.area_keys.into_keys().collect())
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = read_table(path)?;
        Self::from_json_str(&json)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Copy of `tags` restricted to the listed keys.
    pub fn retain(&self, tags: &Tags) -> Tags {
        tags.iter()
            .filter(|(key, _)| self.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for AreaKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AreaKeys {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn read_table(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
