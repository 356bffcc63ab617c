//! Process-wide sanitizer defaults.
//!
//! The defaults are read once at the start of every sanitize call and copied
//! into that call's [`Policy`](crate::policy::Policy). Changing them while a
//! call is in flight has no effect on that call; only later calls see the new
//! values. Updates are not transactional across fields: a reader may observe
//! new tags with old attributes if the two setters race with it.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SanitizeResult;
use crate::safelist;

lazy_static! {
    static ref DEFAULTS: RwLock<SanitizerDefaults> = RwLock::new(SanitizerDefaults::default());
}

/// Policy values used when a call does not override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerDefaults {
    /// Element names kept by the safe-list sanitizer
    pub allowed_tags: HashSet<String>,
    /// Attribute names kept on allowed elements
    pub allowed_attributes: HashSet<String>,
    /// URI schemes accepted in URI-valued attributes and CSS `url()`
    pub allowed_protocols: HashSet<String>,
    /// Disallowed elements whose content is dropped along with them
    pub clean_content_tags: HashSet<String>,
}

fn owned(set: &HashSet<&'static str>) -> HashSet<String> {
    set.iter().map(|entry| entry.to_string()).collect()
}

pub(crate) fn lowercased<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

impl Default for SanitizerDefaults {
    fn default() -> Self {
        Self {
            allowed_tags: owned(&safelist::DEFAULT_ALLOWED_TAGS),
            allowed_attributes: owned(&safelist::DEFAULT_ALLOWED_ATTRIBUTES),
            allowed_protocols: owned(&safelist::ALLOWED_PROTOCOLS),
            clean_content_tags: owned(&safelist::CLEAN_CONTENT_ELEMENTS),
        }
    }
}

impl SanitizerDefaults {
    /// Defaults that admit every element and attribute in the safelist tables.
    pub fn html5() -> Self {
        Self {
            allowed_tags: owned(&safelist::ALLOWED_ELEMENTS),
            allowed_attributes: owned(&safelist::ALLOWED_ATTRIBUTES),
            ..Self::default()
        }
    }

    /// Load defaults from a JSON document. Missing fields keep their default values.
    pub fn from_json(json: &str) -> SanitizeResult<Self> {
        let mut defaults: Self = serde_json::from_str(json)?;
        defaults.normalize();
        Ok(defaults)
    }

    fn normalize(&mut self) {
        self.allowed_tags = lowercased(self.allowed_tags.iter());
        self.allowed_attributes = lowercased(self.allowed_attributes.iter());
        self.allowed_protocols = lowercased(self.allowed_protocols.iter());
        self.clean_content_tags = lowercased(self.clean_content_tags.iter());
    }
}

/// Snapshot of the current process-wide defaults.
pub fn defaults() -> SanitizerDefaults {
    DEFAULTS.read().clone()
}

/// Replace every process-wide default at once.
pub fn install(mut defaults: SanitizerDefaults) {
    defaults.normalize();
    tracing::debug!(
        tags = defaults.allowed_tags.len(),
        attributes = defaults.allowed_attributes.len(),
        "installing sanitizer defaults"
    );
    *DEFAULTS.write() = defaults;
}

/// Restore the built-in defaults.
pub fn reset() {
    *DEFAULTS.write() = SanitizerDefaults::default();
}

pub fn allowed_tags() -> HashSet<String> {
    DEFAULTS.read().allowed_tags.clone()
}

pub fn set_allowed_tags<I, S>(tags: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULTS.write().allowed_tags = lowercased(tags);
}

pub fn allowed_attributes() -> HashSet<String> {
    DEFAULTS.read().allowed_attributes.clone()
}

pub fn set_allowed_attributes<I, S>(attributes: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULTS.write().allowed_attributes = lowercased(attributes);
}

pub fn allowed_protocols() -> HashSet<String> {
    DEFAULTS.read().allowed_protocols.clone()
}

pub fn set_allowed_protocols<I, S>(protocols: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULTS.write().allowed_protocols = lowercased(protocols);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests only read the shared defaults; mutation is covered by the
    // `default_policy` integration test binary.

    #[test]
    fn test_default_policy() {
        let defaults = SanitizerDefaults::default();
        assert!(defaults.allowed_tags.contains("p"));
        assert!(defaults.allowed_tags.contains("a"));
        assert!(!defaults.allowed_tags.contains("script"));
        assert!(!defaults.allowed_tags.contains("form"));
        assert!(defaults.allowed_attributes.contains("href"));
        assert!(!defaults.allowed_attributes.contains("style"));
        assert!(!defaults.allowed_protocols.contains("data"));
        assert!(defaults.clean_content_tags.contains("script"));
    }

    #[test]
    fn test_html5_preset() {
        let defaults = SanitizerDefaults::html5();
        assert!(defaults.allowed_tags.contains("section"));
        assert!(defaults.allowed_tags.contains("svg"));
        assert!(defaults.allowed_attributes.contains("style"));
        assert!(!defaults.allowed_tags.contains("script"));
    }

    #[test]
    fn test_from_json() {
        let defaults = SanitizerDefaults::from_json(r#"{"allowed_tags": ["B", " I ", ""]}"#).unwrap();
        let expected: HashSet<String> = ["b", "i"].iter().map(|s| s.to_string()).collect();
        assert_eq!(defaults.allowed_tags, expected);
        assert_eq!(defaults.allowed_attributes, SanitizerDefaults::default().allowed_attributes);
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        assert!(SanitizerDefaults::from_json(r#"{"allowed_tags": "b"}"#).is_err());
        assert!(SanitizerDefaults::from_json("not json").is_err());
    }

    #[test]
    fn test_lowercased() {
        let set = lowercased(vec!["DIV", "Span"]);
        assert!(set.contains("div"));
        assert!(set.contains("span"));
    }
}
