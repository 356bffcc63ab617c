//! Per-call policy resolution.
//!
//! [`SanitizeOptions`] carries what a caller overrides for one call;
//! [`Policy`] is the fully resolved, immutable rule set a scrubber consults.

use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use crate::config::{self, lowercased, SanitizerDefaults};
use crate::error::{SanitizeError, SanitizeResult};
use crate::scrubber::{self, SharedScrubber};

/// Per-call overrides for a sanitize operation.
#[derive(Clone, Default)]
pub struct SanitizeOptions {
    tags: Option<HashSet<String>>,
    attributes: Option<HashSet<String>>,
    scrubber: Option<SharedScrubber>,
    prune: Option<bool>,
}

impl SanitizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the call to exactly these elements.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(lowercased(tags));
        self
    }

    /// Restrict the call to exactly these attributes.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attributes = Some(lowercased(attributes));
        self
    }

    /// Use a custom scrubber instead of the built-in policy.
    #[must_use]
    pub fn scrubber(mut self, scrubber: SharedScrubber) -> Self {
        self.scrubber = Some(scrubber);
        self
    }

    /// Drop disallowed elements with their content instead of unwrapping them.
    #[must_use]
    pub fn prune(mut self, prune: bool) -> Self {
        self.prune = Some(prune);
        self
    }

    pub fn tag_overrides(&self) -> Option<&HashSet<String>> {
        self.tags.as_ref()
    }

    pub fn attribute_overrides(&self) -> Option<&HashSet<String>> {
        self.attributes.as_ref()
    }

    pub fn custom_scrubber(&self) -> Option<&SharedScrubber> {
        self.scrubber.as_ref()
    }

    pub fn prune_override(&self) -> Option<bool> {
        self.prune
    }

    /// Build options from a loosely typed JSON object.
    ///
    /// Recognized keys are `tags` and `attributes` (arrays of strings),
    /// `prune` (boolean) and `scrubber` (name of a registered scrubber).
    /// Shape errors are reported here, before any markup is parsed.
    pub fn from_value(value: &Value) -> SanitizeResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            _ => {
                return Err(SanitizeError::InvalidArgument(
                    "options must be an object".to_string(),
                ))
            }
        };

        let mut options = Self::default();
        for (key, entry) in object {
            match key.as_str() {
                "tags" => options.tags = string_list(key, entry)?,
                "attributes" => options.attributes = string_list(key, entry)?,
                "prune" => {
                    options.prune = match entry {
                        Value::Null => None,
                        Value::Bool(prune) => Some(*prune),
                        _ => {
                            return Err(SanitizeError::InvalidArgument(
                                "prune must be a boolean".to_string(),
                            ))
                        }
                    }
                }
                "scrubber" => {
                    options.scrubber = match entry {
                        Value::Null => None,
                        Value::String(name) => Some(scrubber::lookup_scrubber(name)?),
                        other => {
                            return Err(SanitizeError::ScrubberNotFound(format!(
                                "expected a scrubber name, got {}",
                                other
                            )))
                        }
                    }
                }
                unknown => tracing::debug!(option = unknown, "ignoring unknown sanitize option"),
            }
        }
        Ok(options)
    }
}

fn string_list(key: &str, value: &Value) -> SanitizeResult<Option<HashSet<String>>> {
    let invalid = || SanitizeError::InvalidArgument(format!("{} must be a list of strings", key));
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => {
            let names = items
                .iter()
                .map(|item| item.as_str().ok_or_else(invalid))
                .collect::<SanitizeResult<Vec<&str>>>()?;
            Ok(Some(lowercased(names)))
        }
        _ => Err(invalid()),
    }
}

impl fmt::Debug for SanitizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizeOptions")
            .field("tags", &self.tags)
            .field("attributes", &self.attributes)
            .field("scrubber", &self.scrubber.as_ref().map(|_| "custom"))
            .field("prune", &self.prune)
            .finish()
    }
}

/// Resolved rule set for one sanitize call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    allowed_tags: HashSet<String>,
    allowed_attributes: HashSet<String>,
    allowed_protocols: HashSet<String>,
    clean_content_tags: HashSet<String>,
    prune: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_defaults(&SanitizerDefaults::default(), false)
    }
}

impl Policy {
    pub fn from_defaults(defaults: &SanitizerDefaults, prune: bool) -> Self {
        Self {
            allowed_tags: defaults.allowed_tags.clone(),
            allowed_attributes: defaults.allowed_attributes.clone(),
            allowed_protocols: defaults.allowed_protocols.clone(),
            clean_content_tags: defaults.clean_content_tags.clone(),
            prune,
        }
    }

    /// Snapshot the process-wide defaults and apply per-call overrides.
    pub fn resolve(options: &SanitizeOptions, prune: bool) -> Self {
        let mut policy = Self::from_defaults(&config::defaults(), options.prune.unwrap_or(prune));
        if let Some(tags) = &options.tags {
            policy.allowed_tags = tags.clone();
        }
        if let Some(attributes) = &options.attributes {
            policy.allowed_attributes = attributes.clone();
        }
        policy
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tags = lowercased(tags);
        self
    }

    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_attributes = lowercased(attributes);
        self
    }

    #[must_use]
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_protocols = lowercased(protocols);
        self
    }

    #[must_use]
    pub fn with_clean_content_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clean_content_tags = lowercased(tags);
        self
    }

    #[must_use]
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn allows_tag(&self, name: &str) -> bool {
        self.allowed_tags.contains(name.to_ascii_lowercase().as_str())
    }

    pub fn allows_attribute(&self, name: &str) -> bool {
        self.allowed_attributes.contains(name.to_ascii_lowercase().as_str())
    }

    pub fn cleans_content(&self, name: &str) -> bool {
        self.clean_content_tags.contains(name.to_ascii_lowercase().as_str())
    }

    pub fn allowed_tags(&self) -> &HashSet<String> {
        &self.allowed_tags
    }

    pub fn allowed_attributes(&self) -> &HashSet<String> {
        &self.allowed_attributes
    }

    pub fn protocols(&self) -> &HashSet<String> {
        &self.allowed_protocols
    }

    pub fn prune(&self) -> bool {
        self.prune
    }
}
