//! Scrubbers decide what happens to each node of a fragment.
//!
//! A scrubber looks at one node and answers with a [`Scrub`] action; the
//! [walker](crate::dom::walker) applies it. Scrubbers never traverse on their
//! own.

use kuchiki::{Attribute, ElementData, ExpandedName, NodeData, NodeRef};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config;
use crate::css;
use crate::dom;
use crate::error::{SanitizeError, SanitizeResult};
use crate::policy::Policy;
use crate::safelist::{self, ATTR_VAL_IS_URI, SVG_ALLOW_LOCAL_HREF, SVG_ATTR_VAL_ALLOWS_REF};
use crate::uri;

/// What the walker does with a node after a scrubber has seen it.
#[derive(Debug, Clone, PartialEq)]
pub enum Scrub {
    /// Keep the node and visit its children
    Continue,
    /// Keep the node and leave its subtree untouched
    Stop,
    /// Replace the node with its children, then visit them
    Unwrap,
    /// Detach the node and its subtree
    Remove,
    /// Swap in a new node, moving the old node's children into it
    Replace(NodeRef),
}

/// Per-node sanitization capability.
pub trait Scrubber: Send + Sync {
    fn scrub(&self, node: &NodeRef) -> Scrub;
}

impl<F> Scrubber for F
where
    F: Fn(&NodeRef) -> Scrub + Send + Sync,
{
    fn scrub(&self, node: &NodeRef) -> Scrub {
        self(node)
    }
}

/// Scrubber handle that can live in options and the registry.
pub type SharedScrubber = Arc<dyn Scrubber>;

pub(crate) fn qualified_name(name: &ExpandedName, attribute: &Attribute) -> String {
    let qualified = match &attribute.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    };
    qualified.to_ascii_lowercase()
}

/// Value checks shared by every scrubber that keeps attributes.
///
/// Returns `false` when the attribute must be dropped. May rewrite `value`
/// in place (style attributes and SVG references).
fn scrub_attribute_value(
    element: &str,
    attribute: &str,
    value: &mut String,
    protocols: &HashSet<String>,
) -> bool {
    if ATTR_VAL_IS_URI.contains(attribute) && !uri::is_allowed_uri(value, protocols) {
        tracing::debug!(element, attribute, "🚫 Removing unsafe URI attribute");
        return false;
    }

    if attribute == "style" {
        let clean = css::sanitize_css_with(value, protocols);
        if clean.is_empty() {
            return false;
        }
        *value = clean;
    }

    if SVG_ATTR_VAL_ALLOWS_REF.contains(attribute) {
        let clean = css::scrub_local_references(value);
        if clean.is_empty() {
            return false;
        }
        *value = clean;
    }

    if attribute == "xlink:href"
        && SVG_ALLOW_LOCAL_HREF.contains(element)
        && !value.trim_start().starts_with('#')
    {
        tracing::debug!(element, "🚫 Removing non-local xlink:href");
        return false;
    }

    !(attribute == "src" && value.trim().is_empty())
}

/// Keeps what the policy allows.
///
/// Disallowed elements are unwrapped, or removed with their content when the
/// policy prunes or lists them as content-dropping. Comments, processing
/// instructions and doctypes are removed. Attributes outside the policy and
/// event handlers are stripped; the rest go through URI and CSS checks.
#[derive(Debug, Clone, Default)]
pub struct PermitScrubber {
    policy: Policy,
}

impl PermitScrubber {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    fn scrub_attributes(&self, name: &str, element: &ElementData) {
        let policy = &self.policy;
        element.attributes.borrow_mut().map.retain(|key, attribute| {
            let qualified = qualified_name(key, attribute);
            if safelist::is_event_handler(&qualified) || !policy.allows_attribute(&qualified) {
                tracing::trace!(element = name, attribute = %qualified, "stripping attribute");
                return false;
            }
            scrub_attribute_value(name, &qualified, &mut attribute.value, policy.protocols())
        });
    }
}

impl Scrubber for PermitScrubber {
    fn scrub(&self, node: &NodeRef) -> Scrub {
        match node.data() {
            NodeData::Text(_) | NodeData::Document(_) | NodeData::DocumentFragment => Scrub::Continue,
            NodeData::Comment(_) | NodeData::ProcessingInstruction(_) | NodeData::Doctype(_) => {
                Scrub::Remove
            }
            NodeData::Element(element) => {
                let name = (*element.name.local).to_ascii_lowercase();
                if !self.policy.allows_tag(&name) {
                    if self.policy.prune() || self.policy.cleans_content(&name) {
                        tracing::debug!("🚫 Element <{}> removed with its content", name);
                        return Scrub::Remove;
                    }
                    tracing::trace!("Element <{}> unwrapped", name);
                    return Scrub::Unwrap;
                }
                self.scrub_attributes(&name, element);
                Scrub::Continue
            }
        }
    }
}

/// Inverse of [`PermitScrubber`]: removes what it targets and keeps the rest.
///
/// Targeted elements are unwrapped (or removed when pruning); targeted
/// attributes are stripped from every element that survives. Comments stay.
#[derive(Debug, Clone)]
pub struct TargetScrubber {
    tags: HashSet<String>,
    attributes: HashSet<String>,
    protocols: HashSet<String>,
    prune: bool,
}

impl TargetScrubber {
    pub fn new<I, S, J, T>(tags: I, attributes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            tags: config::lowercased(tags),
            attributes: config::lowercased(attributes),
            protocols: config::allowed_protocols(),
            prune: false,
        }
    }

    #[must_use]
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    #[must_use]
    pub fn with_protocols(mut self, protocols: HashSet<String>) -> Self {
        self.protocols = protocols;
        self
    }
}

impl Scrubber for TargetScrubber {
    fn scrub(&self, node: &NodeRef) -> Scrub {
        let element = match node.data() {
            NodeData::Element(element) => element,
            NodeData::Doctype(_) => return Scrub::Remove,
            _ => return Scrub::Continue,
        };

        let name = (*element.name.local).to_ascii_lowercase();
        if self.tags.contains(&name) {
            return if self.prune { Scrub::Remove } else { Scrub::Unwrap };
        }

        element.attributes.borrow_mut().map.retain(|key, attribute| {
            let qualified = qualified_name(key, attribute);
            !self.attributes.contains(&qualified)
                && scrub_attribute_value(&name, &qualified, &mut attribute.value, &self.protocols)
        });
        Scrub::Continue
    }
}

/// Keeps only text: elements are unwrapped, everything else removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOnlyScrubber;

impl Scrubber for TextOnlyScrubber {
    fn scrub(&self, node: &NodeRef) -> Scrub {
        match node.data() {
            NodeData::Text(_) | NodeData::Document(_) | NodeData::DocumentFragment => Scrub::Continue,
            NodeData::Element(_) => Scrub::Unwrap,
            _ => Scrub::Remove,
        }
    }
}

/// Leaves every node alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScrubber;

impl Scrubber for IdentityScrubber {
    fn scrub(&self, _node: &NodeRef) -> Scrub {
        Scrub::Continue
    }
}

/// Scrubber that renames every element it sees, keeping its attributes.
///
/// Mostly useful in tests and for normalizing legacy markup
/// (`<b>` to `<strong>` and the like when `only` is set).
#[derive(Debug, Clone)]
pub struct RenameScrubber {
    to: String,
    only: Option<HashSet<String>>,
}

impl RenameScrubber {
    pub fn new(to: &str) -> Self {
        Self {
            to: to.to_ascii_lowercase(),
            only: None,
        }
    }

    #[must_use]
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.only = Some(config::lowercased(names));
        self
    }
}

impl Scrubber for RenameScrubber {
    fn scrub(&self, node: &NodeRef) -> Scrub {
        let name = match dom::element_name(node) {
            Some(name) => name,
            None => return Scrub::Continue,
        };
        let selected = self.only.as_ref().map_or(true, |only| only.contains(&name));
        if !selected || name == self.to {
            return Scrub::Continue;
        }
        Scrub::Replace(dom::renamed(node, &self.to))
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, SharedScrubber>> = {
        let mut registry: HashMap<String, SharedScrubber> = HashMap::new();
        registry.insert("identity".to_string(), Arc::new(IdentityScrubber));
        registry.insert("text_only".to_string(), Arc::new(TextOnlyScrubber));
        RwLock::new(registry)
    };
}

/// Register a scrubber under a name usable from JSON options.
///
/// Returns the scrubber previously registered under that name, if any.
pub fn register_scrubber(name: &str, scrubber: SharedScrubber) -> Option<SharedScrubber> {
    tracing::debug!(name, "registering scrubber");
    REGISTRY.write().insert(name.to_string(), scrubber)
}

/// Look up a registered scrubber.
pub fn lookup_scrubber(name: &str) -> SanitizeResult<SharedScrubber> {
    REGISTRY
        .read()
        .get(name)
        .cloned()
        .ok_or_else(|| SanitizeError::ScrubberNotFound(name.to_string()))
}
