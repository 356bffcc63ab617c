//! Sanitizer drivers.
//!
//! Each driver resolves its scrubber before the fragment is parsed, walks the
//! fragment once and serializes what is left. A custom scrubber from
//! [`SanitizeOptions`] replaces the built-in per-node logic for that call.

use std::sync::Arc;

use crate::config;
use crate::css;
use crate::dom::Fragment;
use crate::error::{SanitizeError, SanitizeResult};
use crate::policy::{Policy, SanitizeOptions};
use crate::scrubber::{PermitScrubber, Scrubber, SharedScrubber, TargetScrubber, TextOnlyScrubber};
use crate::xpath::IntoXPaths;

/// Common sanitizer capability.
///
/// The provided `sanitize` has no mode of its own and fails with
/// [`SanitizeError::NotImplemented`]; concrete sanitizers override it.
pub trait Sanitizer {
    /// Sanitize `html`. `None` stays `None` and blank input is returned as is.
    fn sanitize(&self, html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
        let _ = (html, options);
        Err(SanitizeError::NotImplemented)
    }

    /// Remove every node matched by `xpaths` from an already parsed fragment.
    fn remove_xpaths<'f, X>(&self, fragment: &'f Fragment, xpaths: X) -> SanitizeResult<&'f Fragment>
    where
        Self: Sized,
        X: IntoXPaths,
    {
        fragment.remove_xpaths(xpaths)
    }
}

fn is_blank(html: &str) -> bool {
    html.trim().is_empty()
}

/// Parse, scrub and serialize one fragment.
fn scrub_html(mode: &str, html: &str, scrubber: &dyn Scrubber) -> String {
    let fragment = Fragment::parse(html);
    let metrics = fragment.scrub(scrubber);
    tracing::debug!(
        mode,
        visited = metrics.nodes_visited(),
        removed = metrics.nodes_removed(),
        unwrapped = metrics.nodes_unwrapped(),
        replaced = metrics.nodes_replaced(),
        "🧹 Fragment sanitized"
    );
    fragment.to_html()
}

fn run(
    mode: &str,
    html: Option<&str>,
    options: &SanitizeOptions,
    builtin: impl FnOnce() -> SharedScrubber,
) -> SanitizeResult<Option<String>> {
    let html = match html {
        Some(html) if !is_blank(html) => html,
        other => return Ok(other.map(str::to_string)),
    };
    let scrubber = match options.custom_scrubber() {
        Some(custom) => custom.clone(),
        None => builtin(),
    };
    Ok(Some(scrub_html(mode, html, scrubber.as_ref())))
}

/// Keeps what the allow-lists permit.
#[derive(Debug, Clone, Default)]
pub struct SafeListSanitizer {
    prune: bool,
}

impl SafeListSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove disallowed elements with their content unless a call says otherwise.
    #[must_use]
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    /// Resolve the policy a call with `options` would use.
    pub fn policy(&self, options: &SanitizeOptions) -> Policy {
        Policy::resolve(options, self.prune)
    }

    /// Clean an inline style using the current default protocols.
    pub fn sanitize_css(&self, style: &str) -> String {
        css::sanitize_css_with(style, &config::allowed_protocols())
    }
}

impl Sanitizer for SafeListSanitizer {
    fn sanitize(&self, html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
        run("safe_list", html, options, || {
            Arc::new(PermitScrubber::new(self.policy(options)))
        })
    }
}

/// Strips all markup and keeps text only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullSanitizer;

impl FullSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for FullSanitizer {
    fn sanitize(&self, html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
        run("full", html, options, || Arc::new(TextOnlyScrubber))
    }
}

/// Strips links, keeping their text and the rest of the markup.
#[derive(Debug, Clone, Default)]
pub struct LinkSanitizer {
    prune: bool,
}

impl LinkSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove anchors together with their text.
    #[must_use]
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }
}

impl Sanitizer for LinkSanitizer {
    fn sanitize(&self, html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
        let prune = options.prune_override().unwrap_or(self.prune);
        run("links", html, options, || {
            Arc::new(TargetScrubber::new(["a"], ["href"]).with_prune(prune))
        })
    }
}
