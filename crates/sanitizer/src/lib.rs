//! Citadel's safelist HTML/CSS sanitizer
//!
//! Turns untrusted HTML fragments into markup that is safe to embed again.
//! Elements, attributes, URI schemes and CSS properties are allow-listed,
//! and the usual obfuscation tricks (character references, control
//! characters inside schemes, CSS escapes) are undone before any check runs.
//!
//! ```
//! use citadel_sanitizer::{sanitize, SanitizeOptions};
//!
//! let clean = sanitize(Some("<a href=\"javascript:x\" onclick=\"y\">hi</a>"), &SanitizeOptions::default())
//!     .unwrap();
//! assert_eq!(clean.as_deref(), Some("<a>hi</a>"));
//! ```

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod safelist;
pub mod sanitizer;
pub mod scrubber;
pub mod uri;
pub mod xpath;

/// Re-export common types
pub use config::SanitizerDefaults;
pub use css::sanitize_css;
pub use dom::Fragment;
pub use error::{SanitizeError, SanitizeResult};
pub use metrics::ScrubMetrics;
pub use policy::{Policy, SanitizeOptions};
pub use sanitizer::{FullSanitizer, LinkSanitizer, SafeListSanitizer, Sanitizer};
pub use scrubber::{
    lookup_scrubber, register_scrubber, IdentityScrubber, PermitScrubber, RenameScrubber, Scrub,
    Scrubber, SharedScrubber, TargetScrubber, TextOnlyScrubber,
};
pub use uri::is_safe_uri;
pub use xpath::{IntoXPaths, Selection, XPath};

/// Sanitize with the process-wide safe-list defaults.
pub fn sanitize(html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
    SafeListSanitizer::new().sanitize(html, options)
}

/// Strip every tag and keep the text.
pub fn sanitize_full(html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
    FullSanitizer::new().sanitize(html, options)
}

/// Strip anchors, keeping their text.
pub fn sanitize_links(html: Option<&str>, options: &SanitizeOptions) -> SanitizeResult<Option<String>> {
    LinkSanitizer::new().sanitize(html, options)
}

/// Remove everything matched by one or more XPath expressions.
pub fn remove_xpaths<X: IntoXPaths>(fragment: &Fragment, xpaths: X) -> SanitizeResult<&Fragment> {
    fragment.remove_xpaths(xpaths)
}
