//! URI classification for URI-valued attributes and CSS `url()` values.
//!
//! A value is normalized before its scheme is inspected: character
//! references are decoded, control characters (and the space and backtick
//! characters browsers also skip) are removed, and the result is lowercased.
//! Anything that does not start with a scheme is treated as relative and
//! allowed.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::{Borrow, Cow};
use std::collections::HashSet;
use std::hash::Hash;

lazy_static! {
    static ref NUMERIC_REFERENCE: Regex = Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));?").unwrap();
    static ref NAMED_REFERENCE: Regex = Regex::new(r"&([A-Za-z][A-Za-z0-9]*);?").unwrap();
    static ref CONTROL_CHARACTERS: Regex = Regex::new(r"[`\x00-\x20\x7F\x{80}-\x{101}]").unwrap();
    static ref SCHEME: Regex = Regex::new(r"^([a-z0-9][-+.a-z0-9]*):").unwrap();
    static ref DATA_MEDIATYPE: Regex = Regex::new(r"^data:([^;,]*)").unwrap();
}

fn named_reference(name: &str) -> Option<&'static str> {
    let decoded = match name {
        "amp" | "AMP" => "&",
        "lt" | "LT" => "<",
        "gt" | "GT" => ">",
        "quot" | "QUOT" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        "colon" => ":",
        "Tab" => "\t",
        "NewLine" => "\n",
        "sol" => "/",
        "bsol" => "\\",
        "lpar" => "(",
        "rpar" => ")",
        "period" => ".",
        "comma" => ",",
        "semi" => ";",
        "excl" => "!",
        "num" => "#",
        "percnt" => "%",
        "equals" => "=",
        "quest" => "?",
        "grave" => "`",
        _ => return None,
    };
    Some(decoded)
}

/// Decodes numeric (`&#106;`, `&#x6A;`) and common named character references.
///
/// The trailing semicolon is optional, matching how browsers treat legacy
/// references in attribute values. Unknown named references are left alone.
pub fn decode_character_references(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let numeric = NUMERIC_REFERENCE.replace_all(value, |caps: &Captures<'_>| {
        let code_point = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(decimal)) => decimal.as_str().parse::<u32>().ok(),
            (None, None) => None,
        };
        code_point
            .filter(|&code| code != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}')
            .to_string()
    });

    let named = NAMED_REFERENCE.replace_all(&numeric, |caps: &Captures<'_>| {
        match named_reference(&caps[1]) {
            Some(decoded) => decoded.to_string(),
            None => caps[0].to_string(),
        }
    });

    Cow::Owned(named.into_owned())
}

/// Produces the form of a URI value whose scheme is inspected.
pub fn normalize(value: &str) -> String {
    let decoded = decode_character_references(value);
    CONTROL_CHARACTERS.replace_all(&decoded, "").to_lowercase()
}

/// Returns the scheme of a normalized URI, or `None` for relative references.
pub fn scheme_of(normalized: &str) -> Option<&str> {
    SCHEME
        .captures(normalized)
        .and_then(|caps| caps.get(1))
        .map(|scheme| scheme.as_str())
}

/// Checks a URI value against a set of allowed schemes.
///
/// `data:` URIs additionally need one of the safe media types.
pub fn is_allowed_uri<S>(value: &str, protocols: &HashSet<S>) -> bool
where
    S: Hash + Eq + Borrow<str>,
{
    let normalized = normalize(value);
    let scheme = match scheme_of(&normalized) {
        Some(scheme) => scheme,
        None => return true,
    };

    if !protocols.contains(scheme) {
        tracing::debug!(scheme, "rejecting URI with disallowed scheme");
        return false;
    }

    if scheme == "data" {
        let mediatype = DATA_MEDIATYPE
            .captures(&normalized)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or("");
        if !crate::safelist::ALLOWED_URI_DATA_MEDIATYPES.contains(mediatype) {
            tracing::debug!(mediatype, "rejecting data URI with unsafe media type");
            return false;
        }
    }

    true
}

/// Checks a URI value against the process-wide protocol defaults.
pub fn is_safe_uri(value: &str) -> bool {
    is_allowed_uri(value, &crate::config::allowed_protocols())
}
