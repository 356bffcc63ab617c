//! Inline style sanitization.
//!
//! Style attribute values are tokenized with `cssparser`, split into
//! declarations at top-level semicolons, and rebuilt from the components that
//! survive the safelist. Escapes are decoded by the tokenizer before any
//! check runs, so `\0075\0072\006C(...)` is treated as `url(...)`.

use cssparser::{ParseError, Parser, ParserInput, ToCss, Token};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;

use crate::safelist::{
    ALLOWED_CSS_FUNCTIONS, ALLOWED_CSS_KEYWORDS, ALLOWED_CSS_PROPERTIES, ALLOWED_SVG_PROPERTIES,
    SHORTHAND_CSS_PROPERTIES,
};
use crate::uri;

lazy_static! {
    static ref HIGH_RISK_PATTERNS: Vec<Regex> = vec![
        // Script injection via CSS
        Regex::new(r"(?i)javascript\s*:").unwrap(),
        Regex::new(r"(?i)vbscript\s*:").unwrap(),
        Regex::new(r"(?i)livescript\s*:").unwrap(),
        Regex::new(r"(?i)expression\s*\(").unwrap(),
        Regex::new(r"(?i)eval\s*\(").unwrap(),
        // Dangerous behaviors
        Regex::new(r"(?i)behaviou?r\s*:").unwrap(),
        Regex::new(r"(?i)-moz-binding").unwrap(),
        Regex::new(r"(?i)binding\s*:").unwrap(),
    ];

    static ref KEYWORDISH: Regex = Regex::new(
        r"^(#[0-9a-fA-F]+|rgb\(\d+%?,\d*%?,?\d*%?\)?|-?\d{0,3}\.?\d{0,10}(ch|cm|r?em|ex|in|lh|mm|pc|pt|px|Q|vmax|vmin|vw|vh|%|,|\))?)$"
    ).unwrap();
}

/// Functions whose presence rejects the whole declaration.
const BLOCKED_FUNCTIONS: &[&str] = &["expression", "eval", "behavior", "-moz-binding"];

/// Function nesting deeper than this marks the value unsafe.
const MAX_NESTING_DEPTH: usize = 32;

/// One piece of a declaration value.
#[derive(Debug, Clone, PartialEq)]
enum Component {
    Ident(String),
    Function { name: String, arguments: Vec<Component> },
    Url(String),
    Str(String),
    Important,
    Comma,
    Whitespace,
    Other(String),
    /// Bad strings, bad urls, stray brackets and blocks
    Unsafe,
}

impl Component {
    /// Decoded text, used for pattern checks.
    fn decoded(&self) -> String {
        match self {
            Component::Ident(value) | Component::Str(value) | Component::Other(value) => value.clone(),
            Component::Function { name, arguments } => {
                format!("{}({})", name, decoded_list(arguments))
            }
            Component::Url(target) => format!("url({})", target),
            Component::Important => "!important".to_string(),
            Component::Comma => ",".to_string(),
            Component::Whitespace => " ".to_string(),
            Component::Unsafe => String::new(),
        }
    }

    /// Serialized CSS text.
    fn to_css(&self) -> String {
        let mut out = String::new();
        match self {
            Component::Ident(value) => {
                let _ = cssparser::serialize_identifier(value, &mut out);
            }
            Component::Function { name, arguments } => {
                let _ = cssparser::serialize_identifier(name, &mut out);
                out.push('(');
                out.push_str(serialized_list(arguments).trim_end());
                out.push(')');
            }
            Component::Url(target) => {
                out.push_str("url(");
                if target.chars().all(is_plain_url_char) {
                    out.push_str(target);
                } else {
                    let _ = cssparser::serialize_string(target, &mut out);
                }
                out.push(')');
            }
            Component::Str(value) => {
                let _ = cssparser::serialize_string(value, &mut out);
            }
            Component::Important => out.push_str("!important"),
            Component::Comma => out.push(','),
            Component::Whitespace => out.push(' '),
            Component::Other(raw) => out.push_str(raw),
            Component::Unsafe => {}
        }
        out
    }
}

fn is_plain_url_char(c: char) -> bool {
    !(c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '(' | ')' | '\\'))
}

fn decoded_list(components: &[Component]) -> String {
    components.iter().map(Component::decoded).collect()
}

fn serialized_list(components: &[Component]) -> String {
    components.iter().map(Component::to_css).collect()
}

#[derive(Debug)]
struct Declaration {
    name: String,
    components: Vec<Component>,
}

/// Whether the source text of a `url` token spells its name with escapes.
fn is_escaped_url(raw: &str) -> bool {
    !raw.get(..3).map_or(false, |name| name.eq_ignore_ascii_case("url"))
}

fn parse_components<'i, 't>(parser: &mut Parser<'i, 't>, depth: usize) -> Vec<Component> {
    let nested = depth > 0;
    let mut components = Vec::new();
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let component = match token {
            Token::Semicolon if !nested => break,
            Token::WhiteSpace(_) => {
                if !nested || matches!(components.last(), None | Some(Component::Whitespace)) {
                    continue;
                }
                Component::Whitespace
            }
            Token::Ident(value) => Component::Ident(value.to_string()),
            Token::QuotedString(value) => Component::Str(value.to_string()),
            ref url if is_url_token(url) && is_escaped_url(parser.slice_from(start)) => Component::Unsafe,
            Token::UnquotedUrl(target) => Component::Url(target.to_string()),
            // The unconsumed block is skipped by the parser on the next read.
            Token::Function(_) if depth >= MAX_NESTING_DEPTH => Component::Unsafe,
            Token::Function(name) => {
                let arguments = parser
                    .parse_nested_block(|block| {
                        Ok::<_, ParseError<'i, ()>>(parse_components(block, depth + 1))
                    })
                    .unwrap_or_default();
                Component::Function {
                    name: name.to_ascii_lowercase(),
                    arguments,
                }
            }
            Token::Delim('!') => {
                if parser.try_parse(|p| p.expect_ident_matching("important")).is_ok() {
                    Component::Important
                } else {
                    Component::Unsafe
                }
            }
            Token::Comma => Component::Comma,
            Token::Semicolon
            | Token::BadUrl(_)
            | Token::BadString(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::CloseCurlyBracket => Component::Unsafe,
            other => Component::Other(other.to_css_string()),
        };
        components.push(component);
    }
    components
}

fn is_url_token(token: &Token<'_>) -> bool {
    match token {
        Token::UnquotedUrl(_) => true,
        Token::Function(name) => name.eq_ignore_ascii_case("url"),
        _ => false,
    }
}

fn skip_declaration(parser: &mut Parser<'_, '_>) {
    while let Ok(token) = parser.next() {
        if matches!(token, Token::Semicolon) {
            break;
        }
    }
}

fn parse_declarations(style: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    loop {
        let name = match parser.next().map(|token| token.clone()) {
            Ok(Token::Ident(name)) => name.to_ascii_lowercase(),
            Ok(Token::Semicolon) => continue,
            Ok(_) => {
                skip_declaration(&mut parser);
                continue;
            }
            Err(_) => break,
        };

        match parser.next().map(|token| token.clone()) {
            Ok(Token::Colon) => {}
            Ok(Token::Semicolon) => continue,
            Ok(_) => {
                skip_declaration(&mut parser);
                continue;
            }
            Err(_) => break,
        }

        let components = parse_components(&mut parser, 0);
        declarations.push(Declaration { name, components });
    }

    declarations
}

fn is_shorthand(property: &str) -> bool {
    property
        .split('-')
        .next()
        .map_or(false, |family| SHORTHAND_CSS_PROPERTIES.contains(family))
}

fn is_allowed_property(property: &str) -> bool {
    ALLOWED_CSS_PROPERTIES.contains(property)
        || ALLOWED_SVG_PROPERTIES.contains(property)
        || is_shorthand(property)
}

fn is_keywordish(value: &str) -> bool {
    ALLOWED_CSS_KEYWORDS.contains(value.to_ascii_lowercase().as_str()) || KEYWORDISH.is_match(value)
}

/// Numbers, dimensions and hashes. Bare punctuation left over from a
/// mangled value does not count.
fn is_shorthand_value(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_alphanumeric()) && is_keywordish(raw)
}

/// Arguments of an allowed function may only hold plain values and other
/// allowed functions.
fn are_safe_arguments(arguments: &[Component]) -> bool {
    arguments.iter().all(|argument| match argument {
        Component::Function { name, arguments } => {
            ALLOWED_CSS_FUNCTIONS.contains(name.as_str()) && are_safe_arguments(arguments)
        }
        Component::Url(_) | Component::Unsafe | Component::Important => false,
        _ => true,
    })
}

/// Target of a `url(...)` function written with a quoted string.
fn url_function_target(arguments: &[Component]) -> Option<String> {
    let mut meaningful = arguments
        .iter()
        .filter(|argument| !matches!(argument, Component::Whitespace));
    match (meaningful.next(), meaningful.next()) {
        (Some(Component::Str(target)), None) => Some(target.clone()),
        _ => None,
    }
}

fn join_values(values: &[Component]) -> String {
    let mut out = String::new();
    for value in values {
        if *value == Component::Comma {
            out.push(',');
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&value.to_css());
    }
    out
}

fn scrub_declaration<S>(declaration: &Declaration, protocols: &HashSet<S>) -> Option<String>
where
    S: Hash + Eq + Borrow<str>,
{
    let name = declaration.name.as_str();
    if !is_allowed_property(name) {
        tracing::trace!(property = name, "dropping disallowed CSS property");
        return None;
    }

    let decoded = decoded_list(&declaration.components);
    if HIGH_RISK_PATTERNS.iter().any(|pattern| pattern.is_match(&decoded)) {
        tracing::debug!(property = name, "🚫 rejecting CSS declaration with blocked pattern");
        return None;
    }

    let shorthand = is_shorthand(name);
    let mut values = Vec::new();
    let mut important = false;

    for component in &declaration.components {
        match component {
            Component::Unsafe => return None,
            Component::Whitespace => {}
            Component::Important => important = true,
            Component::Ident(value) => {
                if !shorthand || is_keywordish(value) {
                    values.push(component.clone());
                }
            }
            Component::Url(target) => {
                if !uri::is_allowed_uri(target, protocols) {
                    return None;
                }
                values.push(component.clone());
            }
            Component::Function { name: function, arguments } => {
                if BLOCKED_FUNCTIONS.contains(&function.as_str()) {
                    return None;
                }
                if function == "url" {
                    match url_function_target(arguments) {
                        Some(target) if uri::is_allowed_uri(&target, protocols) => {
                            values.push(Component::Url(target));
                        }
                        _ => return None,
                    }
                } else if ALLOWED_CSS_FUNCTIONS.contains(function.as_str()) {
                    if !are_safe_arguments(arguments) {
                        return None;
                    }
                    values.push(component.clone());
                }
            }
            Component::Other(raw) => {
                if !shorthand || is_shorthand_value(raw) {
                    values.push(component.clone());
                }
            }
            Component::Str(_) | Component::Comma => {
                values.push(component.clone());
            }
        }
    }

    // A value that is only separators carries nothing worth keeping.
    if values.iter().all(|value| *value == Component::Comma) {
        return None;
    }

    let mut value = join_values(&values);
    if important {
        value.push_str(" !important");
    }
    Some(format!("{}:{}", name, value))
}

/// Sanitizes a style attribute value against an explicit protocol set.
pub fn sanitize_css_with<S>(style: &str, protocols: &HashSet<S>) -> String
where
    S: Hash + Eq + Borrow<str>,
{
    let mut output = String::new();
    for declaration in parse_declarations(style) {
        if let Some(clean) = scrub_declaration(&declaration, protocols) {
            output.push_str(&clean);
            output.push(';');
        }
    }
    output
}

/// Sanitizes a style attribute value using the process-wide protocol defaults.
///
/// Returns `name:value;` pairs for every surviving declaration, or an empty
/// string when nothing survives.
pub fn sanitize_css(style: &str) -> String {
    sanitize_css_with(style, &crate::config::allowed_protocols())
}

fn is_local_reference(target: &str) -> bool {
    target.trim_start().starts_with('#')
}

/// Filters an SVG attribute value that may reference other elements, keeping
/// only document-local `url(#...)` references.
pub fn scrub_local_references(value: &str) -> String {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let components = parse_components(&mut parser, 0);

    let kept: Vec<Component> = components
        .iter()
        .filter_map(|component| match component {
            Component::Url(target) if is_local_reference(target) => Some(component.clone()),
            Component::Function { name, arguments } if name == "url" => {
                url_function_target(arguments)
                    .filter(|target| is_local_reference(target))
                    .map(Component::Url)
            }
            Component::Function { name, arguments }
                if ALLOWED_CSS_FUNCTIONS.contains(name.as_str()) && are_safe_arguments(arguments) =>
            {
                Some(component.clone())
            }
            Component::Url(_) | Component::Function { .. } | Component::Unsafe => None,
            Component::Whitespace => None,
            other => Some(other.clone()),
        })
        .collect();

    join_values(&kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn escaped(text: &str) -> String {
        text.chars().map(|c| format!("\\00{:02X}", c as u32)).collect()
    }

    #[test]
    fn test_keeps_safe_declarations() {
        assert_eq!(sanitize_css("display:block; background-color:black;"), "display:block;background-color:black;");
        assert_eq!(sanitize_css("color: #000"), "color:#000;");
        assert_eq!(sanitize_css("COLOR: Red"), "color:Red;");
        assert_eq!(sanitize_css("width:100%"), "width:100%;");
    }

    #[test]
    fn test_drops_disallowed_properties() {
        let raw = "display:block; position:absolute; left:0; top:0; width:100%; height:100%; z-index:1; \
                   background-color:black; background-image:url(http://www.ragingplatypus.com/i/cam-full.jpg); \
                   background-x:center; background-y:center; background-repeat:repeat;";
        assert_eq!(
            sanitize_css(raw),
            "display:block;width:100%;height:100%;background-color:black;\
             background-image:url(http://www.ragingplatypus.com/i/cam-full.jpg);\
             background-x:center;background-y:center;"
        );
    }

    #[test]
    fn test_escaped_url_is_rejected() {
        let keep_parens = |text: &str| {
            text.chars()
                .map(|c| if c == '(' || c == ')' { c.to_string() } else { format!("\\00{:02X}", c as u32) })
                .collect::<String>()
        };
        for value in ["url(javascript:alert(1))", "url(https://example.com)"] {
            assert_eq!(sanitize_css(&format!("background-image:{}", keep_parens(value))), "", "{}", value);
            assert_eq!(sanitize_css(&format!("background-image:{}", escaped(value))), "", "{}", value);
        }
        assert_eq!(sanitize_css("background-image:URL(https://example.com)"), "background-image:url(https://example.com);");
    }

    #[test]
    fn test_shorthand_drops_leftover_punctuation() {
        assert_eq!(sanitize_css("background: : / / ."), "");
        assert_eq!(sanitize_css("margin: 0 auto; padding: 1px 2px"), "margin:0 auto;padding:1px 2px;");
        assert_eq!(sanitize_css("border-color: #fff"), "border-color:#fff;");
    }

    #[test]
    fn test_deep_function_nesting_is_bounded() {
        assert_eq!(sanitize_css(&format!("color:{}", "rgb(".repeat(5_000))), "");
        let nested = format!("width:{}1px{};color:red", "calc(".repeat(100), ")".repeat(100));
        assert_eq!(sanitize_css(&nested), "color:red;");
        let shallow = format!("width:{}1px{}", "calc(".repeat(3), ")".repeat(3));
        assert_eq!(sanitize_css(&shallow), "width:calc(calc(calc(1px)));");
    }

    #[test]
    fn test_rejects_expression() {
        assert_eq!(sanitize_css("width: expression(alert(1));"), "");
        assert_eq!(sanitize_css("width:expression(alert(1));color:red"), "color:red;");
        assert_eq!(sanitize_css(&format!("width:{}(alert(1))", escaped("expression"))), "");
    }

    #[test]
    fn test_rejects_moz_binding() {
        assert_eq!(sanitize_css("-moz-binding:url('http://ha.ckers.org/xssmoz.xml#xss')"), "");
        assert_eq!(sanitize_css("color: -moz-binding"), "");
    }

    #[test]
    fn test_rejects_javascript_urls() {
        assert_eq!(sanitize_css("background-image:url(javascript:alert(1))"), "");
        assert_eq!(sanitize_css("background-image:url('javascript:alert(1)')"), "");
        assert_eq!(sanitize_css(&format!("background-image:{}(javascript:alert(1))", escaped("url"))), "");
        assert_eq!(
            sanitize_css(&format!("background-image:{}javascript:alert(1){}", escaped("url("), escaped(")"))),
            ""
        );
    }

    #[test]
    fn test_keeps_allowed_urls() {
        assert_eq!(
            sanitize_css("background-image: url(http://example.com/a.png)"),
            "background-image:url(http://example.com/a.png);"
        );
        assert_eq!(sanitize_css("background: url(ftp://example.com) no-repeat"), "background:url(ftp://example.com);");
    }

    #[test]
    fn test_escaped_rgb() {
        let value = format!("background-image:{}(255,0,0)", escaped("rgb"));
        assert!(sanitize_css(&value).contains("background-image"));

        let value = format!("background-image:{}", escaped("rgb(255,0,0)"));
        assert!(sanitize_css(&value).contains("background-image"));
    }

    #[test]
    fn test_shorthand_keywords() {
        assert_eq!(sanitize_css("border: 1px solid red"), "border:1px solid red;");
        assert_eq!(sanitize_css("margin-left: 2em"), "margin-left:2em;");
        assert_eq!(sanitize_css("background: evil"), "");
        assert_eq!(sanitize_css("background: rgb(1, 2, 3)"), "background:rgb(1, 2, 3);");
    }

    #[test]
    fn test_important_is_preserved() {
        assert_eq!(sanitize_css("color: red !important"), "color:red !important;");
    }

    #[test]
    fn test_disallowed_functions_are_dropped() {
        assert_eq!(sanitize_css("width: attr(data-x) 10px"), "width:10px;");
        assert_eq!(sanitize_css("width: calc(100% - 10px)"), "width:calc(100% - 10px);");
    }

    #[test]
    fn test_font_family_list() {
        assert_eq!(
            sanitize_css("font-family: \"Times New Roman\", serif"),
            "font-family:\"Times New Roman\", serif;"
        );
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(sanitize_css(""), "");
        assert_eq!(sanitize_css(";;;"), "");
        assert_eq!(sanitize_css("color"), "");
        assert_eq!(sanitize_css("color;display:block"), "display:block;");
        assert_eq!(sanitize_css("color: {red}"), "");
        assert_eq!(sanitize_css("}color:red"), "");
    }

    #[test]
    fn test_explicit_protocols() {
        let none: HashSet<&str> = HashSet::new();
        assert_eq!(sanitize_css_with("background-image:url(http://example.com)", &none), "");
        assert_eq!(sanitize_css_with("background-image:url(/relative.png)", &none), "background-image:url(/relative.png);");
    }

    #[test]
    fn test_local_references() {
        assert_eq!(scrub_local_references("url(#gradient)"), "url(#gradient)");
        assert_eq!(scrub_local_references("url(http://evil.com/#x)"), "");
        assert_eq!(scrub_local_references("url('#mask') red"), "url(#mask) red");
        assert_eq!(scrub_local_references("url('#a b')"), "url(\"#a b\")");
        assert_eq!(scrub_local_references("#ff0000"), "#ff0000");
        assert_eq!(scrub_local_references("none"), "none");
        assert_eq!(scrub_local_references("rgb(0,0,255)"), "rgb(0,0,255)");
        assert_eq!(scrub_local_references("attr(x) blue"), "blue");
    }
}
