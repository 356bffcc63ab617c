//! Safe-list sanitization tests for the Citadel sanitizer
//!
//! These run against the built-in defaults and never mutate them.

use citadel_sanitizer::{
    sanitize, sanitize_css, SafeListSanitizer, SanitizeError, SanitizeOptions, Sanitizer,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn safe_list_sanitize(html: &str) -> String {
    sanitize_with(html, &SanitizeOptions::default())
}

fn sanitize_with(html: &str, options: &SanitizeOptions) -> String {
    sanitize(Some(html), options)
        .expect("sanitize should not fail")
        .expect("non-null input gives non-null output")
}

#[test]
fn test_null_and_blank_input() {
    let options = SanitizeOptions::default();
    assert_eq!(sanitize(None, &options).unwrap(), None);
    assert_eq!(sanitize(Some(""), &options).unwrap().as_deref(), Some(""));
    assert_eq!(sanitize(Some("   "), &options).unwrap().as_deref(), Some("   "));
    assert_eq!(sanitize(Some("\n\t"), &options).unwrap().as_deref(), Some("\n\t"));
}

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(safe_list_sanitize("Dont touch me"), "Dont touch me");
    assert_eq!(safe_list_sanitize("a &amp; b"), "a &amp; b");
    assert_eq!(safe_list_sanitize("1 < 2"), "1 &lt; 2");
}

#[test]
fn test_allowed_markup_is_kept() {
    assert_eq!(
        safe_list_sanitize("<p>Hello <strong>world</strong>, <em>how</em> are <code>you</code>?</p>"),
        "<p>Hello <strong>world</strong>, <em>how</em> are <code>you</code>?</p>"
    );
    assert_eq!(
        safe_list_sanitize("<a href=\"http://www.rubyonrails.com/\" title=\"Rails\">Rails</a>"),
        "<a href=\"http://www.rubyonrails.com/\" title=\"Rails\">Rails</a>"
    );
    assert_eq!(safe_list_sanitize("line<br>break"), "line<br>break");
}

#[test]
fn test_disallowed_markup_is_unwrapped() {
    assert_eq!(safe_list_sanitize("<form><p>kept</p></form>"), "<p>kept</p>");
    assert_eq!(safe_list_sanitize("<<<bad html>"), "&lt;&lt;");
    assert_eq!(
        safe_list_sanitize("<div><span><script>alert(1)</script>text</span></div>"),
        "<div><span>text</span></div>"
    );
}

#[test]
fn test_script_and_style_content_is_dropped() {
    assert_eq!(safe_list_sanitize("<script>alert(1)</script>x"), "x");
    assert_eq!(safe_list_sanitize("<style>p { color: red }</style>x"), "x");
    assert_eq!(safe_list_sanitize("<SCRIPT>alert(1)</SCRIPT>x"), "x");
}

#[test]
fn test_comments_and_bogus_comments_are_removed() {
    assert_eq!(safe_list_sanitize("This has a <!-- comment --> here."), "This has a  here.");
    assert_eq!(
        safe_list_sanitize("This has a <![CDATA[<section>]]> here."),
        "This has a ]]&gt; here."
    );
    assert_eq!(safe_list_sanitize("<?xml version=\"1.0\"?>text"), "text");
}

#[test]
fn test_event_handlers_are_stripped() {
    assert_eq!(
        safe_list_sanitize("<a href=\"http://www.rubyonrails.com/\" onmousedown=\"alert('hi')\">Rails</a>"),
        "<a href=\"http://www.rubyonrails.com/\">Rails</a>"
    );
    assert_eq!(safe_list_sanitize("<a href=\"javascript:bang\" onclick=\"x\">hi</a>"), "<a>hi</a>");
}

#[test]
fn test_element_names_are_lowercased() {
    assert_eq!(safe_list_sanitize("<P>Hi</P>"), "<p>Hi</p>");
    assert_eq!(safe_list_sanitize("<A HREF=\"/x\">x</A>"), "<a href=\"/x\">x</a>");
}

#[test]
fn test_malformed_markup_is_closed() {
    assert_eq!(safe_list_sanitize("<p>malformed"), "<p>malformed</p>");
    assert_eq!(safe_list_sanitize("<b><i>nested</b></i>"), "<b><i>nested</i></b>");
}

#[test]
fn test_tables_and_media() {
    assert_eq!(
        safe_list_sanitize("<table><tr><td colspan=\"2\">x</td></tr></table>"),
        "<table><tbody><tr><td colspan=\"2\">x</td></tr></tbody></table>"
    );
    assert_eq!(
        safe_list_sanitize("<video controls poster=\"poster.png\"><source src=\"movie.mp4\"></video>"),
        "<video controls=\"\" poster=\"poster.png\"><source src=\"movie.mp4\"></video>"
    );
}

#[test]
fn test_custom_tags() {
    let options = SanitizeOptions::new().tags(["u"]);
    assert_eq!(sanitize_with("<u>leave me <b>now</b></u>", &options), "<u>leave me now</u>");
}

#[test]
fn test_custom_attributes() {
    let options = SanitizeOptions::new().attributes(["foo"]);
    assert_eq!(
        sanitize_with("<a foo=\"hello\" bar=\"world\" href=\"x\">hi</a>", &options),
        "<a foo=\"hello\">hi</a>"
    );
}

#[test]
fn test_custom_tags_and_attributes() {
    let options = SanitizeOptions::new().tags(["p"]).attributes(["foo"]);
    assert_eq!(
        sanitize_with("<p foo=\"bar\">Hi</p><a foo=\"baz\">x</a>", &options),
        "<p foo=\"bar\">Hi</p>x"
    );
}

#[test]
fn test_prune_option() {
    let options = SanitizeOptions::new().tags(["u"]).prune(true);
    assert_eq!(sanitize_with("<u>leave me <b>now</b></u>", &options), "<u>leave me </u>");

    let sanitizer = SafeListSanitizer::new().with_prune(true);
    let out = sanitizer
        .sanitize(Some("<div>kept<form>gone</form></div>"), &SanitizeOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(out, "<div>kept</div>");
}

#[test]
fn test_style_attribute() {
    let options = SanitizeOptions::new().attributes(["style"]);
    assert_eq!(
        sanitize_with("<p style=\"width:expression(alert(1));color:red\">t</p>", &options),
        "<p style=\"color:red;\">t</p>"
    );
    assert_eq!(
        sanitize_with("<p style=\"display:block; background-color:black;\">t</p>", &options),
        "<p style=\"display:block;background-color:black;\">t</p>"
    );
    assert_eq!(sanitize_with("<p style=\"position:fixed\">t</p>", &options), "<p>t</p>");
}

#[test]
fn test_sanitize_css_entry_point() {
    assert_eq!(sanitize_css("width: expression(alert(1));"), "");
    assert_eq!(
        sanitize_css("display:block; background-color:black;"),
        "display:block;background-color:black;"
    );
    assert_eq!(
        SafeListSanitizer::new().sanitize_css("color: red; position: absolute"),
        "color:red;"
    );
}

#[test]
fn test_json_options_are_validated_before_parsing() {
    let err = SanitizeOptions::from_value(&json!({"tags": "foo"})).unwrap_err();
    assert!(matches!(err, SanitizeError::InvalidArgument(_)));

    let err = SanitizeOptions::from_value(&json!({"attributes": {"href": true}})).unwrap_err();
    assert!(matches!(err, SanitizeError::InvalidArgument(_)));

    let err = SanitizeOptions::from_value(&json!({"scrubber": "not-registered"})).unwrap_err();
    assert!(matches!(err, SanitizeError::ScrubberNotFound(_)));

    let options = SanitizeOptions::from_value(&json!({"tags": ["b"], "attributes": []})).unwrap();
    assert_eq!(sanitize_with("<b title=\"t\">x</b><i>y</i>", &options), "<b>x</b>y");
}

#[test]
fn test_sanitize_is_idempotent() {
    let inputs = [
        "<p>Hello <b onclick=\"x\">world</b></p>",
        "<<<bad html>",
        "<a href=\"javascript:alert(1)\">x</a><img src=\"/ok.png\" alt=\"a&amp;b\">",
        "<table><tr><td>cell</td></tr></table><form>f</form>",
        "This has a <![CDATA[<section>]]> here.",
        "<div><script>a</script><style>b</style><!-- c -->d</div>",
        "<pre>\n\nx</pre>",
        "<template>a<b>b</b></template>c",
    ];
    for input in inputs {
        let once = safe_list_sanitize(input);
        assert_eq!(safe_list_sanitize(&once), once, "not idempotent for {:?}", input);
    }
}
