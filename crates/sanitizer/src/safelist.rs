//! Static safelist tables.
//!
//! Every entry is stored lowercase. Callers compare against these tables with
//! lowercased names, so SVG camel-case element names such as `linearGradient`
//! appear here as `lineargradient`.

use lazy_static::lazy_static;
use std::collections::HashSet;

fn table(entries: &[&'static str]) -> HashSet<&'static str> {
    entries.iter().copied().collect()
}

const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "big", "blockquote", "br", "button", "canvas", "caption", "center", "cite", "code", "col",
    "colgroup", "command", "datalist", "dd", "del", "details", "dfn", "dir", "div", "dl", "dt",
    "em", "fieldset", "figcaption", "figure", "font", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "i", "img", "input", "ins", "kbd", "label", "legend", "li",
    "main", "map", "mark", "menu", "meter", "nav", "ol", "optgroup", "option", "output", "p",
    "pre", "q", "s", "samp", "section", "select", "small", "source", "span", "strike", "strong",
    "sub", "summary", "sup", "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "time",
    "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
];

const MATHML_ELEMENTS: &[&str] = &[
    "annotation", "annotation-xml", "maction", "math", "merror", "mfrac", "mi", "mmultiscripts",
    "mn", "mo", "mover", "mpadded", "mphantom", "mprescripts", "mroot", "mrow", "ms", "mspace",
    "msqrt", "mstyle", "msub", "msubsup", "msup", "mtable", "mtd", "mtext", "mtr", "munder",
    "munderover", "none", "semantics",
];

const SVG_ELEMENTS: &[&str] = &[
    "animate", "animatecolor", "animatemotion", "animatetransform", "circle", "clippath", "defs",
    "desc", "ellipse", "fegaussianblur", "filter", "font-face", "font-face-name",
    "font-face-src", "foreignobject", "g", "glyph", "hkern", "line", "lineargradient", "marker",
    "mask", "metadata", "missing-glyph", "mpath", "path", "pattern", "polygon", "polyline",
    "radialgradient", "rect", "set", "stop", "svg", "switch", "symbol", "text", "textpath",
    "title", "tref", "tspan", "use",
];

const HTML_ATTRIBUTES: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "align", "alt", "axis", "bgcolor", "border",
    "cellpadding", "cellspacing", "char", "charoff", "charset", "checked", "cite", "class",
    "clear", "color", "cols", "colspan", "compact", "controls", "coords", "datetime", "dir",
    "disabled", "enctype", "for", "frame", "headers", "height", "high", "href", "hreflang",
    "hspace", "id", "ismap", "kind", "label", "lang", "list", "longdesc", "loop", "low",
    "max", "maxlength", "media", "method", "min", "multiple", "name", "nohref", "noshade",
    "nowrap", "open", "optimum", "pattern", "placeholder", "poster", "preload", "pubdate",
    "readonly", "rel", "rev", "reversed", "rows", "rowspan", "rules", "scope", "selected",
    "shape", "size", "span", "src", "srclang", "start", "step", "style", "summary", "tabindex",
    "target", "title", "type", "usemap", "valign", "value", "vspace", "width", "wrap",
    "xml:lang",
];

const MATHML_ATTRIBUTES: &[&str] = &[
    "actiontype", "align", "close", "columnalign", "columnlines", "columnspacing", "columnspan",
    "depth", "display", "displaystyle", "encoding", "equalcolumns", "equalrows", "fence",
    "fontstyle", "fontweight", "frame", "height", "linethickness", "lspace", "mathbackground",
    "mathcolor", "mathvariant", "maxsize", "minsize", "open", "other", "rowalign", "rowlines",
    "rowspacing", "rowspan", "rspace", "scriptlevel", "selection", "separator", "separators",
    "stretchy", "width", "xlink:href", "xlink:show", "xlink:type", "xmlns", "xmlns:xlink",
];

const SVG_ATTRIBUTES: &[&str] = &[
    "accent-height", "accumulate", "additive", "alphabetic", "arabic-form", "ascent",
    "attributename", "attributetype", "baseprofile", "bbox", "begin", "calcmode", "cap-height",
    "class", "clip-path", "clip-rule", "color", "color-interpolation-filters", "color-rendering",
    "content", "cx", "cy", "d", "descent", "display", "dur", "dx", "dy", "end", "fill",
    "fill-opacity", "fill-rule", "filterres", "filterunits", "font-family", "font-size",
    "font-stretch", "font-style", "font-variant", "font-weight", "fx", "fy", "g1", "g2",
    "glyph-name", "gradientunits", "hanging", "height", "horiz-adv-x", "horiz-origin-x", "id",
    "ideographic", "k", "keypoints", "keysplines", "keytimes", "lang", "marker-end",
    "marker-mid", "marker-start", "markerheight", "markerunits", "markerwidth", "mask",
    "maskcontentunits", "maskunits", "mathematical", "max", "method", "min", "name", "offset",
    "opacity", "orient", "origin", "overline-position", "overline-thickness", "panose-1",
    "path", "pathlength", "patterncontentunits", "patterntransform", "patternunits", "points",
    "preserveaspectratio", "r", "refx", "refy", "repeatcount", "repeatdur", "requiredextensions",
    "requiredfeatures", "restart", "rotate", "rx", "ry", "slope", "spacing", "startoffset",
    "stddeviation", "stemh", "stemv", "stop-color", "stop-opacity", "strikethrough-position",
    "strikethrough-thickness", "stroke", "stroke-dasharray", "stroke-dashoffset",
    "stroke-linecap", "stroke-linejoin", "stroke-miterlimit", "stroke-opacity", "stroke-width",
    "systemlanguage", "target", "text-anchor", "transform", "type", "u1", "u2",
    "underline-position", "underline-thickness", "unicode", "unicode-range", "units-per-em",
    "values", "version", "viewbox", "visibility", "width", "widths", "x", "x-height", "x1",
    "x2", "xlink:actuate", "xlink:arcrole", "xlink:href", "xlink:role", "xlink:show",
    "xlink:title", "xlink:type", "xml:base", "xml:lang", "xml:space", "xmlns", "xmlns:xlink",
    "y", "y1", "y2", "zoomandpan",
];

lazy_static! {
    /// Elements the engine knows how to render safely.
    pub static ref ALLOWED_ELEMENTS: HashSet<&'static str> = {
        let mut set = table(HTML_ELEMENTS);
        set.extend(MATHML_ELEMENTS.iter().copied());
        set.extend(SVG_ELEMENTS.iter().copied());
        set
    };

    /// Attributes the engine knows how to render safely.
    pub static ref ALLOWED_ATTRIBUTES: HashSet<&'static str> = {
        let mut set = table(HTML_ATTRIBUTES);
        set.extend(MATHML_ATTRIBUTES.iter().copied());
        set.extend(SVG_ATTRIBUTES.iter().copied());
        set
    };

    /// Elements that never have children.
    pub static ref VOID_ELEMENTS: HashSet<&'static str> = table(&[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]);

    /// Attributes whose value is interpreted as a URI.
    pub static ref ATTR_VAL_IS_URI: HashSet<&'static str> = table(&[
        "action", "background", "cite", "codebase", "data", "dynsrc", "formaction", "href",
        "icon", "longdesc", "lowsrc", "manifest", "poster", "profile", "src", "usemap",
        "xlink:href", "xml:base",
    ]);

    /// SVG attributes that may carry `url(#...)` references.
    pub static ref SVG_ATTR_VAL_ALLOWS_REF: HashSet<&'static str> = table(&[
        "clip-path", "color-profile", "cursor", "fill", "filter", "marker", "marker-end",
        "marker-mid", "marker-start", "mask", "stroke",
    ]);

    /// SVG elements whose `xlink:href` may only point inside the document.
    pub static ref SVG_ALLOW_LOCAL_HREF: HashSet<&'static str> = table(&[
        "altglyph", "animate", "animatecolor", "animatemotion", "animatetransform", "cursor",
        "feimage", "filter", "lineargradient", "pattern", "radialgradient", "set", "textpath",
        "tref", "use",
    ]);

    /// URI schemes allowed in URI-valued attributes and CSS `url()`.
    pub static ref ALLOWED_PROTOCOLS: HashSet<&'static str> = table(&[
        "afs", "aim", "callto", "ed2k", "feed", "ftp", "gopher", "http", "https", "irc",
        "mailto", "news", "nntp", "rsync", "rtsp", "sftp", "ssh", "svn", "tag", "telnet", "urn",
        "webcal", "xmpp",
    ]);

    /// Media types accepted inside `data:` URIs once `data` is an allowed scheme.
    pub static ref ALLOWED_URI_DATA_MEDIATYPES: HashSet<&'static str> = table(&[
        "image/gif", "image/jpeg", "image/png", "image/svg+xml", "text/css", "text/plain",
    ]);

    /// CSS properties that may appear in a `style` attribute.
    pub static ref ALLOWED_CSS_PROPERTIES: HashSet<&'static str> = table(&[
        "azimuth", "background-color", "border-bottom-color", "border-collapse", "border-color",
        "border-left-color", "border-right-color", "border-top-color", "clear", "color",
        "cursor", "direction", "display", "elevation", "float", "font", "font-family",
        "font-size", "font-style", "font-variant", "font-weight", "height", "letter-spacing",
        "line-height", "list-style-type", "max-height", "max-width", "min-height", "min-width",
        "overflow", "pause", "pause-after", "pause-before", "pitch", "pitch-range", "richness",
        "speak", "speak-header", "speak-numeral", "speak-punctuation", "speech-rate", "stress",
        "text-align", "text-decoration", "text-indent", "text-transform", "unicode-bidi",
        "vertical-align", "voice-family", "volume", "white-space", "width",
    ]);

    /// SVG presentation properties that may appear in a `style` attribute.
    pub static ref ALLOWED_SVG_PROPERTIES: HashSet<&'static str> = table(&[
        "fill", "fill-opacity", "fill-rule", "stroke", "stroke-linecap", "stroke-linejoin",
        "stroke-opacity", "stroke-width",
    ]);

    /// Property families allowed with any suffix (`margin-left`, `border-top-width`, ...).
    pub static ref SHORTHAND_CSS_PROPERTIES: HashSet<&'static str> = table(&[
        "background", "border", "margin", "padding",
    ]);

    /// Identifier values accepted for shorthand properties.
    pub static ref ALLOWED_CSS_KEYWORDS: HashSet<&'static str> = table(&[
        "!important", "aqua", "auto", "black", "block", "blue", "bold", "both", "bottom",
        "brown", "center", "collapse", "dashed", "dotted", "fuchsia", "gray", "green", "italic",
        "left", "lime", "maroon", "medium", "navy", "none", "normal", "nowrap", "olive",
        "pointer", "purple", "red", "right", "silver", "solid", "teal", "top", "transparent",
        "underline", "white", "yellow",
    ]);

    /// CSS functions kept inside declaration values.
    pub static ref ALLOWED_CSS_FUNCTIONS: HashSet<&'static str> = table(&[
        "calc", "hsl", "hsla", "rgb", "rgba",
    ]);

    /// Elements dropped together with their content when they are not allowed.
    pub static ref CLEAN_CONTENT_ELEMENTS: HashSet<&'static str> = table(&["script", "style"]);

    /// Conservative element set used when no per-call `tags` are given.
    pub static ref DEFAULT_ALLOWED_TAGS: HashSet<&'static str> = table(&[
        "a", "abbr", "acronym", "address", "audio", "b", "big", "blockquote", "br", "caption",
        "cite", "code", "col", "colgroup", "dd", "del", "dfn", "div", "dl", "dt", "em", "h1",
        "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd", "li", "ol", "p", "pre",
        "samp", "small", "source", "span", "strong", "sub", "sup", "table", "tbody", "td",
        "tfoot", "th", "thead", "tr", "tt", "ul", "var", "video",
    ]);

    /// Conservative attribute set used when no per-call `attributes` are given.
    pub static ref DEFAULT_ALLOWED_ATTRIBUTES: HashSet<&'static str> = table(&[
        "abbr", "alt", "cite", "class", "colspan", "controls", "datetime", "height", "href",
        "lang", "name", "poster", "rowspan", "src", "title", "width", "xml:lang",
    ]);
}

/// Checks whether an element name appears in the full element safelist.
pub fn is_allowed_element(name: &str) -> bool {
    ALLOWED_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

/// Checks whether an attribute name appears in the full attribute safelist.
pub fn is_allowed_attribute(name: &str) -> bool {
    ALLOWED_ATTRIBUTES.contains(name.to_ascii_lowercase().as_str())
}

/// Void elements never carry children.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

/// Event-handler attributes are stripped whatever the policy says.
pub fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).map_or(false, |prefix| prefix.eq_ignore_ascii_case("on"))
}
