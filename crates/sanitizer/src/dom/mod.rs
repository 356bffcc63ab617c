//! Fragment adapter over the kuchiki tree.
//!
//! Input is parsed as an HTML5 fragment in a `<body>` context. The parser
//! wraps the fragment in an `<html>` element; that element is the fragment
//! root and only its children are ever serialized.

pub mod walker;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{local_name, namespace_url, ns, LocalName, QualName};
use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};
use std::fmt;
use std::io;

use crate::error::SanitizeResult;
use crate::metrics::ScrubMetrics;
use crate::safelist;
use crate::scrubber::Scrubber;
use crate::xpath::IntoXPaths;

/// A parsed HTML fragment owned by a single sanitize call.
pub struct Fragment {
    document: NodeRef,
    root: NodeRef,
}

impl Fragment {
    /// Parse markup as a body-context fragment. Parsing never fails; malformed
    /// markup is recovered the way a browser would recover it.
    pub fn parse(html: &str) -> Self {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        let document = kuchiki::parse_fragment(context, Vec::new()).one(html);
        let root = document
            .children()
            .find(|child| child.as_element().is_some())
            .unwrap_or_else(|| document.clone());

        tracing::trace!(bytes = html.len(), "parsed HTML fragment");
        Self { document, root }
    }

    /// The element whose children make up the fragment.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// The document node that owns the fragment root.
    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    /// Run a scrubber over every node below the root.
    pub fn scrub(&self, scrubber: &dyn Scrubber) -> ScrubMetrics {
        walker::walk(&self.root, scrubber)
    }

    /// Detach every node matched by one or more XPath expressions.
    pub fn remove_xpaths<X: IntoXPaths>(&self, xpaths: X) -> SanitizeResult<&Self> {
        crate::xpath::remove_matches(self, xpaths)?;
        Ok(self)
    }

    /// Serialize the fragment's children back to HTML.
    pub fn to_html(&self) -> String {
        let mut buffer = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        if let Err(err) = serialize(&mut buffer, &Markup(&self.root), opts) {
            tracing::warn!("⚠️ Fragment serialization failed: {}", err);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Concatenated text content of the fragment.
    pub fn text(&self) -> String {
        self.root.text_contents()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment").field("html", &self.to_html()).finish()
    }
}

/// Elements whose first newline the HTML parser swallows.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Children of `node` in document order, followed by `<template>` contents.
pub(crate) fn content_children(node: &NodeRef) -> Vec<NodeRef> {
    let mut children: Vec<NodeRef> = node.children().collect();
    if let Some(contents) = node
        .as_element()
        .and_then(|element| element.template_contents.as_ref())
    {
        children.extend(contents.children());
    }
    children
}

/// Whether serialized text of `node`'s first child needs an extra newline
/// to survive being parsed again.
fn needs_leading_newline(node: &NodeRef) -> bool {
    let swallows = element_name(node).map_or(false, |name| LEADING_NEWLINE_ELEMENTS.contains(&name.as_str()));
    swallows
        && node
            .first_child()
            .and_then(|child| child.as_text().map(|text| text.borrow().starts_with('\n')))
            .unwrap_or(false)
}

enum Step {
    Open(NodeRef),
    Close(QualName),
}

/// Serializes a tree without recursing, so nesting depth is not bounded by
/// the call stack.
struct Markup<'a>(&'a NodeRef);

impl Serialize for Markup<'_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()> {
        let mut pending: Vec<Step> = match traversal_scope {
            TraversalScope::IncludeNode => vec![Step::Open(self.0.clone())],
            TraversalScope::ChildrenOnly(_) => content_children(self.0).into_iter().rev().map(Step::Open).collect(),
        };

        while let Some(step) = pending.pop() {
            let node = match step {
                Step::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
                Step::Open(node) => node,
            };
            match node.data() {
                NodeData::Element(element) => {
                    let attributes: Vec<(QualName, String)> = element
                        .attributes
                        .borrow()
                        .map
                        .iter()
                        .map(|(name, attribute)| {
                            let qual_name = QualName::new(attribute.prefix.clone(), name.ns.clone(), name.local.clone());
                            (qual_name, attribute.value.clone())
                        })
                        .collect();
                    serializer.start_elem(
                        element.name.clone(),
                        attributes.iter().map(|(name, value)| (name, value.as_str())),
                    )?;
                    if needs_leading_newline(&node) {
                        serializer.write_text("\n")?;
                    }
                    pending.push(Step::Close(element.name.clone()));
                    pending.extend(content_children(&node).into_iter().rev().map(Step::Open));
                }
                NodeData::Text(text) => serializer.write_text(&text.borrow())?,
                NodeData::Comment(text) => serializer.write_comment(&text.borrow())?,
                NodeData::Doctype(doctype) => serializer.write_doctype(&doctype.name)?,
                NodeData::ProcessingInstruction(contents) => {
                    let contents = contents.borrow();
                    serializer.write_processing_instruction(&contents.0, &contents.1)?;
                }
                NodeData::Document(_) | NodeData::DocumentFragment => {
                    pending.extend(content_children(&node).into_iter().rev().map(Step::Open));
                }
            }
        }
        Ok(())
    }
}

/// Lowercased local name of an element node.
pub fn element_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|element| (*element.name.local).to_ascii_lowercase())
}

/// Replace an element with its children, keeping their order. A
/// `<template>` gives up its contents as well.
///
/// Returns the promoted children so a traversal can continue into them.
pub fn unwrap(node: &NodeRef) -> Vec<NodeRef> {
    let children = content_children(node);
    for child in &children {
        node.insert_before(child.clone());
    }
    node.detach();
    children
}

/// Put `replacement` where `node` was and move `node`'s children into it.
///
/// A void replacement cannot hold children, so they are placed after it.
/// Returns the nodes that now sit below or beside the replacement and still
/// need visiting.
pub fn replace(node: &NodeRef, replacement: &NodeRef) -> Vec<NodeRef> {
    if node == replacement {
        return node.children().collect();
    }
    let void = element_name(replacement).map_or(false, |name| safelist::is_void_element(&name));
    let children: Vec<NodeRef> = node.children().collect();
    node.insert_before(replacement.clone());
    for child in &children {
        if void {
            node.insert_before(child.clone());
        } else {
            replacement.append(child.clone());
        }
    }
    node.detach();
    if void {
        children
    } else {
        replacement.children().collect()
    }
}

/// Build an HTML element named `name` carrying `node`'s attributes.
///
/// Pair with [`Scrub::Replace`](crate::scrubber::Scrub::Replace) to rename
/// elements from a custom scrubber. Non-element nodes yield a bare element.
pub fn renamed(node: &NodeRef, name: &str) -> NodeRef {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(name.to_ascii_lowercase()));
    let attributes = match node.as_element() {
        Some(element) => element.attributes.borrow().map.clone(),
        None => Default::default(),
    };
    NodeRef::new_element(qual_name, attributes)
}

/// Whether a node is a comment, processing instruction or doctype.
pub fn is_markup_declaration(node: &NodeRef) -> bool {
    matches!(
        node.data(),
        NodeData::Comment(_) | NodeData::ProcessingInstruction(_) | NodeData::Doctype(_)
    )
}
