//! Top-down traversal that applies scrubber actions.
//!
//! The walk keeps an explicit worklist instead of recursing, so hostile
//! nesting depth cannot exhaust the stack. Nodes are visited in document
//! order. When a node is unwrapped its children are promoted into its place
//! and visited next, so nothing under an unwrapped element escapes the
//! scrubber.

use kuchiki::NodeRef;

use crate::metrics::ScrubMetrics;
use crate::scrubber::{Scrub, Scrubber};

fn schedule(pending: &mut Vec<NodeRef>, nodes: Vec<NodeRef>) {
    pending.extend(nodes.into_iter().rev());
}

/// Walk every node below `root` and apply what `scrubber` decides.
///
/// `root` itself is never handed to the scrubber.
pub fn walk(root: &NodeRef, scrubber: &dyn Scrubber) -> ScrubMetrics {
    let metrics = ScrubMetrics::new();
    let mut pending = Vec::new();
    schedule(&mut pending, super::content_children(root));

    while let Some(node) = pending.pop() {
        metrics.increment_visited();
        match scrubber.scrub(&node) {
            Scrub::Continue => schedule(&mut pending, super::content_children(&node)),
            Scrub::Stop => {}
            Scrub::Unwrap => {
                let promoted = super::unwrap(&node);
                metrics.increment_unwrapped();
                schedule(&mut pending, promoted);
            }
            Scrub::Remove => {
                node.detach();
                metrics.increment_removed();
            }
            Scrub::Replace(replacement) => {
                let moved = super::replace(&node, &replacement);
                metrics.increment_replaced();
                schedule(&mut pending, moved);
            }
        }
    }

    tracing::trace!(
        visited = metrics.nodes_visited(),
        removed = metrics.nodes_removed(),
        unwrapped = metrics.nodes_unwrapped(),
        "scrub pass complete"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{element_name, Fragment};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_visits_in_document_order() {
        let fragment = Fragment::parse("<p>a<b>b</b></p><i>c</i>");
        let seen = Mutex::new(Vec::new());
        let recorder = |node: &NodeRef| {
            let name = element_name(node).unwrap_or_else(|| "#text".to_string());
            seen.lock().unwrap().push(name);
            Scrub::Continue
        };
        walk(fragment.root(), &recorder);
        assert_eq!(seen.into_inner().unwrap(), vec!["p", "#text", "b", "#text", "i", "#text"]);
    }

    #[test]
    fn test_unwrapped_children_are_visited() {
        let fragment = Fragment::parse("<div><span><script>x</script></span></div>");
        let scrubber = |node: &NodeRef| match element_name(node).as_deref() {
            Some("script") => Scrub::Remove,
            Some(_) => Scrub::Unwrap,
            None => Scrub::Continue,
        };
        let metrics = walk(fragment.root(), &scrubber);
        assert_eq!(fragment.to_html(), "");
        assert_eq!(metrics.nodes_unwrapped(), 2);
        assert_eq!(metrics.nodes_removed(), 1);
    }

    #[test]
    fn test_stop_skips_subtree() {
        let fragment = Fragment::parse("<pre><b>kept</b></pre><b>gone</b>");
        let scrubber = |node: &NodeRef| match element_name(node).as_deref() {
            Some("pre") => Scrub::Stop,
            Some("b") => Scrub::Remove,
            _ => Scrub::Continue,
        };
        walk(fragment.root(), &scrubber);
        assert_eq!(fragment.to_html(), "<pre><b>kept</b></pre>");
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let html = format!("{}x{}", "<span>".repeat(2000), "</span>".repeat(2000));
        let fragment = Fragment::parse(&html);
        let scrubber = |node: &NodeRef| match element_name(node) {
            Some(_) => Scrub::Unwrap,
            None => Scrub::Continue,
        };
        walk(fragment.root(), &scrubber);
        assert_eq!(fragment.to_html(), "x");
    }
}
