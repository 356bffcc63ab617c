//! XPath selection for removing parts of a fragment.
//!
//! A subset of XPath 1.0 is supported: the child, descendant, self, parent,
//! ancestor, sibling and attribute axes with their abbreviations, name and
//! node-type tests, predicates with boolean and comparison operators, and a
//! small function library. Relative expressions are evaluated against the
//! fragment root; absolute ones against the owning document.

mod eval;
mod lexer;
mod parser;

use std::fmt;

use crate::dom::Fragment;
use crate::error::SanitizeResult;
use eval::Evaluator;
pub use eval::Selection;
use parser::{Expr, Parser};

/// Anything that can be turned into a list of XPath expressions.
pub trait IntoXPaths {
    fn into_xpaths(self) -> Vec<String>;
}

impl IntoXPaths for &str {
    fn into_xpaths(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoXPaths for String {
    fn into_xpaths(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: AsRef<str>> IntoXPaths for Vec<S> {
    fn into_xpaths(self) -> Vec<String> {
        self.iter().map(|xpath| xpath.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoXPaths for &[S] {
    fn into_xpaths(self) -> Vec<String> {
        self.iter().map(|xpath| xpath.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoXPaths for [S; N] {
    fn into_xpaths(self) -> Vec<String> {
        self.iter().map(|xpath| xpath.as_ref().to_string()).collect()
    }
}

/// A compiled XPath expression that selects nodes.
#[derive(Debug, Clone)]
pub struct XPath {
    expression: String,
    expr: Expr,
}

impl XPath {
    /// Compile an expression. Expressions that cannot yield nodes, such as
    /// `count(//a)`, are rejected.
    pub fn compile(expression: &str) -> SanitizeResult<Self> {
        let expr = Parser::new(expression)?.parse()?;
        if !expr.selects_nodes() {
            return Err(lexer::syntax_error(expression, 0, "expression does not select nodes"));
        }
        Ok(Self {
            expression: expression.to_string(),
            expr,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Every node and attribute the expression matches in `fragment`.
    pub fn select(&self, fragment: &Fragment) -> Vec<Selection> {
        Evaluator::new(fragment.document())
            .select(&self.expr, &Selection::Node(fragment.root().clone()))
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Remove everything matched by `xpaths` from `fragment`.
///
/// All expressions are compiled before anything is removed, so a syntax
/// error leaves the fragment untouched. Matched attributes are removed from
/// their element. Matching the root or the document empties the fragment.
pub(crate) fn remove_matches<X: IntoXPaths>(fragment: &Fragment, xpaths: X) -> SanitizeResult<()> {
    let compiled = xpaths
        .into_xpaths()
        .iter()
        .map(|expression| XPath::compile(expression))
        .collect::<SanitizeResult<Vec<_>>>()?;

    for xpath in &compiled {
        let selections = xpath.select(fragment);
        tracing::debug!(xpath = %xpath, matches = selections.len(), "removing XPath matches");

        for selection in selections {
            match selection {
                Selection::Node(node) if node == *fragment.root() || node == *fragment.document() => {
                    for child in fragment.root().children().collect::<Vec<_>>() {
                        child.detach();
                    }
                }
                Selection::Node(node) => node.detach(),
                Selection::Attribute { element, name } => {
                    if let Some(data) = element.as_element() {
                        data.attributes.borrow_mut().map.remove(&name);
                    }
                }
            }
        }
    }

    Ok(())
}
