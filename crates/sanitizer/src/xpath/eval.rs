//! XPath evaluation over a kuchiki tree.

use kuchiki::{ExpandedName, NodeData, NodeRef};
use std::collections::{HashMap, HashSet};

use super::parser::{Axis, CompareOp, Expr, Function, LocationPath, NodeTest};
use crate::scrubber::qualified_name;

/// A node or attribute matched by an XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Node(NodeRef),
    Attribute { element: NodeRef, name: ExpandedName },
}

impl Selection {
    /// The matched node, or the element owning the matched attribute.
    pub fn node(&self) -> &NodeRef {
        match self {
            Selection::Node(node) => node,
            Selection::Attribute { element, .. } => element,
        }
    }

    /// XPath string-value of the selection.
    pub fn string_value(&self) -> String {
        match self {
            Selection::Node(node) => match node.data() {
                NodeData::Text(text) | NodeData::Comment(text) => text.borrow().clone(),
                NodeData::ProcessingInstruction(contents) => contents.borrow().1.clone(),
                NodeData::Doctype(_) => String::new(),
                _ => node.text_contents(),
            },
            Selection::Attribute { element, name } => element
                .as_element()
                .and_then(|data| data.attributes.borrow().map.get(name).map(|attr| attr.value.clone()))
                .unwrap_or_default(),
        }
    }

    fn name(&self, qualified: bool) -> String {
        match self {
            Selection::Node(node) => match node.data() {
                NodeData::Element(element) => match (&element.name.prefix, qualified) {
                    (Some(prefix), true) => format!("{}:{}", prefix, element.name.local),
                    _ => element.name.local.to_string(),
                },
                NodeData::ProcessingInstruction(contents) => contents.borrow().0.clone(),
                _ => String::new(),
            },
            Selection::Attribute { element, name } => {
                if !qualified {
                    return name.local.to_string();
                }
                element
                    .as_element()
                    .and_then(|data| {
                        data.attributes
                            .borrow()
                            .map
                            .get(name)
                            .map(|attr| qualified_name(name, attr))
                    })
                    .unwrap_or_else(|| name.local.to_string())
            }
        }
    }

    fn key(&self) -> (usize, Option<ExpandedName>) {
        let address = address_of(self.node());
        match self {
            Selection::Node(_) => (address, None),
            Selection::Attribute { name, .. } => (address, Some(name.clone())),
        }
    }
}

fn address_of(node: &NodeRef) -> usize {
    let node: &kuchiki::Node = node;
    node as *const kuchiki::Node as usize
}

fn push_unique(
    out: &mut Vec<Selection>,
    seen: &mut HashSet<(usize, Option<ExpandedName>)>,
    items: impl IntoIterator<Item = Selection>,
) {
    for item in items {
        if seen.insert(item.key()) {
            out.push(item);
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<Selection>),
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    fn boolean(&self) -> bool {
        match self {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Text(text) => !text.is_empty(),
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::Boolean(value) => *value,
        }
    }

    fn number(&self) -> f64 {
        match self {
            Value::Number(number) => *number,
            Value::Boolean(value) => f64::from(u8::from(*value)),
            other => other.string().trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn string(&self) -> String {
        match self {
            Value::Nodes(nodes) => nodes.first().map(Selection::string_value).unwrap_or_default(),
            Value::Text(text) => text.clone(),
            Value::Boolean(value) => value.to_string(),
            Value::Number(number) if number.is_nan() => "NaN".to_string(),
            Value::Number(number) if number.is_infinite() => {
                let sign = if *number > 0.0 { "" } else { "-" };
                format!("{}Infinity", sign)
            }
            Value::Number(number) if number.fract() == 0.0 => format!("{}", *number as i64),
            Value::Number(number) => number.to_string(),
        }
    }
}

fn compare_atoms(op: CompareOp, left: &Value, right: &Value) -> bool {
    let is_boolean = |value: &Value| matches!(value, Value::Boolean(_));
    let is_number = |value: &Value| matches!(value, Value::Number(_));
    match op {
        CompareOp::Eq | CompareOp::NotEq => {
            let equal = if is_boolean(left) || is_boolean(right) {
                left.boolean() == right.boolean()
            } else if is_number(left) || is_number(right) {
                left.number() == right.number()
            } else {
                left.string() == right.string()
            };
            equal == (op == CompareOp::Eq)
        }
        CompareOp::Lt => left.number() < right.number(),
        CompareOp::LtEq => left.number() <= right.number(),
        CompareOp::Gt => left.number() > right.number(),
        CompareOp::GtEq => left.number() >= right.number(),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    let text = |selection: &Selection| Value::Text(selection.string_value());
    match (left, right) {
        (Value::Nodes(l), Value::Nodes(r)) => l
            .iter()
            .any(|a| r.iter().any(|b| compare_atoms(op, &text(a), &text(b)))),
        (Value::Nodes(_), Value::Boolean(_)) | (Value::Boolean(_), Value::Nodes(_)) => compare_atoms(
            op,
            &Value::Boolean(left.boolean()),
            &Value::Boolean(right.boolean()),
        ),
        (Value::Nodes(l), atom) => l.iter().any(|a| compare_atoms(op, &text(a), atom)),
        (atom, Value::Nodes(r)) => r.iter().any(|b| compare_atoms(op, atom, &text(b))),
        _ => compare_atoms(op, left, right),
    }
}

fn element_matches(node: &NodeRef, name: &str) -> bool {
    let local = name.rsplit(':').next().unwrap_or(name);
    node.as_element()
        .map_or(false, |element| (*element.name.local).eq_ignore_ascii_case(local))
}

fn matches_test(selection: &Selection, test: &NodeTest) -> bool {
    match (selection, test) {
        (_, NodeTest::Node) => true,
        (Selection::Attribute { .. }, NodeTest::Wildcard) => true,
        (Selection::Attribute { .. }, NodeTest::Name(name)) => {
            let qualified = selection.name(true).to_ascii_lowercase();
            qualified == *name || (!name.contains(':') && selection.name(false).eq_ignore_ascii_case(name))
        }
        (Selection::Attribute { .. }, _) => false,
        (Selection::Node(node), NodeTest::Wildcard) => node.as_element().is_some(),
        (Selection::Node(node), NodeTest::Name(name)) => element_matches(node, name),
        (Selection::Node(node), NodeTest::Text) => node.as_text().is_some(),
        (Selection::Node(node), NodeTest::Comment) => node.as_comment().is_some(),
        (Selection::Node(node), NodeTest::ProcessingInstruction) => {
            matches!(node.data(), NodeData::ProcessingInstruction(_))
        }
    }
}

/// Items on `axis` from `selection`, nearest first for reverse axes.
fn along_axis(selection: &Selection, axis: Axis) -> Vec<Selection> {
    let node = match selection {
        Selection::Node(node) => node,
        Selection::Attribute { element, .. } => {
            return match axis {
                Axis::SelfAxis | Axis::DescendantOrSelf => vec![selection.clone()],
                Axis::Parent => vec![Selection::Node(element.clone())],
                Axis::Ancestor => element.inclusive_ancestors().map(Selection::Node).collect(),
                Axis::AncestorOrSelf => std::iter::once(selection.clone())
                    .chain(element.inclusive_ancestors().map(Selection::Node))
                    .collect(),
                _ => Vec::new(),
            };
        }
    };

    match axis {
        Axis::Child => node.children().map(Selection::Node).collect(),
        Axis::Descendant => node.descendants().map(Selection::Node).collect(),
        Axis::DescendantOrSelf => node.inclusive_descendants().map(Selection::Node).collect(),
        Axis::SelfAxis => vec![selection.clone()],
        Axis::Parent => node.parent().map(Selection::Node).into_iter().collect(),
        Axis::Ancestor => node.ancestors().map(Selection::Node).collect(),
        Axis::AncestorOrSelf => node.inclusive_ancestors().map(Selection::Node).collect(),
        Axis::FollowingSibling => node.following_siblings().map(Selection::Node).collect(),
        Axis::PrecedingSibling => node.preceding_siblings().map(Selection::Node).collect(),
        Axis::Attribute => match node.as_element() {
            Some(element) => element
                .attributes
                .borrow()
                .map
                .keys()
                .map(|name| Selection::Attribute {
                    element: node.clone(),
                    name: name.clone(),
                })
                .collect(),
            None => Vec::new(),
        },
    }
}

struct Context<'a> {
    item: &'a Selection,
    position: usize,
    size: usize,
}

pub(crate) struct Evaluator<'a> {
    document: &'a NodeRef,
    /// Document-order position of every node, template contents included.
    order: HashMap<usize, usize>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(document: &'a NodeRef) -> Self {
        let mut order = HashMap::new();
        let mut pending = vec![document.clone()];
        while let Some(node) = pending.pop() {
            order.insert(address_of(&node), order.len());
            pending.extend(crate::dom::content_children(&node).into_iter().rev());
        }
        Self { document, order }
    }

    /// Sort selections into document order. An element's attributes follow
    /// the element and precede its children.
    fn sort_document_order(&self, selections: &mut [Selection]) {
        selections.sort_by_cached_key(|selection| {
            let (address, attribute) = selection.key();
            let position = self.order.get(&address).copied().unwrap_or(usize::MAX);
            (position, attribute)
        });
    }

    /// Evaluate a node-set expression with `context` as the context node.
    pub(crate) fn select(&self, expr: &Expr, context: &Selection) -> Vec<Selection> {
        let context = Context {
            item: context,
            position: 1,
            size: 1,
        };
        match self.evaluate(expr, &context) {
            Value::Nodes(nodes) => nodes,
            _ => Vec::new(),
        }
    }

    fn evaluate(&self, expr: &Expr, context: &Context<'_>) -> Value {
        match expr {
            Expr::Or(left, right) => Value::Boolean(
                self.evaluate(left, context).boolean() || self.evaluate(right, context).boolean(),
            ),
            Expr::And(left, right) => Value::Boolean(
                self.evaluate(left, context).boolean() && self.evaluate(right, context).boolean(),
            ),
            Expr::Compare(op, left, right) => Value::Boolean(compare(
                *op,
                &self.evaluate(left, context),
                &self.evaluate(right, context),
            )),
            Expr::Union(members) => {
                let mut out = Vec::new();
                let mut seen = HashSet::new();
                for member in members {
                    if let Value::Nodes(nodes) = self.evaluate(member, context) {
                        push_unique(&mut out, &mut seen, nodes);
                    }
                }
                self.sort_document_order(&mut out);
                Value::Nodes(out)
            }
            Expr::Path(path) => Value::Nodes(self.location_path(path, context.item)),
            Expr::Literal(text) => Value::Text(text.clone()),
            Expr::Number(number) => Value::Number(*number),
            Expr::Call(function, arguments) => self.call(*function, arguments, context),
        }
    }

    fn argument_or_context(&self, arguments: &[Expr], context: &Context<'_>) -> Value {
        match arguments.first() {
            Some(argument) => self.evaluate(argument, context),
            None => Value::Nodes(vec![context.item.clone()]),
        }
    }

    fn call(&self, function: Function, arguments: &[Expr], context: &Context<'_>) -> Value {
        let string_at = |index: usize| {
            arguments
                .get(index)
                .map(|argument| self.evaluate(argument, context).string())
                .unwrap_or_default()
        };

        match function {
            Function::Position => Value::Number(context.position as f64),
            Function::Last => Value::Number(context.size as f64),
            Function::True => Value::Boolean(true),
            Function::False => Value::Boolean(false),
            Function::Not => Value::Boolean(!self.argument_or_context(arguments, context).boolean()),
            Function::Contains => Value::Boolean(string_at(0).contains(string_at(1).as_str())),
            Function::StartsWith => Value::Boolean(string_at(0).starts_with(string_at(1).as_str())),
            Function::Count => match self.argument_or_context(arguments, context) {
                Value::Nodes(nodes) => Value::Number(nodes.len() as f64),
                _ => Value::Number(0.0),
            },
            Function::Name | Function::LocalName => {
                let target = match self.argument_or_context(arguments, context) {
                    Value::Nodes(nodes) => nodes.into_iter().next(),
                    _ => None,
                };
                let qualified = function == Function::Name;
                Value::Text(target.map(|item| item.name(qualified)).unwrap_or_default())
            }
            Function::String => Value::Text(self.argument_or_context(arguments, context).string()),
            Function::NormalizeSpace => {
                let text = self.argument_or_context(arguments, context).string();
                Value::Text(text.split_whitespace().collect::<Vec<_>>().join(" "))
            }
        }
    }

    fn location_path(&self, path: &LocationPath, context: &Selection) -> Vec<Selection> {
        let mut current = if path.absolute {
            vec![Selection::Node(self.document.clone())]
        } else {
            vec![context.clone()]
        };

        for step in &path.steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for item in &current {
                let mut candidates: Vec<Selection> = along_axis(item, step.axis)
                    .into_iter()
                    .filter(|candidate| matches_test(candidate, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate);
                }
                push_unique(&mut next, &mut seen, candidates);
            }
            self.sort_document_order(&mut next);
            current = next;
        }

        current
    }

    fn filter(&self, candidates: Vec<Selection>, predicate: &Expr) -> Vec<Selection> {
        let size = candidates.len();
        candidates
            .into_iter()
            .enumerate()
            .filter(|(index, item)| {
                let context = Context {
                    item,
                    position: index + 1,
                    size,
                };
                match self.evaluate(predicate, &context) {
                    Value::Number(number) => number == (index + 1) as f64,
                    other => other.boolean(),
                }
            })
            .map(|(_, item)| item)
            .collect()
    }
}
