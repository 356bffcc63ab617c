//! Recursive descent parser for the supported XPath 1.0 subset.

use super::lexer::{syntax_error, tokenize, Lexeme, Token};
use crate::error::SanitizeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "attribute" => Axis::Attribute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    Wildcard,
    Node,
    Text,
    Comment,
    ProcessingInstruction,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Position,
    Last,
    Not,
    Contains,
    StartsWith,
    Name,
    LocalName,
    String,
    NormalizeSpace,
    Count,
    True,
    False,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "position" => Function::Position,
            "last" => Function::Last,
            "not" => Function::Not,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "name" => Function::Name,
            "local-name" => Function::LocalName,
            "string" => Function::String,
            "normalize-space" => Function::NormalizeSpace,
            "count" => Function::Count,
            "true" => Function::True,
            "false" => Function::False,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive.
    fn arity(self) -> (usize, usize) {
        match self {
            Function::Position | Function::Last | Function::True | Function::False => (0, 0),
            Function::Not | Function::Count => (1, 1),
            Function::Contains | Function::StartsWith => (2, 2),
            Function::Name | Function::LocalName | Function::String | Function::NormalizeSpace => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Union(Vec<Expr>),
    Path(LocationPath),
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// Whether the expression evaluates to a node-set.
    pub(crate) fn selects_nodes(&self) -> bool {
        match self {
            Expr::Path(_) => true,
            Expr::Union(members) => members.iter().all(Expr::selects_nodes),
            _ => false,
        }
    }
}

fn node_type(name: &str) -> Option<NodeTest> {
    match name {
        "node" => Some(NodeTest::Node),
        "text" => Some(NodeTest::Text),
        "comment" => Some(NodeTest::Comment),
        "processing-instruction" => Some(NodeTest::ProcessingInstruction),
        _ => None,
    }
}

pub(crate) struct Parser<'a> {
    expression: &'a str,
    lexemes: Vec<Lexeme>,
    index: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(expression: &'a str) -> SanitizeResult<Self> {
        Ok(Self {
            expression,
            lexemes: tokenize(expression)?,
            index: 0,
        })
    }

    /// Parse a complete expression, rejecting trailing tokens.
    pub(crate) fn parse(mut self) -> SanitizeResult<Expr> {
        if self.lexemes.is_empty() {
            return Err(syntax_error(self.expression, 0, "empty expression"));
        }
        let expr = self.or_expr()?;
        if let Some(lexeme) = self.lexemes.get(self.index) {
            return Err(syntax_error(
                self.expression,
                lexeme.position,
                format!("unexpected {}", lexeme.token.describe()),
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.index).map(|lexeme| &lexeme.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.lexemes.get(self.index + offset).map(|lexeme| &lexeme.token)
    }

    fn position(&self) -> usize {
        self.lexemes
            .get(self.index)
            .map_or(self.expression.len(), |lexeme| lexeme.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.lexemes.get(self.index).map(|lexeme| lexeme.token.clone());
        self.index += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> SanitizeResult<()> {
        if self.eat(&token) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), Token::describe);
        Err(self.error(format!("expected {}, found {}", token.describe(), found)))
    }

    fn error(&self, message: impl Into<String>) -> crate::error::SanitizeError {
        syntax_error(self.expression, self.position(), message)
    }

    fn or_expr(&mut self) -> SanitizeResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> SanitizeResult<Expr> {
        let mut left = self.equality_expr()?;
        while self.eat_keyword("and") {
            let right = self.equality_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality_expr(&mut self) -> SanitizeResult<Expr> {
        let mut left = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => return Ok(left),
            };
            self.index += 1;
            let right = self.relational_expr()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn relational_expr(&mut self) -> SanitizeResult<Expr> {
        let mut left = self.union_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::LtEq) => CompareOp::LtEq,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::GtEq) => CompareOp::GtEq,
                _ => return Ok(left),
            };
            self.index += 1;
            let right = self.union_expr()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn union_expr(&mut self) -> SanitizeResult<Expr> {
        let first = self.primary_or_path()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Pipe) {
            members.push(self.primary_or_path()?);
        }
        if !members.iter().all(Expr::selects_nodes) {
            return Err(self.error("union operands must be location paths"));
        }
        Ok(Expr::Union(members))
    }

    fn primary_or_path(&mut self) -> SanitizeResult<Expr> {
        match self.peek() {
            Some(Token::Literal(value)) => {
                let value = value.clone();
                self.index += 1;
                Ok(Expr::Literal(value))
            }
            Some(Token::Number(value)) => {
                let value = *value;
                self.index += 1;
                Ok(Expr::Number(value))
            }
            Some(Token::LParen) => {
                self.index += 1;
                let inner = self.or_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && node_type(name).is_none() =>
            {
                self.function_call()
            }
            _ => Ok(Expr::Path(self.location_path()?)),
        }
    }

    fn function_call(&mut self) -> SanitizeResult<Expr> {
        let start = self.position();
        let name = match self.advance() {
            Some(Token::Name(name)) => name,
            _ => return Err(self.error("expected a function name")),
        };
        let function = Function::from_name(&name).ok_or_else(|| {
            syntax_error(self.expression, start, format!("unknown function `{}`", name))
        })?;

        self.expect(Token::LParen)?;
        let mut arguments = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                arguments.push(self.or_expr()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma)?;
            }
        }

        let (min, max) = function.arity();
        if arguments.len() < min || arguments.len() > max {
            return Err(syntax_error(
                self.expression,
                start,
                format!("`{}` takes {} to {} arguments, got {}", name, min, max, arguments.len()),
            ));
        }
        if function == Function::Count && !arguments[0].selects_nodes() {
            return Err(syntax_error(self.expression, start, "`count` expects a location path"));
        }
        Ok(Expr::Call(function, arguments))
    }

    fn location_path(&mut self) -> SanitizeResult<LocationPath> {
        let mut path = LocationPath {
            absolute: false,
            steps: Vec::new(),
        };

        match self.peek() {
            Some(Token::Slash) => {
                self.index += 1;
                path.absolute = true;
                if !self.starts_step() {
                    return Ok(path);
                }
            }
            Some(Token::DoubleSlash) => {
                self.index += 1;
                path.absolute = true;
                path.steps.push(descendant_or_self());
            }
            _ => {}
        }

        path.steps.push(self.step()?);
        loop {
            if self.eat(&Token::Slash) {
                path.steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                path.steps.push(descendant_or_self());
                path.steps.push(self.step()?);
            } else {
                return Ok(path);
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DoubleDot | Token::At | Token::Star | Token::Name(_))
        )
    }

    fn step(&mut self) -> SanitizeResult<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DoubleDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::from_name(name)
                .ok_or_else(|| self.error(format!("unsupported axis `{}`", name)))?;
            self.index += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.or_expr()?);
            self.expect(Token::RBracket)?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> SanitizeResult<NodeTest> {
        match self.peek() {
            Some(Token::Star) => {
                self.index += 1;
                Ok(NodeTest::Wildcard)
            }
            Some(Token::Name(name)) => {
                let name = name.clone();
                self.index += 1;
                match node_type(&name) {
                    Some(test) if self.peek() == Some(&Token::LParen) => {
                        self.index += 1;
                        self.expect(Token::RParen)?;
                        Ok(test)
                    }
                    _ => Ok(NodeTest::Name(name.to_ascii_lowercase())),
                }
            }
            Some(other) => {
                let message = format!("expected a node test, found {}", other.describe());
                Err(self.error(message))
            }
            None => Err(self.error("expected a node test, found end of expression")),
        }
    }
}

fn descendant_or_self() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::Node,
        predicates: Vec::new(),
    }
}
