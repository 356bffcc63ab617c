//! XPath tokenizer.

use crate::error::{SanitizeError, SanitizeResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DoubleDot,
    At,
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    DoubleColon,
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("name `{}`", name),
            Token::Literal(value) => format!("literal '{}'", value),
            Token::Number(value) => format!("number {}", value),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Dot => ".",
            Token::DoubleDot => "..",
            Token::At => "@",
            Token::Star => "*",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Pipe => "|",
            Token::Eq => "=",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::DoubleColon => "::",
            Token::Name(_) | Token::Literal(_) | Token::Number(_) => "",
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub position: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

pub(crate) fn syntax_error(expression: &str, position: usize, message: impl Into<String>) -> SanitizeError {
    SanitizeError::XPathSyntax {
        expression: expression.to_string(),
        position,
        message: message.into(),
    }
}

pub(crate) fn tokenize(expression: &str) -> SanitizeResult<Vec<Lexeme>> {
    let chars: Vec<(usize, char)> = expression.char_indices().collect();
    let mut lexemes = Vec::new();
    let mut i = 0;

    let peek = |index: usize| chars.get(index).map(|&(_, c)| c);

    while i < chars.len() {
        let (position, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match c {
            '/' if peek(i + 1) == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '.' if peek(i + 1) == Some('.') => (Token::DoubleDot, 2),
            '.' if peek(i + 1).map_or(false, |next| next.is_ascii_digit()) => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&(_, d)| !d.is_ascii_digit())
                    .map_or(chars.len(), |offset| i + 1 + offset);
                let text: String = chars[i..end].iter().map(|&(_, d)| d).collect();
                let value = text.parse::<f64>().unwrap_or(f64::NAN);
                (Token::Number(value), end - i)
            }
            '.' => (Token::Dot, 1),
            '@' => (Token::At, 1),
            '*' => (Token::Star, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '=' => (Token::Eq, 1),
            '!' if peek(i + 1) == Some('=') => (Token::NotEq, 2),
            '<' if peek(i + 1) == Some('=') => (Token::LtEq, 2),
            '<' => (Token::Lt, 1),
            '>' if peek(i + 1) == Some('=') => (Token::GtEq, 2),
            '>' => (Token::Gt, 1),
            ':' if peek(i + 1) == Some(':') => (Token::DoubleColon, 2),
            '"' | '\'' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&(_, d)| d == c)
                    .ok_or_else(|| syntax_error(expression, position, "unterminated string literal"))?;
                let value: String = chars[i + 1..i + 1 + close].iter().map(|&(_, d)| d).collect();
                (Token::Literal(value), close + 2)
            }
            d if d.is_ascii_digit() => {
                let mut end = i;
                let mut seen_dot = false;
                while let Some(next) = peek(end) {
                    if next.is_ascii_digit() || (next == '.' && !seen_dot && peek(end + 1) != Some('.')) {
                        seen_dot |= next == '.';
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[i..end].iter().map(|&(_, d)| d).collect();
                let value = text.parse::<f64>().unwrap_or(f64::NAN);
                (Token::Number(value), end - i)
            }
            n if is_name_start(n) => {
                let mut end = i + 1;
                while let Some(next) = peek(end) {
                    if is_name_char(next) {
                        end += 1;
                    } else if next == ':'
                        && peek(end + 1).map_or(false, is_name_start)
                    {
                        // Prefixed name such as `xlink:href`
                        end += 2;
                    } else {
                        break;
                    }
                }
                let text: String = chars[i..end].iter().map(|&(_, d)| d).collect();
                (Token::Name(text), end - i)
            }
            other => {
                return Err(syntax_error(
                    expression,
                    position,
                    format!("unexpected character `{}`", other),
                ))
            }
        };

        lexemes.push(Lexeme { token, position });
        i += width;
    }

    Ok(lexemes)
}
