//! Line syntax for the interactive front-end.
//!
//! ```text
//! 2 3 add                      query: literals and operator keywords
//! (1 2 3) each                 lists; words inside parentheses are resources
//! <http://example.org/s>       resource literal
//! "text"                       string literal
//! @define twice: dup add       bind a keyword
//! @list   @help dup   @undefine twice   @quit
//! ```
//!
//! Top-level words other than numbers are operator references. A trailing
//! `.` on a query is ignored.

use regex::Regex;
use thiserror::Error;

use crate::eval::Token;
use crate::model::Value;
use crate::scheduler::Directive;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("Unknown directive: @{0}")]
    UnknownDirective(String),
    #[error("Malformed directive: {0}")]
    MalformedDirective(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Vec<Token>),
    Define { name: String, tokens: Vec<Token> },
    Directive(Directive),
    Quit,
    Empty,
}

pub struct Lexer {
    pattern: Regex,
}

enum Item {
    Value(Value),
    Word(String),
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r#"(?P<string>"(?:[^"\\]|\\.)*")|(?P<open>\()|(?P<close>\))|(?P<word>[^\s()"]+)|(?P<bad>")"#,
            )
            .expect("lexer pattern is a valid regex"),
        }
    }

    pub fn parse_line(&self, line: &str) -> Result<Statement, LexError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Statement::Empty);
        }
        match line.strip_prefix('@') {
            Some(directive) => self.parse_directive(directive),
            None => Ok(Statement::Query(self.tokens(line)?)),
        }
    }

    fn parse_directive(&self, text: &str) -> Result<Statement, LexError> {
        let (keyword, rest) = match text.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (text, ""),
        };
        let single_name = |rest: &str| {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                Err(LexError::MalformedDirective(format!("@{} {}", keyword, rest)))
            } else {
                Ok(rest.to_string())
            }
        };
        match keyword {
            "quit" => Ok(Statement::Quit),
            "list" => Ok(Statement::Directive(Directive::List)),
            "help" => Ok(Statement::Directive(Directive::Help(single_name(rest)?))),
            "undefine" => Ok(Statement::Directive(Directive::Undefine(single_name(rest)?))),
            "define" => {
                let (name, body) = rest
                    .split_once(':')
                    .ok_or_else(|| LexError::MalformedDirective(format!("@define {}", rest)))?;
                Ok(Statement::Define {
                    name: single_name(name.trim())?,
                    tokens: self.tokens(body)?,
                })
            }
            other => Err(LexError::UnknownDirective(other.to_string())),
        }
    }

    /// Splits a query into tokens.
    pub fn tokens(&self, text: &str) -> Result<Vec<Token>, LexError> {
        let mut lists: Vec<Vec<Value>> = Vec::new();
        let mut tokens = Vec::new();

        for captures in self.pattern.captures_iter(text) {
            let item = if let Some(m) = captures.name("string") {
                Item::Value(Value::text(unescape(&m.as_str()[1..m.as_str().len() - 1])))
            } else if captures.name("open").is_some() {
                lists.push(Vec::new());
                continue;
            } else if captures.name("close").is_some() {
                let items = lists.pop().ok_or(LexError::UnbalancedParentheses)?;
                Item::Value(Value::list(items))
            } else if let Some(m) = captures.name("word") {
                classify(m.as_str())
            } else {
                return Err(LexError::UnterminatedString);
            };

            match (lists.last_mut(), item) {
                (Some(list), Item::Value(value)) => list.push(value),
                (Some(list), Item::Word(word)) => list.push(Value::resource(word)),
                (None, Item::Value(value)) => tokens.push(Token::Literal(value)),
                (None, Item::Word(word)) => tokens.push(Token::OperatorRef(word)),
            }
        }
        if !lists.is_empty() {
            return Err(LexError::UnbalancedParentheses);
        }
        if matches!(tokens.last(), Some(Token::OperatorRef(word)) if word == ".") {
            tokens.pop();
        }
        Ok(tokens)
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(word: &str) -> Item {
    if let Ok(i) = word.parse::<i64>() {
        return Item::Value(Value::from(i));
    }
    if word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
        if let Ok(d) = word.parse::<f64>() {
            return Item::Value(Value::from(d));
        }
    }
    if let Some(iri) = word.strip_prefix('<').and_then(|w| w.strip_suffix('>')) {
        return Item::Value(Value::resource(iri));
    }
    Item::Word(word.to_string())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_tokens() {
        let lexer = Lexer::new();
        let statement = lexer.parse_line(r#"2 2.5 "a \"b\"" dup <urn:x> ."#).unwrap();
        assert_eq!(
            statement,
            Statement::Query(vec![
                Token::literal(2),
                Token::literal(2.5),
                Token::literal("a \"b\""),
                Token::op("dup"),
                Token::literal(Value::resource("urn:x")),
            ])
        );
    }

    #[test]
    fn test_nested_lists() {
        let lexer = Lexer::new();
        let tokens = lexer.tokens("((1 2) dup) i").unwrap();
        let expected = Value::list(vec![
            Value::list(vec![Value::from(1), Value::from(2)]),
            Value::resource("dup"),
        ]);
        assert_eq!(tokens, vec![Token::Literal(expected), Token::op("i")]);
    }

    #[test]
    fn test_errors() {
        let lexer = Lexer::new();
        assert_eq!(lexer.tokens("(1 2"), Err(LexError::UnbalancedParentheses));
        assert_eq!(lexer.tokens("1 2)"), Err(LexError::UnbalancedParentheses));
        assert_eq!(lexer.tokens(r#"1 "abc"#), Err(LexError::UnterminatedString));
        assert_eq!(
            lexer.parse_line("@frobnicate"),
            Err(LexError::UnknownDirective("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_directives() {
        let lexer = Lexer::new();
        assert_eq!(lexer.parse_line("  "), Ok(Statement::Empty));
        assert_eq!(lexer.parse_line("@quit"), Ok(Statement::Quit));
        assert_eq!(
            lexer.parse_line("@help dup"),
            Ok(Statement::Directive(Directive::Help("dup".to_string())))
        );
        assert_eq!(
            lexer.parse_line("@define twice: dup add"),
            Ok(Statement::Define {
                name: "twice".to_string(),
                tokens: vec![Token::op("dup"), Token::op("add")],
            })
        );
        assert!(lexer.parse_line("@help").is_err());
    }
}
