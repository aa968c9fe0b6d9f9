//! Split pattern text into literal runs and placeholders.

use crate::errors::{PatternError, placeholder_error};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder { name: String, hint: Option<String> },
}

pub(crate) fn lex_pattern(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' => literal.push(chars.next().map_or('\\', |(_, escaped)| escaped)),
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => literal.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => literal.push('}'),
            '{' => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(lex_placeholder(&mut chars, pos)?);
            }
            '}' => {
                return Err(placeholder_error(
                    "unmatched closing brace '}' in step pattern",
                    pos,
                    None,
                ));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn lex_placeholder(
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<Token, PatternError> {
    let mut name = String::new();
    while let Some((_, c)) = chars.next_if(|&(_, c)| c.is_ascii_alphanumeric() || c == '_') {
        name.push(c);
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(placeholder_error(
            "placeholder name must start with a letter or underscore",
            start,
            None,
        ));
    }

    let mut hint = None;
    if chars.next_if(|&(_, c)| c == ':').is_some() {
        let mut raw = String::new();
        while let Some((_, c)) = chars.next_if(|&(_, c)| c != '}') {
            if c.is_whitespace() || c == '{' {
                return Err(placeholder_error(
                    "invalid placeholder in step pattern",
                    start,
                    Some(name),
                ));
            }
            raw.push(c);
        }
        if raw.is_empty() {
            return Err(placeholder_error(
                "invalid placeholder in step pattern",
                start,
                Some(name),
            ));
        }
        hint = Some(raw);
    }

    match chars.next() {
        Some((_, '}')) => Ok(Token::Placeholder { name, hint }),
        Some(_) => Err(placeholder_error(
            "invalid placeholder in step pattern",
            start,
            Some(name),
        )),
        None => Err(placeholder_error(
            "missing closing '}' for placeholder",
            start,
            Some(name),
        )),
    }
}
