//! Property extraction from structured secret values
//!
//! A property is a dotted path into the secret document:
//! - `projects.project1` walks nested objects
//! - `hosts.0` indexes into arrays, `hosts.#` yields the array length
//! - `*` and `?` match any run of characters / any single character of a key,
//!   selecting the first matching key in canonical (sorted) order
//! - `\` escapes the next character, so `tls\.crt` addresses the key `tls.crt`

use crate::error::{Error, Result};
use crate::types::SecretData;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyRun,
    AnyOne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    tokens: Vec<Token>,
}

impl Segment {
    fn is_pattern(&self) -> bool {
        self.tokens.iter().any(|t| !matches!(t, Token::Literal(_)))
    }

    fn literal(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Literal(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn matches(&self, key: &str) -> bool {
        let chars: Vec<char> = key.chars().collect();
        glob_match(&self.tokens, &chars)
    }
}

/// Linear wildcard match; on a mismatch only the most recent `*` is widened
fn glob_match(tokens: &[Token], input: &[char]) -> bool {
    let (mut t, mut i) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;

    while i < input.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                last_star = Some((t, i));
                t += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                i += 1;
            }
            Some(Token::Literal(c)) if *c == input[i] => {
                t += 1;
                i += 1;
            }
            _ => match last_star {
                Some((star_t, star_i)) => {
                    t = star_t + 1;
                    i = star_i + 1;
                    last_star = Some((star_t, star_i + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|tok| *tok == Token::AnyRun)
}

fn parse(property: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut tokens = Vec::new();
    let mut chars = property.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    tokens.push(Token::Literal(escaped));
                }
            }
            '.' => segments.push(Segment {
                tokens: std::mem::take(&mut tokens),
            }),
            '*' => tokens.push(Token::AnyRun),
            '?' => tokens.push(Token::AnyOne),
            other => tokens.push(Token::Literal(other)),
        }
    }
    segments.push(Segment { tokens });
    segments
}

fn step(node: &Value, segment: &Segment) -> Option<Value> {
    match node {
        Value::Object(map) => {
            if segment.is_pattern() {
                map.iter()
                    .find(|(key, _)| segment.matches(key))
                    .map(|(_, v)| v.clone())
            } else {
                map.get(&segment.literal()).cloned()
            }
        }
        Value::Array(items) => {
            let literal = segment.literal();
            if !segment.is_pattern() && literal == "#" {
                return Some(Value::from(items.len()));
            }
            literal
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .cloned()
        }
        _ => None,
    }
}

/// Resolve `property` against `data`, or None when any step is missing
pub fn lookup(data: &SecretData, property: &str) -> Option<Value> {
    let mut node = Value::Object(data.clone());
    for segment in parse(property) {
        node = step(&node, &segment)?;
    }
    Some(node)
}

/// Textual form of a resolved node
///
/// Strings are returned unquoted, `null` as empty text, everything else as
/// compact JSON.
pub fn render(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Object(_) | Value::Array(_) => serde_json::to_string(value)?,
    })
}

/// Extract the bytes a remote reference asks for
///
/// An empty property returns the whole document serialized.
pub fn extract(data: &SecretData, property: &str) -> Result<Vec<u8>> {
    if property.is_empty() {
        return Ok(serde_json::to_vec(data)?);
    }
    let node = lookup(data, property).ok_or_else(|| Error::property_not_found(property))?;
    Ok(render(&node)?.into_bytes())
}
