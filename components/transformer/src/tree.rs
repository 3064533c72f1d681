//! Bracket structure over a token stream.

use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

/// Marker for "no token"
pub(crate) const NONE: usize = usize::MAX;

/// Tokens plus their bracket pairing.
///
/// `pair[i]` links an opening bracket to its closing one and back. Template
/// pieces form a chain: head to first middle, middle to the next, last
/// middle to tail. `parent[i]` is the innermost bracket enclosing token `i`,
/// or [`NONE`] at the top level.
#[derive(Debug)]
pub(crate) struct TokenTree {
    pub tokens: Vec<Token>,
    pub pair: Vec<usize>,
    pub parent: Vec<usize>,
}

impl TokenTree {
    /// Pair every bracket, failing on the first mismatch
    pub fn build(tokens: Vec<Token>) -> Result<Self, SyntaxError> {
        let mut pair = vec![NONE; tokens.len()];
        let mut parent = vec![NONE; tokens.len()];
        let mut stack: Vec<usize> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let top = stack.last().copied().unwrap_or(NONE);
            match bracket_role(token) {
                Role::Open => {
                    parent[i] = top;
                    stack.push(i);
                }
                Role::Close(expected) | Role::Middle(expected) => {
                    let matches = stack
                        .last()
                        .map(|&open| opens(&tokens[open], expected))
                        .unwrap_or(false);
                    if !matches {
                        return Err(SyntaxError::new(
                            format!("Unexpected token '{}'", token.text),
                            token.position(),
                        ));
                    }
                    let open = stack.pop().unwrap_or(NONE);
                    pair[open] = i;
                    pair[i] = open;
                    parent[i] = stack.last().copied().unwrap_or(NONE);
                    if matches!(bracket_role(token), Role::Middle(_)) {
                        stack.push(i);
                    }
                }
                Role::None => parent[i] = top,
            }
        }

        if let Some(&open) = stack.last() {
            return Err(SyntaxError::new(
                format!("'{}' is never closed", tokens[open].text),
                tokens[open].position(),
            ));
        }

        Ok(Self {
            tokens,
            pair,
            parent,
        })
    }
}

enum Role {
    Open,
    /// Closes a bracket of the given opening kind
    Close(&'static str),
    /// Closes a template piece and opens the next
    Middle(&'static str),
    None,
}

fn bracket_role(token: &Token) -> Role {
    match token.kind {
        TokenKind::Punct => match token.text.as_str() {
            "(" | "[" | "{" => Role::Open,
            ")" => Role::Close("("),
            "]" => Role::Close("["),
            "}" => Role::Close("{"),
            _ => Role::None,
        },
        TokenKind::TemplateHead => Role::Open,
        TokenKind::TemplateMiddle => Role::Middle("`"),
        TokenKind::TemplateTail => Role::Close("`"),
        _ => Role::None,
    }
}

fn opens(token: &Token, expected: &str) -> bool {
    match token.kind {
        TokenKind::TemplateHead | TokenKind::TemplateMiddle => expected == "`",
        TokenKind::Punct => token.text == expected,
        _ => false,
    }
}
