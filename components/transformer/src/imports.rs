//! Discovery of module specifiers in executable code.

use crate::error::SyntaxError;
use crate::lexer::{tokenize, Token, TokenKind};

/// How a module is referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "x"` or `import "x"`
    Static,
    /// `export ... from "x"`
    ReExport,
    /// `import("x")` with a literal argument
    Dynamic,
}

/// A module specifier found in code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Specifier value with quotes removed
    pub specifier: String,
    /// Byte span of the string literal, quotes included
    pub span: (usize, usize),
    /// Reference kind
    pub kind: ImportKind,
}

/// Find every literal module specifier in `code`, in source order.
///
/// # Examples
///
/// ```
/// use transformer::{scan_imports, ImportKind};
///
/// let refs = scan_imports("import a from './a.js';\nconst b = import('./b.js');").unwrap();
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].specifier, "./a.js");
/// assert_eq!(refs[1].kind, ImportKind::Dynamic);
/// ```
pub fn scan_imports(code: &str) -> Result<Vec<ImportRef>, SyntaxError> {
    let tokens = tokenize(code)?;
    let mut refs = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let after_dot = i > 0 && (tokens[i - 1].is_punct(".") || tokens[i - 1].is_punct("?."));
        if after_dot || token.kind != TokenKind::Ident {
            continue;
        }

        let found = match token.text.as_str() {
            "import" => import_specifier(&tokens, i),
            "export" => reexport_specifier(&tokens, i).map(|k| (k, ImportKind::ReExport)),
            _ => None,
        };
        if let Some((k, kind)) = found {
            refs.push(ImportRef {
                specifier: tokens[k].value.clone(),
                span: (tokens[k].start, tokens[k].end),
                kind,
            });
        }
    }

    Ok(refs)
}

fn is_str(tokens: &[Token], k: usize) -> bool {
    tokens.get(k).is_some_and(|t| t.kind == TokenKind::Str)
}

fn is_punct(tokens: &[Token], k: usize, text: &str) -> bool {
    tokens.get(k).is_some_and(|t| t.is_punct(text))
}

fn is_ident(tokens: &[Token], k: usize, text: &str) -> bool {
    tokens.get(k).is_some_and(|t| t.is_ident(text))
}

fn import_specifier(tokens: &[Token], i: usize) -> Option<(usize, ImportKind)> {
    if is_punct(tokens, i + 1, "(") {
        let literal = is_str(tokens, i + 2)
            && (is_punct(tokens, i + 3, ")") || is_punct(tokens, i + 3, ","));
        return literal.then_some((i + 2, ImportKind::Dynamic));
    }
    if is_punct(tokens, i + 1, ".") {
        return None;
    }
    if is_str(tokens, i + 1) {
        return Some((i + 1, ImportKind::Static));
    }
    find_from(tokens, i + 1).map(|k| (k, ImportKind::Static))
}

fn reexport_specifier(tokens: &[Token], i: usize) -> Option<usize> {
    if is_punct(tokens, i + 1, "*") {
        let mut k = i + 2;
        if is_ident(tokens, k, "as") {
            k += 2;
        }
        return (is_ident(tokens, k, "from") && is_str(tokens, k + 1)).then_some(k + 1);
    }
    if is_punct(tokens, i + 1, "{") {
        let close = closing_brace(tokens, i + 1)?;
        return (is_ident(tokens, close + 1, "from") && is_str(tokens, close + 2))
            .then_some(close + 2);
    }
    None
}

/// Index of the specifier string after `from`, stopping at the statement end
fn find_from(tokens: &[Token], start: usize) -> Option<usize> {
    let mut k = start;
    while k < tokens.len() {
        if is_punct(tokens, k, "{") {
            k = closing_brace(tokens, k)?;
        } else if is_ident(tokens, k, "from") && is_str(tokens, k + 1) {
            return Some(k + 1);
        } else if is_punct(tokens, k, ";") {
            return None;
        }
        k += 1;
    }
    None
}

fn closing_brace(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (k, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct("{") {
            depth += 1;
        } else if token.is_punct("}") {
            depth -= 1;
            if depth == 0 {
                return Some(k);
            }
        }
    }
    None
}
