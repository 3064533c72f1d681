//! Type-annotation erasure.
//!
//! Works on the token stream instead of a syntax tree: each rule recognizes
//! one annotated construct from local context and erases it in place, leaving
//! all other bytes untouched. Erased characters become spaces and line
//! terminators are kept, so surviving code keeps its line and column.

use crate::error::SyntaxError;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::tree::{TokenTree, NONE};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Parameter and member modifiers with no runtime meaning
const TS_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Member modifiers that survive erasure
const JS_MEMBER_MODIFIERS: &[&str] = &["static", "async", "get", "set", "accessor"];

/// Words that may follow `declare`
const DECLARE_TARGETS: &[&str] = &[
    "const", "let", "var", "function", "class", "enum", "namespace", "module", "global", "type",
    "interface", "abstract", "async",
];

/// Ambient declarations whose body ends the statement
const BLOCK_DECLARATIONS: &[&str] = &[
    "class", "enum", "namespace", "module", "global", "interface", "abstract",
];

/// Reserved words that never end an expression
const KEYWORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "finally", "for", "function", "if",
    "import", "in", "instanceof", "let", "new", "of", "return", "switch", "throw", "try",
    "typeof", "var", "void", "while", "with", "yield",
];

/// Statement keywords followed by a parenthesized head
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Tokens that continue a statement onto the next line
const CONTINUATIONS: &[&str] = &[
    "|", "&", ".", "?.", "=>", "=", ",", "?", ":", "<", ">", "+", "-", "*", "/", "&&", "||", "??",
];

/// Erase type annotations from annotated module source.
///
/// # Errors
/// Returns a [`SyntaxError`] when the source cannot be tokenized, has
/// unbalanced brackets, or uses a construct with runtime semantics that
/// erasure cannot express (namespaces, `import x = ...`, `export = ...`).
///
/// # Examples
///
/// ```
/// use transformer::strip_types;
///
/// let out = strip_types("let n: number = 1;").unwrap();
/// assert_eq!(out.len(), "let n: number = 1;".len());
/// assert_eq!(out.split_whitespace().collect::<Vec<_>>(), ["let", "n", "=", "1;"]);
/// ```
pub fn strip_types(source: &str) -> Result<String, SyntaxError> {
    let tree = TokenTree::build(tokenize(source)?)?;
    let mut stripper = Stripper::new(source, tree);
    stripper.run()?;
    Ok(stripper.finish())
}

/// An import statement's binding clause, kept for unused-binding elision
struct ImportClause {
    /// First token after `import`
    first: usize,
    /// The `from` keyword
    from: usize,
    default: Option<usize>,
    /// `*` token and local name
    namespace: Option<(usize, usize)>,
    /// Value specifiers inside braces, as inclusive token ranges
    named: Vec<(usize, usize)>,
}

/// One comma-separated entry of a bracketed list
struct ListItem {
    start: usize,
    end: usize,
    comma: Option<usize>,
}

struct ClassBody {
    derived: bool,
}

struct Stripper<'a> {
    source: &'a str,
    tree: TokenTree,
    erased: Vec<bool>,
    ranges: Vec<(usize, usize)>,
    inserts: BTreeMap<usize, String>,
    class_bodies: HashMap<usize, ClassBody>,
    handled_parens: HashSet<usize>,
    type_names: HashSet<String>,
    imports: Vec<ImportClause>,
    /// Scope of the variable declaration whose declarators are being read
    pending_declaration: Option<usize>,
}

impl<'a> Stripper<'a> {
    fn new(source: &'a str, tree: TokenTree) -> Self {
        let count = tree.tokens.len();
        Self {
            source,
            tree,
            erased: vec![false; count],
            ranges: Vec::new(),
            inserts: BTreeMap::new(),
            class_bodies: HashMap::new(),
            handled_parens: HashSet::new(),
            type_names: HashSet::new(),
            imports: Vec::new(),
            pending_declaration: None,
        }
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        self.collect_type_names();
        let mut last = NONE;
        let mut i = 0;
        while i < self.len() {
            if self.erased[i] {
                i += 1;
                continue;
            }
            let next = self.visit(i, last)?.max(i + 1);
            last = self.last_kept_before(next);
            i = next;
        }
        self.elide_unused_imports();
        Ok(())
    }

    fn finish(self) -> String {
        let mut erased = vec![false; self.source.len()];
        for &(start, end) in &self.ranges {
            for flag in &mut erased[start..end] {
                *flag = true;
            }
        }

        let mut out = String::with_capacity(self.source.len());
        for (offset, ch) in self.source.char_indices() {
            if let Some(text) = self.inserts.get(&offset) {
                out.push_str(text);
            }
            if erased[offset] && !matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                out.push(' ');
            } else {
                out.push(ch);
            }
        }
        if let Some(text) = self.inserts.get(&self.source.len()) {
            out.push_str(text);
        }
        out
    }

    // ----- dispatch -------------------------------------------------------

    fn visit(&mut self, i: usize, last: usize) -> Result<usize, SyntaxError> {
        if self.is_punct(last, ".") || self.is_punct(last, "?.") {
            return Ok(i + 1);
        }
        if self.is_member_start(i, last) {
            if let Some(next) = self.visit_member(i) {
                return Ok(next);
            }
        }

        let token = &self.tree.tokens[i];
        let text = token.text.clone();
        match token.kind {
            TokenKind::Ident => self.visit_word(i, last, &text),
            TokenKind::Punct => Ok(self.visit_punct(i, last, &text)),
            _ => Ok(i + 1),
        }
    }

    fn visit_word(&mut self, i: usize, last: usize, word: &str) -> Result<usize, SyntaxError> {
        match word {
            "import" => self.visit_import(i),
            "export" => self.visit_export(i),
            "type" if self.is_type_alias(i) => Ok(self.erase_type_alias(i)),
            "interface" if self.is_interface(i) => Ok(self.erase_interface(i)),
            "declare" if self.is_declare(i) => {
                let end = self.declaration_end(i);
                self.erase(i, end);
                Ok(end + 1)
            }
            "enum" if self.is_enum(i) => self.rewrite_enum(i, i),
            "const" if self.is_ident(i + 1, "enum") && self.is_enum(i + 1) => {
                self.rewrite_enum(i, i + 1)
            }
            "namespace" | "module" if self.is_namespace(i, word) => Err(SyntaxError::new(
                "namespace declarations are not supported",
                self.tree.tokens[i].position(),
            )),
            "abstract" if self.is_ident(i + 1, "class") => {
                self.erase(i, i);
                Ok(i + 1)
            }
            "class" => {
                self.visit_class(i);
                Ok(i + 1)
            }
            "function" => {
                self.visit_function(i);
                Ok(i + 1)
            }
            "let" | "const" | "var" => {
                self.visit_declaration(i, word);
                Ok(i + 1)
            }
            "as" | "satisfies"
                if self.is_expression_end(last)
                    && !self.newline_before(i)
                    && self.starts_type(i + 1) =>
            {
                let end = self.skip_type(i + 1);
                self.erase(i, end - 1);
                Ok(end)
            }
            "catch" if self.is_punct(i + 1, "(") => {
                let close = self.tree.pair[i + 1];
                self.handled_parens.insert(i + 1);
                self.process_params(i + 1, close, false);
                Ok(i + 1)
            }
            _ => Ok(i + 1),
        }
    }

    fn visit_punct(&mut self, i: usize, last: usize, punct: &str) -> usize {
        match punct {
            "(" => self.visit_paren(i, last),
            "<" => return self.visit_angle(i, last),
            "!" if self.is_non_null(i, last) => self.erase(i, i),
            "," if self.pending_declaration == Some(self.tree.parent[i]) => {
                self.strip_binding(i + 1)
            }
            ";" if self.pending_declaration == Some(self.tree.parent[i]) => {
                self.pending_declaration = None
            }
            ")" | "]" | "}" if self.pending_declaration == Some(self.tree.pair[i]) => {
                self.pending_declaration = None
            }
            _ => {}
        }
        i + 1
    }

    // ----- declarations ---------------------------------------------------

    fn collect_type_names(&mut self) {
        for i in 0..self.len() {
            if i > 0 && self.is_punct(i - 1, ".") {
                continue;
            }
            let declares_type = (self.is_ident(i, "type") && self.is_type_alias(i))
                || (self.is_ident(i, "interface") && self.is_interface(i));
            if declares_type {
                let name = self.tree.tokens[i + 1].text.clone();
                self.type_names.insert(name);
            }
        }
    }

    fn is_type_alias(&self, i: usize) -> bool {
        self.kind_is(i + 1, TokenKind::Ident)
            && !self.newline_before(i + 1)
            && (self.is_punct(i + 2, "=") || self.is_punct(i + 2, "<"))
    }

    fn erase_type_alias(&mut self, i: usize) -> usize {
        let mut j = i + 2;
        if self.is_punct(j, "<") {
            if let Some(close) = self.match_angle(j) {
                j = close + 1;
            }
        }
        if !self.is_punct(j, "=") {
            return i + 1;
        }
        let end = self.skip_type(j + 1);
        let end = if self.is_punct(end, ";") { end } else { end - 1 };
        self.erase(i, end);
        end + 1
    }

    fn is_interface(&self, i: usize) -> bool {
        self.kind_is(i + 1, TokenKind::Ident)
            && !self.newline_before(i + 1)
            && (self.is_punct(i + 2, "{")
                || self.is_punct(i + 2, "<")
                || self.is_ident(i + 2, "extends"))
    }

    fn erase_interface(&mut self, i: usize) -> usize {
        let scope = self.tree.parent[i];
        let mut j = i + 2;
        while j < self.len() {
            if self.is_punct(j, "{") && self.tree.parent[j] == scope {
                break;
            }
            if self.is_punct(j, "<") {
                if let Some(close) = self.match_angle(j) {
                    j = close + 1;
                    continue;
                }
            }
            if self.is_open(j) {
                j = self.group_end(j);
            }
            j += 1;
        }
        let end = if j < self.len() {
            self.tree.pair[j]
        } else {
            self.len() - 1
        };
        self.erase(i, end);
        end + 1
    }

    fn is_declare(&self, i: usize) -> bool {
        !self.newline_before(i + 1)
            && self
                .text(i + 1)
                .is_some_and(|word| DECLARE_TARGETS.contains(&word))
            && self.kind_is(i + 1, TokenKind::Ident)
    }

    /// Last token of an ambient declaration starting at `start`
    fn declaration_end(&self, start: usize) -> usize {
        let block = self
            .text(start + 1)
            .is_some_and(|word| BLOCK_DECLARATIONS.contains(&word));
        let scope = self.tree.parent[start];
        let mut k = start + 1;
        while k < self.len() {
            if self.is_punct(k, ";") && self.tree.parent[k] == scope {
                return k;
            }
            if self.is_punct(k, "{") && block {
                return self.tree.pair[k];
            }
            if self.is_open(k) {
                k = self.group_end(k);
            } else if self.is_punct(k, "<") {
                if let Some(close) = self.match_angle(k) {
                    k = close;
                }
            }
            if self.ends_line_statement(k) {
                return k;
            }
            k += 1;
        }
        self.len() - 1
    }

    fn ends_line_statement(&self, k: usize) -> bool {
        let Some(next) = self.token(k + 1) else {
            return true;
        };
        if !next.newline_before {
            return false;
        }
        let token = &self.tree.tokens[k];
        let ends = match token.kind {
            TokenKind::Ident
            | TokenKind::Str
            | TokenKind::Number
            | TokenKind::Template
            | TokenKind::TemplateTail => true,
            TokenKind::Punct => matches!(token.text.as_str(), ")" | "]" | "}" | ">" | ">>" | ">>>"),
            _ => false,
        };
        ends && !(next.kind == TokenKind::Punct && CONTINUATIONS.contains(&next.text.as_str()))
    }

    fn is_namespace(&self, i: usize, word: &str) -> bool {
        let named = self.kind_is(i + 1, TokenKind::Ident)
            || (word == "module" && self.kind_is(i + 1, TokenKind::Str));
        named
            && !self.newline_before(i + 1)
            && (self.is_punct(i + 2, "{") || self.is_punct(i + 2, "."))
    }

    fn is_enum(&self, i: usize) -> bool {
        self.kind_is(i + 1, TokenKind::Ident) && self.is_punct(i + 2, "{")
    }

    /// Replace an enum declaration with an object carrying a reverse mapping
    fn rewrite_enum(&mut self, start: usize, keyword: usize) -> Result<usize, SyntaxError> {
        let name = self.tree.tokens[keyword + 1].text.clone();
        let open = keyword + 2;
        let close = self.tree.pair[open];
        let mut code = format!("var {name} = (function ({name}) {{");
        let mut next_value = Some("0".to_string());

        for item in self.split_list(open) {
            let member = &self.tree.tokens[item.start];
            let key = match member.kind {
                TokenKind::Str => quote_js(&member.value),
                TokenKind::Ident => quote_js(&member.text),
                _ => {
                    return Err(SyntaxError::new(
                        "Enum member name must be an identifier or string",
                        member.position(),
                    ))
                }
            };

            if self.is_punct(item.start + 1, "=") {
                let (first, last) = (item.start + 2, item.end);
                let expression = self.slice(first, last).to_string();
                let string_valued = first == last
                    && matches!(
                        self.tree.tokens[first].kind,
                        TokenKind::Str | TokenKind::Template
                    );
                if string_valued {
                    code.push_str(&format!(" {name}[{key}] = {expression};"));
                    next_value = None;
                } else {
                    code.push_str(&format!(" {name}[{name}[{key}] = {expression}] = {key};"));
                    next_value = Some(
                        self.integer_literal(first, last)
                            .map(|value| (value + 1).to_string())
                            .unwrap_or_else(|| format!("{name}[{key}] + 1")),
                    );
                }
            } else {
                let Some(value) = next_value.take() else {
                    return Err(SyntaxError::new(
                        "Enum member must have initializer",
                        member.position(),
                    ));
                };
                code.push_str(&format!(" {name}[{name}[{key}] = {value}] = {key};"));
                next_value = Some(match value.parse::<i64>() {
                    Ok(number) => (number + 1).to_string(),
                    Err(_) => format!("{name}[{key}] + 1"),
                });
            }
        }

        code.push_str(&format!(" return {name}; }})({{}});"));
        self.erase(start, close);
        let at = self.tree.tokens[start].start;
        self.insert(at, &code);
        Ok(close + 1)
    }

    fn integer_literal(&self, first: usize, last: usize) -> Option<i64> {
        let (negative, digits) = if first + 1 == last && self.is_punct(first, "-") {
            (true, last)
        } else if first == last {
            (false, first)
        } else {
            return None;
        };
        let token = self.token(digits)?;
        if token.kind != TokenKind::Number {
            return None;
        }
        let text = token.text.replace('_', "");
        let value = match text.get(..2) {
            Some("0x") | Some("0X") => i64::from_str_radix(&text[2..], 16).ok()?,
            Some("0o") | Some("0O") => i64::from_str_radix(&text[2..], 8).ok()?,
            Some("0b") | Some("0B") => i64::from_str_radix(&text[2..], 2).ok()?,
            _ => text.parse().ok()?,
        };
        Some(if negative { -value } else { value })
    }

    fn visit_declaration(&mut self, i: usize, word: &str) {
        let binding_follows = self.kind_is(i + 1, TokenKind::Ident)
            || self.is_punct(i + 1, "[")
            || self.is_punct(i + 1, "{");
        if word == "let" && !binding_follows {
            return;
        }
        self.strip_binding(i + 1);
        self.pending_declaration = Some(self.tree.parent[i]);
    }

    /// Erase `!` and `: T` after a declared binding
    fn strip_binding(&mut self, start: usize) {
        let mut k = start;
        if self.kind_is(k, TokenKind::Ident) {
            k += 1;
        } else if self.is_punct(k, "[") || self.is_punct(k, "{") {
            k = self.tree.pair[k] + 1;
        } else {
            return;
        }
        if self.is_punct(k, "!") {
            self.erase(k, k);
            k += 1;
        }
        if self.is_punct(k, ":") {
            let end = self.skip_type(k + 1);
            self.erase(k, end - 1);
        }
    }

    // ----- functions and classes -----------------------------------------

    fn visit_function(&mut self, i: usize) {
        let mut j = i + 1;
        if self.is_punct(j, "*") {
            j += 1;
        }
        if self.kind_is(j, TokenKind::Ident) {
            j += 1;
        }
        if self.is_punct(j, "<") {
            if let Some(close) = self.match_angle(j) {
                self.erase(j, close);
                j = close + 1;
            }
        }
        if !self.is_punct(j, "(") {
            return;
        }

        let close = self.tree.pair[j];
        self.handled_parens.insert(j);
        self.process_params(j, close, false);
        let mut k = close + 1;
        if self.is_punct(k, ":") {
            let end = self.skip_type(k + 1);
            self.erase(k, end - 1);
            k = end;
        }

        if !self.is_punct(k, "{") {
            // Overload signature
            let mut start = i;
            loop {
                let before = self.last_kept_before(start);
                let prefix = ["async", "default", "export"]
                    .iter()
                    .any(|word| self.is_ident(before, word));
                if !prefix {
                    break;
                }
                start = before;
            }
            let end = if self.is_punct(k, ";") { k } else { k - 1 };
            self.erase(start, end);
        }
    }

    fn visit_class(&mut self, i: usize) {
        let scope = self.tree.parent[i];
        let mut j = i + 1;
        if self.kind_is(j, TokenKind::Ident)
            && !self.is_ident(j, "extends")
            && !self.is_ident(j, "implements")
        {
            j += 1;
        }
        if self.is_punct(j, "<") {
            if let Some(close) = self.match_angle(j) {
                self.erase(j, close);
                j = close + 1;
            }
        }

        let mut derived = false;
        if self.is_ident(j, "extends") {
            derived = true;
            j += 1;
            while j < self.len() {
                let at_heading = self.tree.parent[j] == scope;
                if at_heading && (self.is_punct(j, "{") || self.is_ident(j, "implements")) {
                    break;
                }
                if self.is_punct(j, "<") {
                    if let Some(close) = self.match_angle(j) {
                        if self.is_punct(close + 1, "{") || self.is_ident(close + 1, "implements") {
                            self.erase(j, close);
                            j = close + 1;
                            continue;
                        }
                    }
                }
                if self.is_open(j) {
                    j = self.group_end(j);
                }
                j += 1;
            }
        }

        if self.is_ident(j, "implements") {
            let mut k = j;
            while k < self.len() && !(self.is_punct(k, "{") && self.tree.parent[k] == scope) {
                if self.is_open(k) {
                    k = self.group_end(k);
                }
                k += 1;
            }
            self.erase(j, k - 1);
            j = k;
        }

        if self.is_punct(j, "{") {
            self.class_bodies.insert(j, ClassBody { derived });
        }
    }

    fn is_member_start(&self, i: usize, last: usize) -> bool {
        let body = self.tree.parent[i];
        if body == NONE || !self.class_bodies.contains_key(&body) || !self.is_name_start(i) {
            return false;
        }
        last == body
            || self.is_punct(last, ";")
            || (self.is_punct(last, "}") && self.tree.parent[last] == body)
            || (self.newline_before(i) && self.is_expression_end(last))
    }

    fn is_name_start(&self, i: usize) -> bool {
        match self.token(i) {
            Some(token) => match token.kind {
                TokenKind::Ident | TokenKind::Str | TokenKind::Number | TokenKind::PrivateName => {
                    true
                }
                TokenKind::Punct => token.text == "[" || token.text == "*",
                _ => false,
            },
            None => false,
        }
    }

    /// Strip one class member heading; returns where to resume
    fn visit_member(&mut self, start: usize) -> Option<usize> {
        let body = self.tree.parent[start];
        let mut j = start;
        let mut dropped = false;

        loop {
            let is_modifier = self.kind_is(j, TokenKind::Ident)
                && self.text(j).is_some_and(|word| {
                    TS_MODIFIERS.contains(&word)
                        || JS_MEMBER_MODIFIERS.contains(&word)
                        || word == "declare"
                        || word == "abstract"
                })
                && self.is_name_start(j + 1);
            if is_modifier {
                let word = self.text(j).unwrap_or_default();
                if word == "declare" || word == "abstract" {
                    dropped = true;
                    self.erase(j, j);
                } else if TS_MODIFIERS.contains(&word) {
                    self.erase(j, j);
                }
                j += 1;
            } else if self.is_punct(j, "*") {
                j += 1;
            } else {
                break;
            }
        }

        // Index signature
        if self.is_punct(j, "[")
            && self.kind_is(j + 1, TokenKind::Ident)
            && self.is_punct(j + 2, ":")
        {
            let mut k = self.tree.pair[j] + 1;
            if self.is_punct(k, ":") {
                k = self.skip_type(k + 1);
            }
            let end = if self.is_punct(k, ";") { k } else { k - 1 };
            self.erase(start, end);
            return Some(end + 1);
        }

        let is_constructor = self.is_ident(j, "constructor");
        if self.is_punct(j, "[") {
            j = self.tree.pair[j] + 1;
        } else if self.is_name_start(j) {
            j += 1;
        } else {
            return None;
        }

        if self.is_punct(j, "?") || self.is_punct(j, "!") {
            self.erase(j, j);
            j += 1;
        }
        if self.is_punct(j, "<") {
            if let Some(close) = self.match_angle(j) {
                self.erase(j, close);
                j = close + 1;
            }
        }

        if self.is_punct(j, "(") {
            let close = self.tree.pair[j];
            self.handled_parens.insert(j);
            let properties = self.process_params(j, close, is_constructor);
            let mut k = close + 1;
            if self.is_punct(k, ":") {
                let end = self.skip_type(k + 1);
                self.erase(k, end - 1);
                k = end;
            }
            if !self.is_punct(k, "{") {
                // Overload or abstract signature
                let end = if self.is_punct(k, ";") { k } else { k - 1 };
                self.erase(start, end);
                return Some(end + 1);
            }
            if dropped {
                let end = self.tree.pair[k];
                self.erase(start, end);
                return Some(end + 1);
            }
            if !properties.is_empty() {
                self.insert_parameter_properties(k, body, &properties);
            }
            return Some(j);
        }

        if self.is_punct(j, ":") {
            let end = self.skip_type(j + 1);
            self.erase(j, end - 1);
            j = end;
        }
        if dropped {
            let end = if self.is_punct(j, ";") { j } else { j - 1 };
            self.erase(start, end);
            return Some(end + 1);
        }
        Some(j)
    }

    fn insert_parameter_properties(&mut self, body_open: usize, class_body: usize, names: &[String]) {
        let assignments: String = names
            .iter()
            .map(|name| format!(" this.{name} = {name};"))
            .collect();
        let derived = self
            .class_bodies
            .get(&class_body)
            .is_some_and(|class| class.derived);

        let mut at = self.tree.tokens[body_open].end;
        let mut text = assignments;
        if derived {
            if let Some(call_end) = self.find_super_call(body_open) {
                if self.is_punct(call_end + 1, ";") {
                    at = self.tree.tokens[call_end + 1].end;
                } else {
                    at = self.tree.tokens[call_end].end;
                    text = format!(";{text}");
                }
            }
        }
        self.insert(at, &text);
    }

    fn find_super_call(&self, body_open: usize) -> Option<usize> {
        let close = self.tree.pair[body_open];
        (body_open + 1..close)
            .find(|&k| {
                self.tree.parent[k] == body_open
                    && self.is_ident(k, "super")
                    && self.is_punct(k + 1, "(")
            })
            .map(|k| self.tree.pair[k + 1])
    }

    /// Strip a parameter list; returns constructor parameter-property names
    fn process_params(&mut self, open: usize, close: usize, constructor: bool) -> Vec<String> {
        let mut properties = Vec::new();
        let mut start = open + 1;
        while start < close {
            let mut end = start;
            while end < close && !(self.is_punct(end, ",") && self.tree.parent[end] == open) {
                end += 1;
            }
            if let Some(name) = self.strip_param(start, end, close) {
                if constructor {
                    properties.push(name);
                }
            }
            start = end + 1;
        }
        properties
    }

    /// Strip one parameter spanning `start..end`; returns its name when it
    /// carried a parameter-property modifier
    fn strip_param(&mut self, start: usize, end: usize, close: usize) -> Option<String> {
        let mut k = start;
        let mut is_property = false;
        while k + 1 < end
            && self.kind_is(k, TokenKind::Ident)
            && self.text(k).is_some_and(|word| TS_MODIFIERS.contains(&word))
            && (self.kind_is(k + 1, TokenKind::Ident)
                || self.is_punct(k + 1, "{")
                || self.is_punct(k + 1, "["))
        {
            self.erase(k, k);
            is_property = true;
            k += 1;
        }

        if self.is_ident(k, "this") && (k + 1 == end || self.is_punct(k + 1, ":")) {
            let last = if end < close { end } else { end - 1 };
            self.erase(start, last);
            return None;
        }

        if self.is_punct(k, "...") {
            k += 1;
        }
        let name = if self.kind_is(k, TokenKind::Ident) {
            let name = self.tree.tokens[k].text.clone();
            k += 1;
            Some(name)
        } else if self.is_punct(k, "{") || self.is_punct(k, "[") {
            k = self.tree.pair[k] + 1;
            None
        } else {
            None
        };

        if k < end && self.is_punct(k, "?") {
            self.erase(k, k);
            k += 1;
        }
        if k < end && self.is_punct(k, ":") {
            let type_end = self.skip_type(k + 1).min(end);
            self.erase(k, type_end - 1);
        }

        if is_property {
            name
        } else {
            None
        }
    }

    // ----- expressions ----------------------------------------------------

    fn visit_paren(&mut self, i: usize, last: usize) {
        if !self.handled_parens.insert(i) {
            return;
        }
        let close = self.tree.pair[i];
        let after = close + 1;
        let return_end = if self.is_punct(after, ":") {
            Some(self.skip_type(after + 1))
        } else {
            None
        };

        let is_arrow = self.is_punct(after, "=>")
            || return_end.is_some_and(|t| self.is_punct(t, "=>") && !self.newline_before(t));
        let is_method = self.is_method_name(last)
            && ((self.is_punct(after, "{") && !self.newline_before(after))
                || return_end.is_some_and(|t| self.is_punct(t, "{")));
        if !is_arrow && !is_method {
            return;
        }

        self.process_params(i, close, false);
        if let Some(end) = return_end {
            self.erase(after, end - 1);
        }
    }

    fn visit_angle(&mut self, i: usize, last: usize) -> usize {
        let Some(close) = self.match_angle(i) else {
            return i + 1;
        };
        let follows = close + 1;

        let after_callee = last != NONE
            && !self.newline_before(i)
            && match self.tree.tokens[last].kind {
                TokenKind::Ident => !self.is_keyword(last),
                TokenKind::Punct => {
                    self.is_punct(last, ")") || self.is_punct(last, "]")
                }
                _ => false,
            };

        let erase = if after_callee {
            self.is_punct(follows, "(")
                || self.kind_is(follows, TokenKind::Template)
                || self.kind_is(follows, TokenKind::TemplateHead)
        } else if self.is_punct(follows, "(") && self.is_arrow_params(follows) {
            true
        } else {
            // `<T>expr` assertion: `<` cannot start an operand in plain code
            self.is_operand_position(last) && self.starts_operand(follows)
        };

        if erase {
            self.erase(i, close);
            close + 1
        } else {
            i + 1
        }
    }

    fn is_operand_position(&self, last: usize) -> bool {
        !self.is_expression_end(last) && !self.is_punct(last, "++") && !self.is_punct(last, "--")
    }

    fn starts_operand(&self, k: usize) -> bool {
        match self.token(k) {
            Some(token) => match token.kind {
                TokenKind::Punct => matches!(
                    token.text.as_str(),
                    "(" | "[" | "{" | "!" | "~" | "+" | "-" | "++" | "--" | "<"
                ),
                TokenKind::TemplateMiddle | TokenKind::TemplateTail => false,
                _ => true,
            },
            None => false,
        }
    }

    fn is_arrow_params(&self, open: usize) -> bool {
        let close = self.tree.pair[open];
        self.is_punct(close + 1, "=>")
            || (self.is_punct(close + 1, ":") && self.is_punct(self.skip_type(close + 2), "=>"))
    }

    fn is_non_null(&self, i: usize, last: usize) -> bool {
        if last == NONE || self.newline_before(i) {
            return false;
        }
        let token = &self.tree.tokens[last];
        match token.kind {
            TokenKind::Ident => !self.is_keyword(last),
            TokenKind::Punct if token.text == "]" => true,
            TokenKind::Punct if token.text == ")" => {
                let before = self.last_kept_before(self.tree.pair[last]);
                !self
                    .text(before)
                    .is_some_and(|word| CONTROL_KEYWORDS.contains(&word))
            }
            _ => false,
        }
    }

    fn is_method_name(&self, last: usize) -> bool {
        match self.token(last) {
            Some(token) => match token.kind {
                TokenKind::Ident => !self.is_keyword(last),
                TokenKind::Str | TokenKind::Number | TokenKind::PrivateName => true,
                TokenKind::Punct => token.text == "]",
                _ => false,
            },
            None => false,
        }
    }

    // ----- modules --------------------------------------------------------

    fn visit_import(&mut self, i: usize) -> Result<usize, SyntaxError> {
        let first = i + 1;
        if self.is_punct(first, "(")
            || self.is_punct(first, ".")
            || self.kind_is(first, TokenKind::Str)
        {
            return Ok(first);
        }

        if self.is_type_only_import(first) {
            let end = match self.find_from(first) {
                Some(from) => self.import_end(from),
                None => self.declaration_end(i),
            };
            self.erase(i, end);
            return Ok(end + 1);
        }

        if self.kind_is(first, TokenKind::Ident) && self.is_punct(first + 1, "=") {
            return Err(SyntaxError::new(
                "import alias declarations are not supported",
                self.tree.tokens[i].position(),
            ));
        }

        let Some(from) = self.find_from(first) else {
            return Ok(first);
        };
        if is_declaration_file(&self.tree.tokens[from + 1].value) {
            // Only types can come out of a declaration file
            self.erase(first, from);
            return Ok(from + 2);
        }

        let mut clause = ImportClause {
            first,
            from,
            default: None,
            namespace: None,
            named: Vec::new(),
        };
        let mut k = first;
        while k < from {
            if k == first && self.kind_is(k, TokenKind::Ident) {
                clause.default = Some(k);
            } else if self.is_punct(k, "*") {
                clause.namespace = Some((k, k + 2));
                k += 2;
            } else if self.is_punct(k, "{") {
                for item in self.split_list(k) {
                    if self.is_type_specifier(&item) {
                        self.erase(item.start, item.comma.unwrap_or(item.end));
                    } else {
                        clause.named.push((item.start, item.end));
                    }
                }
                k = self.tree.pair[k];
            }
            k += 1;
        }
        self.imports.push(clause);
        Ok(from + 2)
    }

    fn is_type_only_import(&self, first: usize) -> bool {
        if !self.is_ident(first, "type") {
            return false;
        }
        self.is_punct(first + 1, "{")
            || self.is_punct(first + 1, "*")
            || (self.kind_is(first + 1, TokenKind::Ident)
                && !(self.is_ident(first + 1, "from") && self.kind_is(first + 2, TokenKind::Str)))
    }

    fn is_type_specifier(&self, item: &ListItem) -> bool {
        if !self.is_ident(item.start, "type") || item.end == item.start {
            return false;
        }
        // `type as alias` imports a binding literally named `type`
        !(item.end == item.start + 2 && self.is_ident(item.start + 1, "as"))
    }

    /// Index of `from` in an import or export clause
    fn find_from(&self, first: usize) -> Option<usize> {
        let mut k = first;
        while k < self.len() {
            if self.is_punct(k, "{") {
                k = self.tree.pair[k];
            } else if self.is_ident(k, "from") && self.kind_is(k + 1, TokenKind::Str) {
                return Some(k);
            } else if self.is_punct(k, ";") {
                return None;
            }
            k += 1;
        }
        None
    }

    /// Last token of a statement whose module specifier follows `from`
    fn import_end(&self, from: usize) -> usize {
        let mut end = from + 1;
        let has_attributes = (self.is_ident(end + 1, "with") || self.is_ident(end + 1, "assert"))
            && self.is_punct(end + 2, "{")
            && !self.newline_before(end + 1);
        if has_attributes {
            end = self.tree.pair[end + 2];
        }
        if self.is_punct(end + 1, ";") {
            end + 1
        } else {
            end
        }
    }

    fn visit_export(&mut self, i: usize) -> Result<usize, SyntaxError> {
        let next = i + 1;

        if self.is_ident(next, "type") && self.is_punct(next + 1, "{") {
            let close = self.tree.pair[next + 1];
            let end = if self.is_ident(close + 1, "from") {
                self.import_end(close + 1)
            } else if self.is_punct(close + 1, ";") {
                close + 1
            } else {
                close
            };
            self.erase(i, end);
            return Ok(end + 1);
        }
        if self.is_ident(next, "type") && self.is_punct(next + 1, "*") {
            let end = match self.find_from(next) {
                Some(from) => self.import_end(from),
                None => self.declaration_end(i),
            };
            self.erase(i, end);
            return Ok(end + 1);
        }
        if self.is_punct(next, "=") {
            return Err(SyntaxError::new(
                "export assignments are not supported",
                self.tree.tokens[i].position(),
            ));
        }
        if self.is_ident(next, "import") && self.kind_is(next + 1, TokenKind::Ident) {
            return Err(SyntaxError::new(
                "import alias declarations are not supported",
                self.tree.tokens[i].position(),
            ));
        }
        if self.is_ident(next, "as") && self.is_ident(next + 1, "namespace") {
            let end = if self.is_punct(next + 3, ";") {
                next + 3
            } else {
                next + 2
            };
            self.erase(i, end);
            return Ok(end + 1);
        }

        let declares_type = (self.is_ident(next, "declare") && self.is_declare(next))
            || (self.is_ident(next, "interface") && self.is_interface(next))
            || (self.is_ident(next, "type") && self.is_type_alias(next));
        if declares_type {
            self.erase(i, i);
            return Ok(next);
        }
        if self.is_ident(next, "default")
            && self.is_ident(next + 1, "interface")
            && self.is_interface(next + 1)
        {
            self.erase(i, next);
            return Ok(next + 1);
        }

        if self.is_punct(next, "{") {
            let close = self.tree.pair[next];
            let reexport = self.is_ident(close + 1, "from");
            for item in self.split_list(next) {
                let local_type = !reexport
                    && self
                        .text(item.start)
                        .is_some_and(|name| self.type_names.contains(name));
                if self.is_type_specifier(&item) || local_type {
                    self.erase(item.start, item.comma.unwrap_or(item.end));
                }
            }
            return Ok(if reexport { close + 3 } else { close + 1 });
        }

        Ok(next)
    }

    /// Drop import bindings that are only referenced from erased type positions
    fn elide_unused_imports(&mut self) {
        let imports = std::mem::take(&mut self.imports);
        let mut in_clause = vec![false; self.len()];
        for clause in &imports {
            for flag in &mut in_clause[clause.first..=clause.from] {
                *flag = true;
            }
        }
        let used: HashSet<&str> = self
            .tree
            .tokens
            .iter()
            .enumerate()
            .filter(|(k, token)| {
                token.kind == TokenKind::Ident && !self.erased[*k] && !in_clause[*k]
            })
            .map(|(_, token)| token.text.as_str())
            .collect();

        let mut rewrites = Vec::new();
        for clause in &imports {
            let is_used = |k: usize| used.contains(self.tree.tokens[k].text.as_str());
            let default = clause.default.filter(|&k| is_used(k));
            let namespace = clause.namespace.filter(|&(_, local)| is_used(local));
            let named: Vec<(usize, usize)> = clause
                .named
                .iter()
                .copied()
                .filter(|&(_, local)| is_used(local))
                .collect();
            if default == clause.default
                && namespace == clause.namespace
                && named.len() == clause.named.len()
            {
                continue;
            }

            let mut parts = Vec::new();
            if let Some(k) = default {
                parts.push(self.tree.tokens[k].text.clone());
            }
            if let Some((star, local)) = namespace {
                parts.push(self.slice(star, local).to_string());
            }
            if !named.is_empty() {
                let specifiers: Vec<&str> = named
                    .iter()
                    .map(|&(start, end)| self.slice(start, end))
                    .collect();
                parts.push(format!("{{ {} }}", specifiers.join(", ")));
            }
            let text = if parts.is_empty() {
                String::new()
            } else {
                format!("{} from ", parts.join(", "))
            };
            rewrites.push((clause.first, clause.from, text));
        }

        for (first, from, text) in rewrites {
            self.erase(first, from);
            if !text.is_empty() {
                let at = self.tree.tokens[first].start;
                self.insert(at, &text);
            }
        }
    }

    // ----- types ----------------------------------------------------------

    fn starts_type(&self, k: usize) -> bool {
        match self.token(k) {
            Some(token) => match token.kind {
                TokenKind::Ident
                | TokenKind::Str
                | TokenKind::Number
                | TokenKind::Template
                | TokenKind::TemplateHead => true,
                TokenKind::Punct => {
                    matches!(token.text.as_str(), "{" | "[" | "(" | "<" | "-" | "|" | "&")
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Index of the first token after the type starting at `start`
    fn skip_type(&self, start: usize) -> usize {
        let mut k = start;
        if self.is_punct(k, "|") || self.is_punct(k, "&") {
            k += 1;
        }
        k = self.skip_type_operand(k);
        loop {
            if self.is_punct(k, "|") || self.is_punct(k, "&") {
                k = self.skip_type_operand(k + 1);
            } else if self.is_ident(k, "extends") && !self.newline_before(k) {
                let check = self.skip_type_operand(k + 1);
                if !self.is_punct(check, "?") {
                    return k;
                }
                let when_true = self.skip_type(check + 1);
                if !self.is_punct(when_true, ":") {
                    return k;
                }
                k = self.skip_type(when_true + 1);
            } else {
                return k;
            }
        }
    }

    fn skip_type_operand(&self, start: usize) -> usize {
        let mut k = start;
        while self
            .text(k)
            .is_some_and(|word| matches!(word, "keyof" | "unique" | "readonly" | "infer"))
            && self.kind_is(k, TokenKind::Ident)
            && self.starts_type(k + 1)
            && !self.newline_before(k + 1)
        {
            k += 1;
        }
        if self.is_ident(k, "abstract") && self.is_ident(k + 1, "new") {
            k += 1;
        }
        if self.is_ident(k, "new") && (self.is_punct(k + 1, "(") || self.is_punct(k + 1, "<")) {
            k += 1;
        }

        let Some(token) = self.token(k) else {
            return k;
        };
        let mut k = match token.kind {
            TokenKind::Punct => match token.text.as_str() {
                "(" => {
                    let after = self.tree.pair[k] + 1;
                    if self.is_punct(after, "=>") {
                        return self.skip_type(after + 1);
                    }
                    after
                }
                "<" => match self.match_angle(k) {
                    Some(close) if self.is_punct(close + 1, "(") => {
                        let after = self.tree.pair[close + 1] + 1;
                        if self.is_punct(after, "=>") {
                            return self.skip_type(after + 1);
                        }
                        after
                    }
                    _ => return k,
                },
                "{" | "[" => self.tree.pair[k] + 1,
                "-" if self.kind_is(k + 1, TokenKind::Number) => k + 2,
                _ => return k,
            },
            TokenKind::TemplateHead => self.group_end(k) + 1,
            TokenKind::Str | TokenKind::Number | TokenKind::Template => k + 1,
            TokenKind::Ident => match token.text.as_str() {
                "typeof" if self.kind_is(k + 1, TokenKind::Ident) => {
                    self.skip_entity_tail(k + 2)
                }
                "import" if self.is_punct(k + 1, "(") => {
                    self.skip_entity_tail(self.tree.pair[k + 1] + 1)
                }
                "asserts"
                    if self.kind_is(k + 1, TokenKind::Ident) && !self.newline_before(k + 1) =>
                {
                    if self.is_ident(k + 2, "is") {
                        return self.skip_type(k + 3);
                    }
                    k + 2
                }
                _ => {
                    let end = self.skip_entity_tail(k + 1);
                    if self.is_ident(end, "is") && !self.newline_before(end) {
                        return self.skip_type(end + 1);
                    }
                    end
                }
            },
            _ => return k,
        };

        // Array and indexed-access postfixes
        while self.is_punct(k, "[") && !self.newline_before(k) {
            k = self.tree.pair[k] + 1;
        }
        k
    }

    /// Skip `.Name` qualifications and type arguments after an entity name
    fn skip_entity_tail(&self, start: usize) -> usize {
        let mut k = start;
        while self.is_punct(k, ".")
            && (self.kind_is(k + 1, TokenKind::Ident) || self.kind_is(k + 1, TokenKind::PrivateName))
        {
            k += 2;
        }
        if self.is_punct(k, "<") && !self.newline_before(k) {
            if let Some(close) = self.match_angle(k) {
                k = close + 1;
            }
        }
        k
    }

    /// Closing token of an angle-bracketed type list, if `open` starts one
    fn match_angle(&self, open: usize) -> Option<usize> {
        let mut depth: i32 = 0;
        let mut k = open;
        while let Some(token) = self.token(k) {
            match token.kind {
                TokenKind::Punct => match token.text.as_str() {
                    "<" => depth += 1,
                    ">" => depth -= 1,
                    ">>" => depth -= 2,
                    ">>>" => depth -= 3,
                    "(" | "[" | "{" => k = self.tree.pair[k],
                    "," | "." | "|" | "&" | "?" | ":" | "=>" | "=" | "..." | "-" => {}
                    _ => return None,
                },
                TokenKind::TemplateHead => k = self.group_end(k),
                TokenKind::TemplateMiddle
                | TokenKind::TemplateTail
                | TokenKind::RegExp
                | TokenKind::PrivateName => return None,
                _ => {}
            }
            if depth == 0 {
                return Some(k);
            }
            if depth < 0 {
                return None;
            }
            k += 1;
        }
        None
    }

    // ----- helpers --------------------------------------------------------

    fn split_list(&self, open: usize) -> Vec<ListItem> {
        let close = self.tree.pair[open];
        let mut items = Vec::new();
        let mut start = open + 1;
        while start < close {
            let mut end = start;
            while end < close && !(self.is_punct(end, ",") && self.tree.parent[end] == open) {
                end += 1;
            }
            if end > start {
                items.push(ListItem {
                    start,
                    end: end - 1,
                    comma: (end < close).then_some(end),
                });
            }
            start = end + 1;
        }
        items
    }

    fn erase(&mut self, first: usize, last: usize) {
        if first > last || last >= self.len() {
            return;
        }
        for flag in &mut self.erased[first..=last] {
            *flag = true;
        }
        self.ranges
            .push((self.tree.tokens[first].start, self.tree.tokens[last].end));
    }

    fn insert(&mut self, at: usize, text: &str) {
        self.inserts.entry(at).or_default().push_str(text);
    }

    fn last_kept_before(&self, index: usize) -> usize {
        (0..index.min(self.len()))
            .rev()
            .find(|&k| !self.erased[k])
            .unwrap_or(NONE)
    }

    fn group_end(&self, open: usize) -> usize {
        let mut k = open;
        if self.kind_is(k, TokenKind::TemplateHead) {
            while !self.kind_is(k, TokenKind::TemplateTail) {
                k = self.tree.pair[k];
            }
            return k;
        }
        self.tree.pair[k]
    }

    fn is_open(&self, k: usize) -> bool {
        self.is_punct(k, "(")
            || self.is_punct(k, "[")
            || self.is_punct(k, "{")
            || self.kind_is(k, TokenKind::TemplateHead)
    }

    fn is_expression_end(&self, k: usize) -> bool {
        match self.token(k) {
            Some(token) => match token.kind {
                TokenKind::Ident => !self.is_keyword(k),
                TokenKind::Punct => matches!(token.text.as_str(), ")" | "]" | "}"),
                _ => true,
            },
            None => false,
        }
    }

    fn is_keyword(&self, k: usize) -> bool {
        self.text(k).is_some_and(|word| KEYWORDS.contains(&word))
    }

    fn slice(&self, first: usize, last: usize) -> &str {
        &self.source[self.tree.tokens[first].start..self.tree.tokens[last].end]
    }

    fn token(&self, k: usize) -> Option<&Token> {
        self.tree.tokens.get(k)
    }

    fn text(&self, k: usize) -> Option<&str> {
        self.token(k).map(|token| token.text.as_str())
    }

    fn kind_is(&self, k: usize, kind: TokenKind) -> bool {
        self.token(k).is_some_and(|token| token.kind == kind)
    }

    fn is_punct(&self, k: usize, text: &str) -> bool {
        self.token(k).is_some_and(|token| token.is_punct(text))
    }

    fn is_ident(&self, k: usize, text: &str) -> bool {
        self.token(k).is_some_and(|token| token.is_ident(text))
    }

    fn newline_before(&self, k: usize) -> bool {
        self.token(k).is_some_and(|token| token.newline_before)
    }

    fn len(&self) -> usize {
        self.tree.tokens.len()
    }
}

/// Whether a specifier names a type-declaration-only file
pub fn is_declaration_file(specifier: &str) -> bool {
    specifier.ends_with(".d.ts") || specifier.ends_with(".d.mts")
}

fn quote_js(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
