//! Span-preserving tokenizer for module source text.
//!
//! Unlike a parser front end, this lexer keeps the byte span of every token
//! so later passes can erase or rewrite exact regions of the original text.
//! Comments and whitespace are skipped but recorded through
//! [`Token::newline_before`] for automatic-semicolon heuristics.

use crate::error::SyntaxError;
use core_types::SourcePosition;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (keywords are contextual for the eraser)
    Ident,
    /// Private class member name (`#name`)
    PrivateName,
    /// Numeric or BigInt literal
    Number,
    /// String literal
    Str,
    /// Template literal without substitutions
    Template,
    /// Template head: from ` to the first `${`
    TemplateHead,
    /// Template middle: from `}` to the next `${`
    TemplateMiddle,
    /// Template tail: from `}` to the closing `
    TemplateTail,
    /// Regular expression literal
    RegExp,
    /// Punctuator/operator
    Punct,
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Raw source text of the token
    pub text: String,
    /// Cooked value for string literals, raw text otherwise
    pub value: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Line of the first character (1-indexed)
    pub line: u32,
    /// Column of the first character (1-indexed)
    pub column: u32,
    /// Whether a line terminator precedes this token
    pub newline_before: bool,
}

impl Token {
    /// Check for a punctuator with the given text
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    /// Check for an identifier with the given text
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }

    /// Position of the token start
    pub fn position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.start,
        }
    }
}

/// Punctuators ordered longest first so the scanner takes maximal munch.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@",
];

/// Identifiers after which a `/` starts a regular expression
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await", "extends",
];

/// Tokenizer over a source string
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    offsets: Vec<usize>,
    position: usize,
    line: u32,
    column: u32,
    /// Brace depth at each open template substitution
    template_stack: Vec<usize>,
    brace_depth: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len() + 1);
        for (offset, ch) in source.char_indices() {
            chars.push(ch);
            offsets.push(offset);
        }
        offsets.push(source.len());

        Self {
            source,
            chars,
            offsets,
            position: 0,
            line: 1,
            column: 1,
            template_stack: Vec::new(),
            brace_depth: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole source
    ///
    /// # Errors
    /// Returns a [`SyntaxError`] for unterminated strings, templates,
    /// comments or regular expressions, and for characters that cannot start
    /// a token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        self.skip_hashbang();
        loop {
            let newline_before = self.skip_whitespace_and_comments()?;
            if self.is_at_end() {
                break;
            }
            let token = self.scan_token(newline_before)?;
            self.tokens.push(token);
        }
        if !self.template_stack.is_empty() {
            return Err(SyntaxError::new(
                "Unterminated template literal",
                self.current_position(),
            ));
        }
        Ok(self.tokens)
    }

    fn skip_hashbang(&mut self) {
        if self.peek() == '#' && self.peek_next() == Some('!') {
            while !self.is_at_end() && !is_line_terminator(self.peek()) {
                self.advance();
            }
        }
    }

    fn scan_token(&mut self, newline_before: bool) -> Result<Token, SyntaxError> {
        let start = self.position;
        let start_pos = self.current_position();
        let ch = self.peek();

        let (kind, value) = match ch {
            '"' | '\'' => (TokenKind::Str, self.scan_string(ch)?),
            '`' => {
                self.advance();
                (self.scan_template_part(&start_pos)?, String::new())
            }
            '}' if self.template_stack.last() == Some(&self.brace_depth) => {
                self.template_stack.pop();
                self.advance();
                (self.scan_template_part(&start_pos)?, String::new())
            }
            '#' => {
                self.advance();
                self.scan_identifier_rest();
                (TokenKind::PrivateName, String::new())
            }
            '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number();
                (TokenKind::Number, String::new())
            }
            c if c.is_ascii_digit() => {
                self.scan_number();
                (TokenKind::Number, String::new())
            }
            c if is_id_start(c) || c == '\\' => {
                self.scan_identifier_rest();
                (TokenKind::Ident, String::new())
            }
            '/' if self.regex_allowed() => {
                self.scan_regexp(&start_pos)?;
                (TokenKind::RegExp, String::new())
            }
            _ => {
                self.scan_punctuator(&start_pos)?;
                (TokenKind::Punct, String::new())
            }
        };

        let text = self.slice(start, self.position).to_string();
        if kind == TokenKind::Punct {
            match text.as_str() {
                "{" => self.brace_depth += 1,
                "}" => self.brace_depth = self.brace_depth.saturating_sub(1),
                _ => {}
            }
        }
        if kind == TokenKind::TemplateHead || kind == TokenKind::TemplateMiddle {
            self.template_stack.push(self.brace_depth);
        }

        let value = if kind == TokenKind::Str { value } else { text.clone() };
        Ok(Token {
            kind,
            text,
            value,
            start: self.offsets[start],
            end: self.offsets[self.position],
            line: start_pos.line,
            column: start_pos.column,
            newline_before,
        })
    }

    /// Decide whether `/` begins a regular expression from the previous token
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(prev) => match prev.kind {
                TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&prev.text.as_str()),
                TokenKind::Punct => !matches!(prev.text.as_str(), ")" | "]" | "}" | "++" | "--"),
                TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
                _ => false,
            },
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start_pos = self.current_position();
        self.advance(); // Opening quote
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            let ch = self.advance();
            if ch == '\\' {
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\r' => {
                        if self.peek() == '\n' {
                            self.advance();
                        }
                        self.new_line();
                    }
                    '\n' | '\u{2028}' | '\u{2029}' => self.new_line(),
                    other => value.push(other),
                }
            } else if ch == '\n' || ch == '\r' {
                return Err(SyntaxError::new("Unterminated string literal", start_pos));
            } else {
                value.push(ch);
            }
        }

        if self.is_at_end() {
            return Err(SyntaxError::new("Unterminated string literal", start_pos));
        }
        self.advance(); // Closing quote
        Ok(value)
    }

    /// Scan template characters after ` or a substitution-closing `}`
    fn scan_template_part(&mut self, start_pos: &SourcePosition) -> Result<TokenKind, SyntaxError> {
        let opened_with_backtick = self.chars[self.position - 1] == '`';
        while !self.is_at_end() {
            let ch = self.advance();
            match ch {
                '`' => {
                    return Ok(if opened_with_backtick {
                        TokenKind::Template
                    } else {
                        TokenKind::TemplateTail
                    });
                }
                '$' if self.peek() == '{' => {
                    self.advance();
                    return Ok(if opened_with_backtick {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    });
                }
                '\\' => {
                    if !self.is_at_end() {
                        let escaped = self.advance();
                        if escaped == '\n' {
                            self.new_line();
                        }
                    }
                }
                '\n' => self.new_line(),
                _ => {}
            }
        }
        Err(SyntaxError::new("Unterminated template literal", *start_pos))
    }

    fn scan_regexp(&mut self, start_pos: &SourcePosition) -> Result<(), SyntaxError> {
        self.advance(); // Opening '/'
        let mut in_class = false;

        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(SyntaxError::new(
                    "Unterminated regular expression",
                    *start_pos,
                ));
            }
            match self.advance() {
                '\\' => {
                    if !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }

        // Flags
        while !self.is_at_end() && is_id_continue(self.peek()) {
            self.advance();
        }
        Ok(())
    }

    fn scan_number(&mut self) {
        let first = self.advance();
        if first == '0' && matches!(self.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            self.advance();
            while self.peek().is_ascii_hexdigit() || self.peek() == '_' {
                self.advance();
            }
        } else {
            self.scan_decimal_digits();
            if first != '.' && self.peek() == '.' {
                self.advance();
                self.scan_decimal_digits();
            }
            if matches!(self.peek(), 'e' | 'E') {
                let sign_follows = matches!(self.peek_next(), Some('+') | Some('-'));
                self.advance();
                if sign_follows {
                    self.advance();
                }
                self.scan_decimal_digits();
            }
        }
        // BigInt suffix
        if self.peek() == 'n' {
            self.advance();
        }
    }

    fn scan_decimal_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == '_' {
            self.advance();
        }
    }

    fn scan_identifier_rest(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == '\\' {
                // Unicode escape: \uXXXX or \u{...}
                self.advance();
                if self.peek() == 'u' {
                    self.advance();
                    if self.peek() == '{' {
                        while !self.is_at_end() && self.advance() != '}' {}
                    } else {
                        for _ in 0..4 {
                            if self.peek().is_ascii_hexdigit() {
                                self.advance();
                            }
                        }
                    }
                }
            } else if is_id_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_punctuator(&mut self, start_pos: &SourcePosition) -> Result<(), SyntaxError> {
        let rest = &self.source[self.offsets[self.position]..];
        for punct in PUNCTUATORS {
            if !rest.starts_with(punct) {
                continue;
            }
            // `?.` followed by a digit is a conditional, not optional chaining
            if *punct == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            for _ in 0..punct.chars().count() {
                self.advance();
            }
            return Ok(());
        }
        Err(SyntaxError::new(
            format!("Unexpected character '{}'", self.peek()),
            *start_pos,
        ))
    }

    /// Skip whitespace and comments, reporting whether a line terminator was crossed
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, SyntaxError> {
        let mut newline = false;
        while !self.is_at_end() {
            match self.peek() {
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.advance();
                    self.new_line();
                    newline = true;
                }
                '\r' => {
                    self.advance();
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    self.new_line();
                    newline = true;
                }
                c if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let start_pos = self.current_position();
                    self.advance();
                    self.advance();
                    let mut found_end = false;
                    while !self.is_at_end() {
                        if self.peek() == '*' && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            found_end = true;
                            break;
                        }
                        if self.advance() == '\n' {
                            self.new_line();
                            newline = true;
                        }
                    }
                    if !found_end {
                        return Err(SyntaxError::new(
                            "Unterminated multi-line comment",
                            start_pos,
                        ));
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[self.offsets[start]..self.offsets[end]]
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.position]
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.position];
        self.position += 1;
        self.column += 1;
        ch
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.offsets[self.position],
        }
    }
}

/// Tokenize `source` in one call
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).tokenize()
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '_' || ch == '\u{200C}' || ch == '\u{200D}' || ch.is_alphanumeric()
}
