//! Hand-written tokenizer.
//!
//! Breaks raw text into a flat list of [`Token`]s. Content runs, quoted or
//! not, come out as content tokens (`is_string == true`). Every structural
//! character comes out as its own single-character token, even when it sits
//! right next to other text.
//
//  Lexical items:
//
//      Symbol   ::= '(' | ')' | '{' | '}' | '[' | ']' | ';' | ':' | '~' | ','
//      Quoted   ::= '"' .*? '"' | '\'' .*? '\''
//      Unquoted ::= (any char except whitespace, symbols, quotes)+
//      Escape   ::= '\' any          (literal character, also inside quotes)
//      UniqueId ::= '&'              (replaced by the host's unique id)
//
//  Line comments (`// ...`) and block comments (`/* ... */`) are discarded.
//  Content runs separated only by whitespace or comments are joined into a
//  single token, keeping the whitespace in between.

use std::rc::Rc;

use crate::tree::{Location, Meta, Token};

use super::error::{Diagnostic, DiagnosticKind};

/// Characters that always form a token of their own.
pub const STRUCTURAL_SYMBOLS: &[char] = &['(', ')', '{', '}', '[', ']', ';', ':', '~', ','];

const ESCAPE_SYMBOL: char = '\\';
const UNIQUE_ID_SYMBOL: char = '&';

pub fn is_structural(c: char) -> bool {
    STRUCTURAL_SYMBOLS.contains(&c)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Tokenizes `text` coming from `file`, substituting `unique_id` for every
/// unescaped `&`.
pub fn tokenize(text: &str, file: &str, unique_id: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(text, Rc::from(file), unique_id).run()
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    file: Rc<str>,
    unique_id: &'a str,

    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    /// Whitespace seen since the last emitted token
    pending_whitespace: String,
    /// Whether the next content run gets joined onto the last token
    joinable: bool,
    /// Char offset where the last content token started
    last_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &str, file: Rc<str>, unique_id: &'a str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            file,
            unique_id,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            pending_whitespace: String::new(),
            joinable: false,
            last_start: 0,
        }
    }

    pub fn run(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pending_whitespace.push(c);
                self.next_char();
            } else if c == '/' && self.peek_nth(1) == Some('/') {
                self.skip_line_comment();
            } else if c == '/' && self.peek_nth(1) == Some('*') {
                self.skip_block_comment();
            } else if is_structural(c) {
                let location = self.location();
                self.next_char();
                self.push_symbol(c, location);
            } else if is_quote(c) {
                self.read_quoted(c);
            } else {
                self.read_unquoted();
            }
        }
        (self.tokens, self.diagnostics)
    }

    fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line, self.column)
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn at_comment(&self) -> bool {
        self.peek_char() == Some('/') && matches!(self.peek_nth(1), Some('/') | Some('*'))
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.next_char();
        }
    }

    fn skip_block_comment(&mut self) {
        let location = self.location();
        let start = self.pos;
        // opening `/*`
        self.next_char();
        self.next_char();
        loop {
            match self.next_char() {
                Some('*') if self.peek_char() == Some('/') => {
                    self.next_char();
                    return;
                }
                Some(_) => continue,
                None => {
                    self.diagnostics.push(Diagnostic::new(
                        location,
                        self.pos - start,
                        DiagnosticKind::UnterminatedComment,
                    ));
                    return;
                }
            }
        }
    }

    fn read_quoted(&mut self, quote: char) {
        let location = self.location();
        let start = self.pos;
        self.next_char();

        let mut value = String::new();
        let mut closed = false;
        while let Some(c) = self.next_char() {
            match c {
                ESCAPE_SYMBOL => {
                    if let Some(escaped) = self.next_char() {
                        value.push(escaped);
                    }
                }
                UNIQUE_ID_SYMBOL => value.push_str(self.unique_id),
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => value.push(c),
            }
        }
        if !closed {
            self.diagnostics.push(Diagnostic::new(
                location.clone(),
                self.pos - start,
                DiagnosticKind::UnterminatedString,
            ));
        }
        self.push_content(value, true, location, start);
    }

    fn read_unquoted(&mut self) {
        let location = self.location();
        let start = self.pos;

        let mut value = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || is_structural(c) || is_quote(c) || self.at_comment() {
                break;
            }
            self.next_char();
            match c {
                ESCAPE_SYMBOL => {
                    if let Some(escaped) = self.next_char() {
                        value.push(escaped);
                    }
                }
                UNIQUE_ID_SYMBOL => value.push_str(self.unique_id),
                c => value.push(c),
            }
        }
        self.push_content(value, false, location, start);
    }

    fn push_symbol(&mut self, symbol: char, location: Location) {
        self.tokens.push(Token::new(
            symbol.to_string(),
            false,
            Meta::new(location, 1),
        ));
        self.pending_whitespace.clear();
        self.joinable = false;
    }

    fn push_content(&mut self, value: String, quoted: bool, location: Location, start: usize) {
        let joined = match self.tokens.last_mut() {
            Some(last) if self.joinable => {
                last.value.push_str(&self.pending_whitespace);
                last.value.push_str(&value);
                last.quoted |= quoted;
                last.meta.length = self.pos - self.last_start;
                true
            }
            _ => false,
        };
        if !joined {
            let length = self.pos - start;
            self.tokens
                .push(Token::string(value, Meta::new(location, length)).quoted(quoted));
            self.last_start = start;
        }
        self.pending_whitespace.clear();
        self.joinable = true;
    }
}
