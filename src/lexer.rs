//! Module `lexer` implements a line‑oriented lexer for the Enkel language.
//!
//! The source is treated as an ordered sequence of lines. Each line is first
//! cut at its `//` comment marker, then scanned left to right: skip
//! whitespace, match exactly one rule anchored at the current position, emit
//! a token and move past it. After the last line a single `EOF` token is
//! emitted whose line number equals the number of lines.
//!
//! # Rules
//!
//! - Punctuation: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `/`, `*`.
//! - Operators: `!=`, `==`, `>=`, `<=` are tried before `!`, `=`, `>`, `<`.
//! - Identifiers: `[a-zA-Z][a-zA-Z0-9_]*`. A word that spells a keyword is
//!   that keyword, so `classX` stays an identifier.
//! - Numbers: `\d+(\.\d+)?`, converted to `f64`. No sign, no exponent.
//! - Strings: `"` up to the next `"` on the same line, no escapes.
//!
//! Anything else is a lexing failure naming the unmatched remainder of the
//! line.
//!
//! # Example
//!
//! ```rust
//! use enkel::lexer::Lexer;
//!
//! let lexer = Lexer::new("var x = 1; // comment");
//! for result in lexer {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("Lex error: {}", err),
//!     }
//! }
//! ```

use crate::error::{EnkelError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memmem;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"func"   => TokenType::FUNC,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"none"   => TokenType::NONE,
    b"or"     => TokenType::OR,
    b"parent" => TokenType::PARENT,
    b"return" => TokenType::RETURN,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Lex a whole source text, stopping at the first failure.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).collect()
}

/// A line‑oriented **lexer** that converts source lines into a sequence of
/// owned [`Token`]s. Yields `Result<Token>` so a caller can either stop at
/// the first error ([`tokenize`]) or keep going and report every one.
pub struct Lexer<'a> {
    lines: Vec<&'a str>, // comment‑stripped source lines
    line: usize,         // 0‑based index of the line being scanned
    start: usize,        // byte offset of the first byte of the current lexeme
    curr: usize,         // byte offset one past the last byte examined
    finished: bool,      // EOF already emitted
}

impl<'a> Lexer<'a> {
    /// Create a lexer over a complete source text.
    pub fn new(source: &'a str) -> Self {
        let lines: Vec<&'a str> = source.lines().collect();

        Self::from_lines(&lines)
    }

    /// Create a lexer over pre‑split source lines.
    pub fn from_lines(lines: &[&'a str]) -> Self {
        info!("Lexer created over {} line(s)", lines.len());

        Self {
            lines: lines.iter().map(|&line| strip_comment(line)).collect(),
            line: 0,
            start: 0,
            curr: 0,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn src(&self) -> &'a [u8] {
        self.lines[self.line].as_bytes()
    }

    #[inline(always)]
    fn is_at_line_end(&self) -> bool {
        self.curr >= self.src().len()
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src()[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it; `0` past the line end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_line_end() {
            0
        } else {
            self.src()[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        let src = self.src();
        if self.curr + 1 >= src.len() {
            0
        } else {
            src[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == expected {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_line_end() && self.peek().is_ascii_whitespace() {
            self.curr += 1;
        }
    }

    #[inline]
    fn lineno(&self) -> usize {
        self.line + 1
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Match one rule starting at `self.start`. On success `self.curr` points
    /// past the lexeme.
    fn scan_token(&mut self) -> Result<TokenType> {
        let b = self.advance();

        let tt = match b {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'/' => TokenType::SLASH,
            b'*' => TokenType::STAR,

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' => self.identifier(),

            _ => return Err(self.unmatched()),
        };

        Ok(tt)
    }

    /// Build the failure for an unmatched position and step over the
    /// offending character so iteration can resume.
    fn unmatched(&mut self) -> EnkelError {
        let line: &'a str = self.lines[self.line];
        let rest: &'a str = &line[self.start..];

        if let Some(c) = rest.chars().next() {
            self.curr = self.start + c.len_utf8();
        }

        EnkelError::lex(
            self.lineno(),
            format!("Can't parse token at substring: {}", rest),
        )
    }

    fn string(&mut self) -> Result<TokenType> {
        match memchr::memchr(b'"', &self.src()[self.curr..]) {
            Some(offset) => {
                let line: &'a str = self.lines[self.line];
                let contents: &'a str = &line[self.curr..self.curr + offset];
                self.curr += offset + 1; // closing quote

                Ok(TokenType::STRING(contents.to_owned()))
            }

            None => {
                let err = self.unmatched();
                // the rest of the line belongs to the broken literal
                self.curr = self.src().len();

                Err(err)
            }
        }
    }

    fn number(&mut self) -> Result<TokenType> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let line: &'a str = self.lines[self.line];
        let text: &'a str = &line[self.start..self.curr];
        let n: f64 = text.parse::<f64>().map_err(|e| {
            EnkelError::lex(self.lineno(), format!("Invalid number '{}': {}", text, e))
        })?;

        Ok(TokenType::NUMBER(n))
    }

    fn identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src()[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

fn strip_comment(line: &str) -> &str {
    match memmem::find(line.as_bytes(), b"//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.line >= self.lines.len() {
                self.finished = true;
                return Some(Ok(Token::new(TokenType::EOF, "", self.lines.len())));
            }

            // 2. Move to the next lexeme, or the next line.
            self.skip_whitespace();
            if self.is_at_line_end() {
                self.line += 1;
                self.curr = 0;
                continue;
            }

            self.start = self.curr;

            // 3. Match a rule anchored at `start`.
            return match self.scan_token() {
                Ok(tt) => {
                    let lexeme: &str = &self.lines[self.line][self.start..self.curr];
                    debug!("Lexed token ({:?}) on line {}", tt, self.lineno());

                    Some(Ok(Token::new(tt, lexeme, self.lineno())))
                }
                Err(e) => Some(Err(e)),
            };
        }
    }
}

impl FusedIterator for Lexer<'_> {}
