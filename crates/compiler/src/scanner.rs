// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::warn;

/// Maximum digits contributing to a numeric literal's value. A longer digit
/// run is still one token; the excess digits are consumed and dropped.
pub const DIGIT_MAX: usize = 4;

/// Maximum characters kept in an identifier lexeme; longer runs are silently
/// truncated but consumed whole.
pub const IDENT_LEN_MAX: usize = 15;

/// The fixed reserved-word set. Reserved words are spelled in uppercase in
/// the source; an uppercase-initial run that is not in this table is an
/// ordinary identifier.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Keyword {
    Program,
    Const,
    Var,
    Int,
    Proc,
    If,
    Then,
    Else,
    Endif,
    While,
    Endwhile,
    Repeat,
    Until,
    For,
    From,
    To,
    Endfor,
    Times,
    Endtimes,
    And,
    Or,
    End,
}

/// One classified unit of source text. Payload-free kinds cover reserved
/// words and single-character specials; `Display` recovers a printable form
/// for diagnostics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// Lowercase-initial name, or an uppercase-initial run that is not a
    /// reserved word.
    Ident(String),
    /// Digit-initial numeric constant.
    Literal(i64),
    Keyword(Keyword),
    /// The two-character assignment operator `:=`.
    Assign,
    /// Any other single printable character, classified as itself.
    Special(char),
    /// Distinguished terminal state; sticky once reached.
    Eof,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(kw) if *kw == keyword)
    }

    pub fn is_special(&self, c: char) -> bool {
        matches!(self, Token::Special(sc) if *sc == c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Literal(value) => write!(f, "literal {value}"),
            Token::Keyword(keyword) => write!(f, "{keyword}"),
            Token::Assign => f.write_str("':='"),
            Token::Special(c) => write!(f, "'{c}'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Pull-based scanner with one character of lookahead. The parser asks for
/// one token at a time; nothing is buffered beyond the current token and the
/// single lookahead character.
pub struct Scanner<'a> {
    chars: std::str::Chars<'a>,
    look: Option<char>,
    sym: Token,
}

impl<'a> Scanner<'a> {
    /// Prime the lookahead and scan the first token.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let look = chars.next();
        let mut scanner = Self {
            chars,
            look,
            sym: Token::Eof,
        };
        scanner.advance();
        scanner
    }

    /// The current token.
    pub fn sym(&self) -> &Token {
        &self.sym
    }

    // Post-conditions:
    // - sym describes the next token
    // - look holds the first character not part of it
    pub fn advance(&mut self) -> &Token {
        self.sym = self.scan();
        &self.sym
    }

    fn get_char(&mut self) -> Option<char> {
        let saved = self.look;
        self.look = self.chars.next();
        saved
    }

    fn scan(&mut self) -> Token {
        loop {
            while matches!(self.look, Some(c) if c.is_whitespace()) {
                self.get_char();
            }
            let Some(c) = self.look else {
                return Token::Eof;
            };
            if c.is_ascii_digit() {
                return self.scan_literal();
            }
            if c.is_ascii_lowercase() {
                return Token::Ident(self.scan_word());
            }
            if c.is_ascii_uppercase() {
                let word = self.scan_word();
                return match Keyword::from_str(&word) {
                    Ok(keyword) => Token::Keyword(keyword),
                    Err(_) => Token::Ident(word),
                };
            }
            if c == ':' {
                self.get_char();
                if self.look == Some('=') {
                    self.get_char();
                    return Token::Assign;
                }
                return Token::Special(':');
            }
            if c == '(' {
                self.get_char();
                if self.look == Some('*') {
                    self.get_char();
                    self.skip_comment();
                    continue;
                }
                return Token::Special('(');
            }
            if c.is_ascii_graphic() {
                self.get_char();
                return Token::Special(c);
            }
            // The one recovered lexical error: report, skip, rescan.
            warn!("skipping unrecognized character {c:?}");
            self.get_char();
        }
    }

    fn scan_literal(&mut self) -> Token {
        let mut value: i64 = 0;
        let mut ndigits = 0;
        while let Some(c) = self.look {
            let Some(digit) = c.to_digit(10) else {
                break;
            };
            self.get_char();
            if ndigits < DIGIT_MAX {
                value = value * 10 + i64::from(digit);
                ndigits += 1;
            }
        }
        Token::Literal(value)
    }

    fn scan_word(&mut self) -> String {
        let mut lexeme = String::new();
        while let Some(c) = self.look {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.get_char();
            if lexeme.len() < IDENT_LEN_MAX {
                lexeme.push(c);
            }
        }
        lexeme
    }

    // We are just past "(*". Comments do not nest; the first "*)" ends the
    // comment, and an unterminated comment runs to end of input.
    fn skip_comment(&mut self) {
        while let Some(c) = self.get_char() {
            if c == '*' && self.look == Some(')') {
                self.get_char();
                return;
            }
        }
    }
}
