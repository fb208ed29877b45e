//! The lexer: source text to a token vector.
//!
//! Whitespace-insensitive; `#` starts a line comment. `<-` and `=` both
//! produce the assignment token, `==` the equality token, and a lone `!` is
//! an error. Numbers are decimal with an optional fractional part that must
//! contain at least one digit.

use crate::cursor::Cursor;
use crate::token::Token;
use riftc_util::Symbol;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LexError(pub String);

pub type Result<T> = std::result::Result<T, LexError>;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            cursor: Cursor::new(input),
        }
    }

    /// Scan the whole input. The result always ends with [`Token::Eof`].
    pub fn tokenize(input: &'a str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(b) = self.cursor.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.cursor.bump();
                }
                b'#' => {
                    while let Some(b) = self.cursor.bump() {
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();
        let b = match self.cursor.bump() {
            Some(b) => b,
            None => return Ok(Token::Eof),
        };
        match b {
            b'+' => Ok(Token::Add),
            b'-' => Ok(Token::Sub),
            b'*' => Ok(Token::Mul),
            b'/' => Ok(Token::Div),
            b'(' => Ok(Token::OPar),
            b')' => Ok(Token::CPar),
            b'[' => Ok(Token::OSbr),
            b']' => Ok(Token::CSbr),
            b'{' => Ok(Token::OCbr),
            b'}' => Ok(Token::CCbr),
            b';' => Ok(Token::Semicolon),
            b',' => Ok(Token::Comma),
            b'<' => {
                if self.cursor.eat(b'-') {
                    Ok(Token::Assign)
                } else {
                    Ok(Token::Lt)
                }
            }
            b'>' => Ok(Token::Gt),
            b'=' => {
                if self.cursor.eat(b'=') {
                    Ok(Token::Eq)
                } else {
                    Ok(Token::Assign)
                }
            }
            b'!' => {
                if self.cursor.eat(b'=') {
                    Ok(Token::Neq)
                } else {
                    Err(LexError("Expected != but only ! found".to_string()))
                }
            }
            b'0'..=b'9' => self.number((b - b'0') as f64),
            b'.' => self.fraction_number(0.0),
            b'"' => self.string_literal(),
            _ if is_letter(b) => Ok(self.ident_or_keyword(b)),
            _ => Err(LexError(format!("Unexpected character '{}'", b as char))),
        }
    }

    fn number(&mut self, mut n: f64) -> Result<Token> {
        loop {
            match self.cursor.peek() {
                Some(b @ b'0'..=b'9') => {
                    self.cursor.bump();
                    n = n * 10.0 + (b - b'0') as f64;
                }
                Some(b'.') => {
                    self.cursor.bump();
                    return self.fraction_number(n);
                }
                _ => return Ok(Token::Number(n)),
            }
        }
    }

    fn fraction_number(&mut self, mut n: f64) -> Result<Token> {
        let mut divisor = 10.0;
        while let Some(b @ b'0'..=b'9') = self.cursor.peek() {
            self.cursor.bump();
            n += (b - b'0') as f64 / divisor;
            divisor *= 10.0;
        }
        if divisor == 10.0 {
            return Err(LexError(
                "At least one digit must be present after dot".to_string(),
            ));
        }
        Ok(Token::Number(n))
    }

    fn string_literal(&mut self) -> Result<Token> {
        let start = self.cursor.pos();
        loop {
            match self.cursor.bump() {
                Some(b'"') => {
                    let bytes = self.cursor.slice(start, self.cursor.pos() - 1);
                    let text = std::str::from_utf8(bytes)
                        .map_err(|_| LexError("Invalid string literal".to_string()))?;
                    return Ok(Token::Character(Symbol::intern(text)));
                }
                Some(_) => {}
                None => return Err(LexError("Unterminated string literal".to_string())),
            }
        }
    }

    fn ident_or_keyword(&mut self, first: u8) -> Token {
        let start = self.cursor.pos() - 1;
        debug_assert!(is_letter(first));
        while let Some(b) = self.cursor.peek() {
            if is_letter(b) || b.is_ascii_digit() {
                self.cursor.bump();
            } else {
                break;
            }
        }
        let bytes = self.cursor.slice(start, self.cursor.pos());
        let text = std::str::from_utf8(bytes).expect("identifiers are ASCII");
        match text {
            "function" => Token::KwFunction,
            "if" => Token::KwIf,
            "else" => Token::KwElse,
            "while" => Token::KwWhile,
            "c" => Token::KwC,
            "length" => Token::KwLength,
            "eval" => Token::KwEval,
            "type" => Token::KwType,
            _ => Token::Ident(Symbol::intern(text)),
        }
    }
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}
