use super::syntax::{Atom, BinaryOp};
use super::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Atom(Atom),
    Top,
    Bottom,
    Not,
    Binary(BinaryOp),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based character column in the formula text.
    pub column: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    source: &'a str,
    index: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            column: 1,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, FormulaError> {
        self.skip_whitespace();
        let column = self.column;

        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        let kind = match ch {
            '(' => self.single(ch, TokenKind::LParen),
            ')' => self.single(ch, TokenKind::RParen),
            '¬' | '~' | '!' => self.single(ch, TokenKind::Not),
            '∧' | '&' | '^' => self.single(ch, TokenKind::Binary(BinaryOp::And)),
            '∨' | '|' => self.single(ch, TokenKind::Binary(BinaryOp::Or)),
            '→' => self.single(ch, TokenKind::Binary(BinaryOp::Implies)),
            '⊤' => self.single(ch, TokenKind::Top),
            '⊥' => self.single(ch, TokenKind::Bottom),
            '-' | '=' => self.lex_arrow(ch, column)?,
            c if c.is_ascii_alphabetic() => self.lex_word(column)?,
            _ => {
                return Err(FormulaError::UnknownToken {
                    token: ch.to_string(),
                    column,
                })
            }
        };

        Ok(Some(Token { kind, column }))
    }

    fn single(&mut self, ch: char, kind: TokenKind) -> TokenKind {
        self.bump_char(ch);
        kind
    }

    fn lex_arrow(&mut self, first: char, column: usize) -> Result<TokenKind, FormulaError> {
        self.bump_char(first);
        match self.peek_char() {
            Some('>') => {
                self.bump_char('>');
                Ok(TokenKind::Binary(BinaryOp::Implies))
            }
            _ => Err(FormulaError::UnknownToken {
                token: first.to_string(),
                column,
            }),
        }
    }

    fn lex_word(&mut self, column: usize) -> Result<TokenKind, FormulaError> {
        let start = self.index;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphabetic() {
                self.bump_char(ch);
            } else {
                break;
            }
        }

        let word = &self.source[start..self.index];
        match word {
            "T" | "true" => Ok(TokenKind::Top),
            "F" | "false" => Ok(TokenKind::Bottom),
            _ => {
                let mut chars = word.chars();
                match (chars.next().and_then(Atom::new), chars.next()) {
                    (Some(atom), None) => Ok(TokenKind::Atom(atom)),
                    _ => Err(FormulaError::UnknownToken {
                        token: word.to_owned(),
                        column,
                    }),
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.bump_char(ch);
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn bump_char(&mut self, ch: char) {
        self.index += ch.len_utf8();
        self.column += 1;
    }
}
