//! Propositional formulas: tokenizer, main-operator recursive parser, and the
//! owned tree type with its canonical printer.

use std::fmt;

use thiserror::Error;

use crate::core::CheckError;

mod lexer;
mod parser;
mod syntax;

#[cfg(test)]
mod proptest_tests;

pub use parser::{parse_formula, parse_formula_with_limit};
pub use syntax::{Atom, BinaryOp, Formula, Node, Preorder, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    Left,
    Right,
}

impl fmt::Display for OperandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Syntax errors raised while building a formula. Columns are 1-based
/// character offsets into the formula text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("empty expression at column {column}")]
    Empty { column: usize },

    #[error("missing {side} operand for '{op}' at column {column}")]
    MissingOperand {
        op: char,
        side: OperandSide,
        column: usize,
    },

    #[error("unmatched '{paren}' at column {column}")]
    UnmatchedParenthesis { paren: char, column: usize },

    #[error("unrecognized token '{token}' at column {column}")]
    UnknownToken { token: String, column: usize },

    #[error("unexpected token '{token}' at column {column}")]
    UnexpectedToken { token: String, column: usize },

    #[error("formula nesting exceeds the limit of {limit} levels")]
    TooDeep { limit: usize },
}

impl FormulaError {
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Empty { column }
            | Self::MissingOperand { column, .. }
            | Self::UnmatchedParenthesis { column, .. }
            | Self::UnknownToken { column, .. }
            | Self::UnexpectedToken { column, .. } => Some(*column),
            Self::TooDeep { .. } => None,
        }
    }
}

impl From<FormulaError> for CheckError {
    fn from(err: FormulaError) -> Self {
        CheckError::syntax(format!("invalid formula: {err}"))
    }
}
