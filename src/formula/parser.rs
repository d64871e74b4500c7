use crate::core::DEFAULT_MAX_FORMULA_DEPTH;

use super::lexer::{tokenize, Token, TokenKind};
use super::syntax::{BinaryOp, Formula, Node};
use super::{FormulaError, OperandSide};

pub fn parse_formula(source: &str) -> Result<Formula, FormulaError> {
    parse_formula_with_limit(source, DEFAULT_MAX_FORMULA_DEPTH)
}

/// Parses `source`, rejecting trees nested deeper than `max_depth` levels.
pub fn parse_formula_with_limit(source: &str, max_depth: usize) -> Result<Formula, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty { column: 1 });
    }
    check_balanced(&tokens)?;

    let parser = Parser { max_depth };
    parser.parse_expr(&tokens, 0, 1).map(Formula::new)
}

struct Parser {
    max_depth: usize,
}

impl Parser {
    fn parse_expr(
        &self,
        tokens: &[Token],
        depth: usize,
        column: usize,
    ) -> Result<Node, FormulaError> {
        if depth >= self.max_depth {
            return Err(FormulaError::TooDeep {
                limit: self.max_depth,
            });
        }

        let mut tokens = tokens;
        let mut column = column;
        while let Some(inner) = strip_outer_parens(tokens) {
            column = tokens[0].column + 1;
            tokens = inner;
        }
        let Some(first) = tokens.first().copied() else {
            return Err(FormulaError::Empty { column });
        };

        if let Some((index, op)) = find_main_operator(tokens) {
            let op_column = tokens[index].column;
            let (left, right) = (&tokens[..index], &tokens[index + 1..]);
            if left.is_empty() {
                return Err(missing_operand(op.symbol(), OperandSide::Left, op_column));
            }
            if right.is_empty() {
                return Err(missing_operand(op.symbol(), OperandSide::Right, op_column));
            }
            let left = self.parse_expr(left, depth + 1, first.column)?;
            let right = self.parse_expr(right, depth + 1, op_column + 1)?;
            return Ok(Node::binary(op, left, right));
        }

        if first.kind == TokenKind::Not {
            let operand = &tokens[1..];
            if operand.is_empty() {
                return Err(missing_operand('¬', OperandSide::Right, first.column));
            }
            let operand = self.parse_expr(operand, depth + 1, first.column + 1)?;
            return Ok(Node::not(operand));
        }

        if let Some(extra) = tokens.get(1) {
            return Err(FormulaError::UnexpectedToken {
                token: describe(extra.kind),
                column: extra.column,
            });
        }

        match first.kind {
            TokenKind::Atom(atom) => Ok(Node::Atom(atom)),
            TokenKind::Top => Ok(Node::Top),
            TokenKind::Bottom => Ok(Node::Bottom),
            TokenKind::LParen => Err(FormulaError::UnmatchedParenthesis {
                paren: '(',
                column: first.column,
            }),
            TokenKind::RParen => Err(FormulaError::UnmatchedParenthesis {
                paren: ')',
                column: first.column,
            }),
            // Both handled above.
            TokenKind::Not | TokenKind::Binary(_) => Err(FormulaError::UnexpectedToken {
                token: describe(first.kind),
                column: first.column,
            }),
        }
    }
}

fn missing_operand(op: char, side: OperandSide, column: usize) -> FormulaError {
    FormulaError::MissingOperand { op, side, column }
}

fn check_balanced(tokens: &[Token]) -> Result<(), FormulaError> {
    let mut open = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::LParen => open.push(token.column),
            TokenKind::RParen => {
                if open.pop().is_none() {
                    return Err(FormulaError::UnmatchedParenthesis {
                        paren: ')',
                        column: token.column,
                    });
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(&column) => Err(FormulaError::UnmatchedParenthesis { paren: '(', column }),
        None => Ok(()),
    }
}

/// Returns the contents when the whole slice is wrapped in one matching pair.
fn strip_outer_parens(tokens: &[Token]) -> Option<&[Token]> {
    let (first, last) = (tokens.first()?, tokens.last()?);
    if first.kind != TokenKind::LParen || last.kind != TokenKind::RParen {
        return None;
    }

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return (index == tokens.len() - 1).then(|| &tokens[1..index]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Lowest-precedence connective outside parentheses. Among equals the
/// rightmost `∧`/`∨` wins and the leftmost `→` wins, which makes the former
/// left-associative and the latter right-associative.
fn find_main_operator(tokens: &[Token]) -> Option<(usize, BinaryOp)> {
    let mut depth = 0usize;
    let mut main: Option<(usize, BinaryOp)> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Binary(op) if depth == 0 => {
                main = match main {
                    None => Some((index, op)),
                    Some((_, current)) if op.precedence() < current.precedence() => {
                        Some((index, op))
                    }
                    Some((_, current))
                        if op.precedence() == current.precedence()
                            && !op.is_right_associative() =>
                    {
                        Some((index, op))
                    }
                    unchanged => unchanged,
                };
            }
            _ => {}
        }
    }

    main
}

fn describe(kind: TokenKind) -> String {
    match kind {
        TokenKind::Atom(atom) => atom.to_string(),
        TokenKind::Top => "⊤".to_string(),
        TokenKind::Bottom => "⊥".to_string(),
        TokenKind::Not => "¬".to_string(),
        TokenKind::Binary(op) => op.symbol().to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_formula, parse_formula_with_limit};
    use crate::formula::syntax::{Atom, Node};
    use crate::formula::{FormulaError, OperandSide};

    fn atom(name: char) -> Node {
        Node::Atom(Atom::new(name).expect("test atoms are lowercase"))
    }

    fn parse(source: &str) -> Node {
        parse_formula(source)
            .expect("formula should parse")
            .into_root()
    }

    #[test]
    fn parses_single_atom_and_constants() {
        assert_eq!(parse("p"), atom('p'));
        assert_eq!(parse("⊤"), Node::Top);
        assert_eq!(parse("false"), Node::Bottom);
        assert_eq!(parse("T"), Node::Top);
    }

    #[test]
    fn honors_precedence() {
        assert_eq!(
            parse("p ∨ q ∧ r → s"),
            Node::implies(Node::or(atom('p'), Node::and(atom('q'), atom('r'))), atom('s'))
        );
    }

    #[test]
    fn groups_conjunction_and_disjunction_to_the_left() {
        assert_eq!(
            parse("p ∧ q ∧ r"),
            Node::and(Node::and(atom('p'), atom('q')), atom('r'))
        );
        assert_eq!(
            parse("p ∨ q ∨ r"),
            Node::or(Node::or(atom('p'), atom('q')), atom('r'))
        );
    }

    #[test]
    fn groups_implication_to_the_right() {
        assert_eq!(
            parse("p → q → r"),
            Node::implies(atom('p'), Node::implies(atom('q'), atom('r')))
        );
    }

    #[test]
    fn strips_redundant_outer_parentheses() {
        assert_eq!(parse("((p ∧ q))"), parse("p ∧ q"));
        assert_eq!(parse("(p) ∧ (q)"), parse("p ∧ q"));
    }

    #[test]
    fn negation_binds_tighter_than_binary_connectives() {
        assert_eq!(parse("¬p ∧ q"), Node::and(Node::not(atom('p')), atom('q')));
        assert_eq!(
            parse("¬(p ∧ q)"),
            Node::not(Node::and(atom('p'), atom('q')))
        );
        assert_eq!(parse("¬¬p"), Node::not(Node::not(atom('p'))));
    }

    #[test]
    fn ignores_whitespace() {
        assert_eq!(parse("p∧q→r"), parse("  p ∧ q   →  r "));
    }

    #[test]
    fn reports_empty_input() {
        assert_eq!(
            parse_formula("   ").expect_err("empty should fail"),
            FormulaError::Empty { column: 1 }
        );
        assert_eq!(
            parse_formula("p ∧ ()").expect_err("empty parens should fail"),
            FormulaError::Empty { column: 6 }
        );
    }

    #[test]
    fn reports_missing_operands() {
        assert_eq!(
            parse_formula("p ∧").expect_err("should fail"),
            FormulaError::MissingOperand {
                op: '∧',
                side: OperandSide::Right,
                column: 3,
            }
        );
        assert_eq!(
            parse_formula("→ q").expect_err("should fail"),
            FormulaError::MissingOperand {
                op: '→',
                side: OperandSide::Left,
                column: 1,
            }
        );
        assert!(matches!(
            parse_formula("¬"),
            Err(FormulaError::MissingOperand { op: '¬', .. })
        ));
    }

    #[test]
    fn reports_unmatched_parentheses() {
        assert_eq!(
            parse_formula("(p ∧ q").expect_err("should fail"),
            FormulaError::UnmatchedParenthesis {
                paren: '(',
                column: 1,
            }
        );
        assert_eq!(
            parse_formula("p ∧ q)").expect_err("should fail"),
            FormulaError::UnmatchedParenthesis {
                paren: ')',
                column: 6,
            }
        );
    }

    #[test]
    fn reports_juxtaposed_operands() {
        let err = parse_formula("p q").expect_err("should fail");
        assert_eq!(
            err,
            FormulaError::UnexpectedToken {
                token: "q".to_string(),
                column: 3,
            }
        );
        assert!(parse_formula("(p)(q)").is_err());
    }

    #[test]
    fn enforces_depth_limit() {
        let deep = format!("{}p", "¬".repeat(10));
        assert!(parse_formula_with_limit(&deep, 11).is_ok());
        assert_eq!(
            parse_formula_with_limit(&deep, 10).expect_err("should fail"),
            FormulaError::TooDeep { limit: 10 }
        );
    }

    #[test]
    fn deep_parentheses_do_not_count_towards_depth() {
        let wrapped = format!("{}p{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(parse(&wrapped), atom('p'));
    }
}
