//! Property-based tests for the formula printer and parser.

use proptest::prelude::*;

use super::syntax::{Atom, BinaryOp, Formula, Node};
use super::parse_formula;

fn arb_node(max_depth: u32) -> BoxedStrategy<Node> {
    let leaf = prop_oneof![
        4 => (b'p'..=b's').prop_map(|c| Node::Atom(Atom::new(char::from(c)).expect("lowercase"))),
        1 => Just(Node::Top),
        1 => Just(Node::Bottom),
    ];
    if max_depth == 0 {
        return leaf.boxed();
    }
    let op = prop_oneof![
        Just(BinaryOp::And),
        Just(BinaryOp::Or),
        Just(BinaryOp::Implies),
    ];
    prop_oneof![
        3 => leaf,
        1 => arb_node(max_depth - 1).prop_map(Node::not),
        3 => (op, arb_node(max_depth - 1), arb_node(max_depth - 1))
            .prop_map(|(op, left, right)| Node::binary(op, left, right)),
    ]
    .boxed()
}

/// Prints every binary subtree inside its own parentheses.
fn fully_parenthesized(node: &Node) -> String {
    match node {
        Node::Not(operand) => format!("¬{}", fully_parenthesized(operand)),
        Node::And(left, right) => parenthesized_binary(BinaryOp::And, left, right),
        Node::Or(left, right) => parenthesized_binary(BinaryOp::Or, left, right),
        Node::Implies(left, right) => parenthesized_binary(BinaryOp::Implies, left, right),
        leaf => leaf.to_string(),
    }
}

fn parenthesized_binary(op: BinaryOp, left: &Node, right: &Node) -> String {
    format!(
        "({} {} {})",
        fully_parenthesized(left),
        op.symbol(),
        fully_parenthesized(right)
    )
}

proptest! {
    /// Printing then parsing yields the same tree.
    #[test]
    fn print_then_parse_round_trips(node in arb_node(5)) {
        let formula = Formula::new(node);
        let reparsed = parse_formula(&formula.to_string()).expect("printed form should parse");
        prop_assert_eq!(reparsed, formula);
    }

    /// Explicit full parenthesization parses to the same tree as the minimal form.
    #[test]
    fn full_parenthesization_matches_minimal_form(node in arb_node(5)) {
        let formula = Formula::new(node);
        let explicit = parse_formula(&fully_parenthesized(formula.root()))
            .expect("parenthesized form should parse");
        let minimal = parse_formula(&formula.to_string()).expect("minimal form should parse");
        prop_assert_eq!(explicit, minimal);
    }

    /// The canonical printer is a fixed point after one round trip.
    #[test]
    fn canonical_form_is_stable(node in arb_node(4)) {
        let printed = Formula::new(node).to_string();
        let reprinted = parse_formula(&printed).expect("printed form should parse").to_string();
        prop_assert_eq!(reprinted, printed);
    }
}
