use std::fmt;
use std::str::FromStr;

use super::parser::parse_formula;
use super::FormulaError;

/// A propositional variable: one lowercase ASCII letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(char);

impl Atom {
    pub fn new(name: char) -> Option<Self> {
        name.is_ascii_lowercase().then_some(Self(name))
    }

    pub const fn name(self) -> char {
        self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Implies,
}

impl BinaryOp {
    pub const fn symbol(self) -> char {
        match self {
            Self::And => '∧',
            Self::Or => '∨',
            Self::Implies => '→',
        }
    }

    /// Lower binds looser: → < ∨ < ∧.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Implies => 1,
            Self::Or => 2,
            Self::And => 3,
        }
    }

    /// `∧` and `∨` group to the left, `→` groups to the right.
    pub const fn is_right_associative(self) -> bool {
        matches!(self, Self::Implies)
    }
}

const NOT_PRECEDENCE: u8 = 4;
const LEAF_PRECEDENCE: u8 = 5;

/// The value carried by a single tree node, without its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Atom(Atom),
    Top,
    Bottom,
    Not,
    Binary(BinaryOp),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => write!(f, "{atom}"),
            Self::Top => write!(f, "⊤"),
            Self::Bottom => write!(f, "⊥"),
            Self::Not => write!(f, "¬"),
            Self::Binary(op) => write!(f, "{}", op.symbol()),
        }
    }
}

/// One node of a formula tree. The variant shape fixes the arity: leaves carry
/// no children, `Not` owns only its operand, binary connectives own both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Atom(Atom),
    Top,
    Bottom,
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Implies(Box<Node>, Box<Node>),
}

impl Node {
    pub fn not(operand: Node) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        let (left, right) = (Box::new(left), Box::new(right));
        match op {
            BinaryOp::And => Self::And(left, right),
            BinaryOp::Or => Self::Or(left, right),
            BinaryOp::Implies => Self::Implies(left, right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }

    pub fn implies(left: Node, right: Node) -> Self {
        Self::binary(BinaryOp::Implies, left, right)
    }

    pub fn symbol(&self) -> Symbol {
        match self {
            Self::Atom(atom) => Symbol::Atom(*atom),
            Self::Top => Symbol::Top,
            Self::Bottom => Symbol::Bottom,
            Self::Not(_) => Symbol::Not,
            Self::And(..) => Symbol::Binary(BinaryOp::And),
            Self::Or(..) => Symbol::Binary(BinaryOp::Or),
            Self::Implies(..) => Symbol::Binary(BinaryOp::Implies),
        }
    }

    pub fn left(&self) -> Option<&Node> {
        match self {
            Self::And(left, _) | Self::Or(left, _) | Self::Implies(left, _) => Some(&**left),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<&Node> {
        match self {
            Self::Not(operand) => Some(&**operand),
            Self::And(_, right) | Self::Or(_, right) | Self::Implies(_, right) => Some(&**right),
            _ => None,
        }
    }

    /// `X` when this node is `¬X`.
    pub fn negated(&self) -> Option<&Node> {
        match self {
            Self::Not(operand) => Some(&**operand),
            _ => None,
        }
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            stack: vec![(0, self)],
        }
    }

    /// Height of the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        self.preorder()
            .map(|(level, _)| level + 1)
            .max()
            .unwrap_or(0)
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Atom(_) | Self::Top | Self::Bottom => LEAF_PRECEDENCE,
            Self::Not(_) => NOT_PRECEDENCE,
            Self::And(..) => BinaryOp::And.precedence(),
            Self::Or(..) => BinaryOp::Or.precedence(),
            Self::Implies(..) => BinaryOp::Implies.precedence(),
        }
    }

    fn fmt_binary(
        f: &mut fmt::Formatter<'_>,
        op: BinaryOp,
        left: &Node,
        right: &Node,
    ) -> fmt::Result {
        let precedence = op.precedence();
        let left_paren = left.precedence() < precedence
            || (left.precedence() == precedence && op.is_right_associative());
        let right_paren = right.precedence() < precedence
            || (right.precedence() == precedence && !op.is_right_associative());
        left.fmt_operand(f, left_paren)?;
        write!(f, " {} ", op.symbol())?;
        right.fmt_operand(f, right_paren)
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => write!(f, "{atom}"),
            Self::Top => write!(f, "⊤"),
            Self::Bottom => write!(f, "⊥"),
            Self::Not(operand) => {
                write!(f, "¬")?;
                operand.fmt_operand(f, operand.precedence() < NOT_PRECEDENCE)
            }
            Self::And(left, right) => Self::fmt_binary(f, BinaryOp::And, left, right),
            Self::Or(left, right) => Self::fmt_binary(f, BinaryOp::Or, left, right),
            Self::Implies(left, right) => Self::fmt_binary(f, BinaryOp::Implies, left, right),
        }
    }
}

/// Explicit-stack preorder walk yielding `(depth, node)` pairs.
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        if let Some(right) = node.right() {
            self.stack.push((depth + 1, right));
        }
        if let Some(left) = node.left() {
            self.stack.push((depth + 1, left));
        }
        Some((depth, node))
    }
}

/// A parsed formula. Owns its tree; structural equality compares trees only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formula {
    root: Node,
}

impl Formula {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.root, Node::Bottom)
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// One symbol per line, indented two spaces per level.
    pub fn preorder_dump(&self) -> String {
        self.root
            .preorder()
            .map(|(depth, node)| format!("{}{}", "  ".repeat(depth), node.symbol()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Node> for Formula {
    fn from(root: Node) -> Self {
        Self::new(root)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}
