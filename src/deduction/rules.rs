use std::fmt;

use crate::core::CheckError;
use crate::formula::{Formula, Node};

use super::table::{Cited, CitedScope};

/// Justification tag of a proof line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Premise,
    Assumption,
    Copy,
    AndIntro,
    AndElim1,
    AndElim2,
    OrIntro1,
    OrIntro2,
    OrElim,
    ImpliesIntro,
    ImpliesElim,
    NotIntro,
    NotElim,
    BottomElim,
    DoubleNegElim,
    ModusTollens,
    DoubleNegIntro,
    Pbc,
    Lem,
}

const ALL_RULES: [Rule; 19] = [
    Rule::Premise,
    Rule::Assumption,
    Rule::Copy,
    Rule::AndIntro,
    Rule::AndElim1,
    Rule::AndElim2,
    Rule::OrIntro1,
    Rule::OrIntro2,
    Rule::OrElim,
    Rule::ImpliesIntro,
    Rule::ImpliesElim,
    Rule::NotIntro,
    Rule::NotElim,
    Rule::BottomElim,
    Rule::DoubleNegElim,
    Rule::ModusTollens,
    Rule::DoubleNegIntro,
    Rule::Pbc,
    Rule::Lem,
];

impl Rule {
    /// Accepts the symbolic tag (`∧i`, `→e`, ...) or its ASCII spelling
    /// (`AndI`, `ImpE`, ...). Word tags are matched case-insensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        if let Some(rule) = ALL_RULES.into_iter().find(|rule| rule.name() == tag) {
            return Some(rule);
        }
        ALL_RULES.into_iter().find(|rule| {
            (rule.name().is_ascii() && rule.name().eq_ignore_ascii_case(tag))
                || rule
                    .ascii_alias()
                    .is_some_and(|alias| alias.eq_ignore_ascii_case(tag))
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Premise => "Premise",
            Self::Assumption => "Assumption",
            Self::Copy => "Copy",
            Self::AndIntro => "∧i",
            Self::AndElim1 => "∧e1",
            Self::AndElim2 => "∧e2",
            Self::OrIntro1 => "∨i1",
            Self::OrIntro2 => "∨i2",
            Self::OrElim => "∨e",
            Self::ImpliesIntro => "→i",
            Self::ImpliesElim => "→e",
            Self::NotIntro => "¬i",
            Self::NotElim => "¬e",
            Self::BottomElim => "⊥e",
            Self::DoubleNegElim => "¬¬e",
            Self::ModusTollens => "MT",
            Self::DoubleNegIntro => "¬¬i",
            Self::Pbc => "PBC",
            Self::Lem => "LEM",
        }
    }

    const fn ascii_alias(self) -> Option<&'static str> {
        match self {
            Self::AndIntro => Some("AndI"),
            Self::AndElim1 => Some("AndE1"),
            Self::AndElim2 => Some("AndE2"),
            Self::OrIntro1 => Some("OrI1"),
            Self::OrIntro2 => Some("OrI2"),
            Self::OrElim => Some("OrE"),
            Self::ImpliesIntro => Some("ImpI"),
            Self::ImpliesElim => Some("ImpE"),
            Self::NotIntro => Some("NotI"),
            Self::NotElim => Some("NotE"),
            Self::BottomElim => Some("BotE"),
            Self::DoubleNegElim => Some("NotNotE"),
            Self::DoubleNegIntro => Some("NotNotI"),
            Self::Premise
            | Self::Assumption
            | Self::Copy
            | Self::ModusTollens
            | Self::Pbc
            | Self::Lem => None,
        }
    }

    /// Premise and Assumption lines are accepted without a rule check.
    pub const fn is_given(self) -> bool {
        matches!(self, Self::Premise | Self::Assumption)
    }

    pub fn available_names() -> String {
        ALL_RULES
            .iter()
            .map(|rule| rule.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a rule may look at: the validated citations, in the order
/// they were written, and the formula the line asserts.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub cited: &'a [Cited<'a>],
    pub target: &'a Formula,
}

/// Evaluates `rule` and returns the formula it derives. The caller compares
/// the result with the asserted formula.
pub fn apply(rule: Rule, ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    match rule {
        Rule::Premise | Rule::Assumption => Ok(ctx.target.clone()),
        Rule::Copy => one_line(rule, ctx.cited).cloned(),
        Rule::AndIntro => and_intro(ctx),
        Rule::AndElim1 => and_elim(rule, ctx, Side::Left),
        Rule::AndElim2 => and_elim(rule, ctx, Side::Right),
        Rule::OrIntro1 => or_intro(rule, ctx, Side::Left),
        Rule::OrIntro2 => or_intro(rule, ctx, Side::Right),
        Rule::OrElim => or_elim(ctx),
        Rule::ImpliesIntro => implies_intro(ctx),
        Rule::ImpliesElim => implies_elim(ctx),
        Rule::NotIntro => not_intro(ctx),
        Rule::NotElim => not_elim(ctx),
        Rule::BottomElim => bottom_elim(ctx),
        Rule::DoubleNegElim => double_neg_elim(ctx),
        Rule::ModusTollens => modus_tollens(ctx),
        Rule::DoubleNegIntro => double_neg_intro(ctx),
        Rule::Pbc => pbc(ctx),
        Rule::Lem => lem(ctx),
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Line,
    Scope,
}

impl Slot {
    const fn describe(self) -> &'static str {
        match self {
            Self::Line => "a line number",
            Self::Scope => "a scope range start-end",
        }
    }
}

fn describe_shape(shape: &[Slot]) -> String {
    if shape.is_empty() {
        return "no references".to_string();
    }
    shape
        .iter()
        .map(|slot| slot.describe())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_cited(cited: &Cited<'_>) -> String {
    match cited {
        Cited::Line(record) => format!("line {}", record.number),
        Cited::Scope(scope) => format!("scope {}-{}", scope.start.number, scope.end.number),
    }
}

/// Explains why `cited` does not fit `shape`.
fn shape_error(rule: Rule, cited: &[Cited<'_>], shape: &[Slot]) -> CheckError {
    if cited.len() != shape.len() {
        return CheckError::rule_violation(format!(
            "The number of references is wrong: {rule} (expected: {}, actual: {}; fix: cite exactly {})",
            shape.len(),
            cited.len(),
            describe_shape(shape)
        ));
    }
    let mismatch = cited.iter().zip(shape).enumerate().find(|(_, (cited, slot))| {
        let actual = match cited {
            Cited::Line(_) => Slot::Line,
            Cited::Scope(_) => Slot::Scope,
        };
        actual != **slot
    });
    match mismatch {
        Some((index, (cited, slot))) => CheckError::rule_violation(format!(
            "The kind of reference {} is wrong: {rule} (expected: {}, actual: {}; fix: cite {})",
            index + 1,
            slot.describe(),
            describe_cited(cited),
            describe_shape(shape)
        )),
        None => CheckError::rule_violation(format!(
            "The references do not fit: {rule} (expected: {})",
            describe_shape(shape)
        )),
    }
}

fn wrong_form(rule: Rule, what: &str, expected: &str, actual: &Formula) -> CheckError {
    CheckError::rule_violation(format!(
        "The form of {what} is wrong: {rule} (expected: {expected}, actual: {actual}; fix: cite a line of the expected shape)"
    ))
}

fn wrong_application(rule: Rule, detail: String) -> CheckError {
    CheckError::rule_violation(format!("Wrong rule application: {rule} ({detail})"))
}

fn no_references(rule: Rule, cited: &[Cited<'_>]) -> Result<(), CheckError> {
    if cited.is_empty() {
        Ok(())
    } else {
        Err(shape_error(rule, cited, &[]))
    }
}

fn one_line<'c>(rule: Rule, cited: &'c [Cited<'c>]) -> Result<&'c Formula, CheckError> {
    match cited {
        [Cited::Line(line)] => Ok(&line.formula),
        _ => Err(shape_error(rule, cited, &[Slot::Line])),
    }
}

fn two_lines<'c>(
    rule: Rule,
    cited: &'c [Cited<'c>],
) -> Result<(&'c Formula, &'c Formula), CheckError> {
    match cited {
        [Cited::Line(first), Cited::Line(second)] => Ok((&first.formula, &second.formula)),
        _ => Err(shape_error(rule, cited, &[Slot::Line, Slot::Line])),
    }
}

fn one_scope<'c>(rule: Rule, cited: &'c [Cited<'c>]) -> Result<&'c CitedScope<'c>, CheckError> {
    match cited {
        [Cited::Scope(scope)] => Ok(scope),
        _ => Err(shape_error(rule, cited, &[Slot::Scope])),
    }
}

fn line_and_two_scopes<'c>(
    rule: Rule,
    cited: &'c [Cited<'c>],
) -> Result<(&'c Formula, &'c CitedScope<'c>, &'c CitedScope<'c>), CheckError> {
    match cited {
        [Cited::Line(line), Cited::Scope(first), Cited::Scope(second)] => {
            Ok((&line.formula, first, second))
        }
        _ => Err(shape_error(
            rule,
            cited,
            &[Slot::Line, Slot::Scope, Slot::Scope],
        )),
    }
}

/// The cited scope must open with an Assumption; returns its first and last formulas.
fn assumption_and_conclusion<'c>(
    rule: Rule,
    scope: &'c CitedScope<'c>,
) -> Result<(&'c Formula, &'c Formula), CheckError> {
    if scope.start.rule != Rule::Assumption {
        return Err(wrong_application(
            rule,
            format!(
                "line {} opens the scope with {} instead of Assumption",
                scope.start.number, scope.start.rule
            ),
        ));
    }
    Ok((&scope.start.formula, &scope.end.formula))
}

fn and_intro(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let (left, right) = two_lines(Rule::AndIntro, ctx.cited)?;
    Ok(Formula::new(Node::and(
        left.root().clone(),
        right.root().clone(),
    )))
}

fn and_elim(rule: Rule, ctx: RuleContext<'_>, side: Side) -> Result<Formula, CheckError> {
    let conjunction = one_line(rule, ctx.cited)?;
    match (conjunction.root(), side) {
        (Node::And(left, _), Side::Left) => Ok(Formula::new((**left).clone())),
        (Node::And(_, right), Side::Right) => Ok(Formula::new((**right).clone())),
        _ => Err(wrong_form(rule, "the cited formula", "A ∧ B", conjunction)),
    }
}

fn or_intro(rule: Rule, ctx: RuleContext<'_>, side: Side) -> Result<Formula, CheckError> {
    let disjunct = one_line(rule, ctx.cited)?;
    let Node::Or(left, right) = ctx.target.root() else {
        return Err(wrong_form(rule, "the asserted formula", "A ∨ B", ctx.target));
    };
    let (kept, position) = match side {
        Side::Left => (left, "left"),
        Side::Right => (right, "right"),
    };
    if **kept == *disjunct.root() {
        Ok(ctx.target.clone())
    } else {
        Err(wrong_application(
            rule,
            format!("the {position} disjunct {kept} does not match the cited {disjunct}"),
        ))
    }
}

fn or_elim(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::OrElim;
    let (disjunction, first, second) = line_and_two_scopes(rule, ctx.cited)?;
    let Node::Or(left, right) = disjunction.root() else {
        return Err(wrong_form(rule, "the cited formula", "A ∨ B", disjunction));
    };
    let (first_assumption, first_conclusion) = assumption_and_conclusion(rule, first)?;
    let (second_assumption, second_conclusion) = assumption_and_conclusion(rule, second)?;

    if *first_assumption.root() != **left {
        return Err(wrong_application(
            rule,
            format!(
                "the first scope assumes {first_assumption} instead of the left disjunct {left}"
            ),
        ));
    }
    if *second_assumption.root() != **right {
        return Err(wrong_application(
            rule,
            format!(
                "the second scope assumes {second_assumption} instead of the right disjunct {right}"
            ),
        ));
    }
    if first.level != second.level {
        return Err(wrong_application(
            rule,
            format!(
                "the scopes sit at different levels ({} and {})",
                first.level, second.level
            ),
        ));
    }
    if first_conclusion != second_conclusion {
        return Err(wrong_application(
            rule,
            format!("the scopes conclude {first_conclusion} and {second_conclusion}"),
        ));
    }
    Ok(first_conclusion.clone())
}

fn implies_intro(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::ImpliesIntro;
    let scope = one_scope(rule, ctx.cited)?;
    let (assumption, conclusion) = assumption_and_conclusion(rule, scope)?;
    Ok(Formula::new(Node::implies(
        assumption.root().clone(),
        conclusion.root().clone(),
    )))
}

/// `Y` when one formula is `X → Y` and the other is `X`, in either order.
fn implies_elim(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::ImpliesElim;
    let (first, second) = two_lines(rule, ctx.cited)?;
    let consequent = |implication: &Formula, premise: &Formula| match implication.root() {
        Node::Implies(antecedent, consequent) if **antecedent == *premise.root() => {
            Some(Formula::new((**consequent).clone()))
        }
        _ => None,
    };
    consequent(first, second)
        .or_else(|| consequent(second, first))
        .ok_or_else(|| {
            wrong_application(
                rule,
                format!(
                    "neither {first} nor {second} is an implication whose antecedent is the other"
                ),
            )
        })
}

fn not_intro(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::NotIntro;
    let scope = one_scope(rule, ctx.cited)?;
    let (assumption, conclusion) = assumption_and_conclusion(rule, scope)?;
    if !conclusion.is_bottom() {
        return Err(wrong_form(rule, "the scope's last line", "⊥", conclusion));
    }
    Ok(Formula::new(Node::not(assumption.root().clone())))
}

fn not_elim(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::NotElim;
    let (first, second) = two_lines(rule, ctx.cited)?;
    let contradicts =
        |negation: &Formula, other: &Formula| negation.root().negated() == Some(other.root());
    if contradicts(first, second) || contradicts(second, first) {
        Ok(Formula::new(Node::Bottom))
    } else {
        Err(wrong_application(
            rule,
            format!("{first} and {second} are not a formula and its negation"),
        ))
    }
}

fn bottom_elim(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::BottomElim;
    let cited = one_line(rule, ctx.cited)?;
    if cited.is_bottom() {
        Ok(ctx.target.clone())
    } else {
        Err(wrong_form(rule, "the cited formula", "⊥", cited))
    }
}

fn double_neg_elim(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::DoubleNegElim;
    let cited = one_line(rule, ctx.cited)?;
    match cited.root().negated().and_then(Node::negated) {
        Some(inner) => Ok(Formula::new(inner.clone())),
        None => Err(wrong_form(rule, "the cited formula", "¬¬A", cited)),
    }
}

fn double_neg_intro(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let cited = one_line(Rule::DoubleNegIntro, ctx.cited)?;
    Ok(Formula::new(Node::not(Node::not(cited.root().clone()))))
}

/// `¬A` from `A → B` and `¬B`, in either order.
fn modus_tollens(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::ModusTollens;
    let (first, second) = two_lines(rule, ctx.cited)?;
    let negated_antecedent = |implication: &Formula, denial: &Formula| match implication.root() {
        Node::Implies(antecedent, consequent)
            if denial.root().negated() == Some(&**consequent) =>
        {
            Some(Formula::new(Node::not((**antecedent).clone())))
        }
        _ => None,
    };
    negated_antecedent(first, second)
        .or_else(|| negated_antecedent(second, first))
        .ok_or_else(|| {
            wrong_application(
                rule,
                format!(
                    "{first} and {second} are not an implication and the negation of its consequent"
                ),
            )
        })
}

fn pbc(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::Pbc;
    let scope = one_scope(rule, ctx.cited)?;
    let (assumption, conclusion) = assumption_and_conclusion(rule, scope)?;
    let Some(refuted) = assumption.root().negated() else {
        return Err(wrong_form(rule, "the scope's assumption", "¬A", assumption));
    };
    if !conclusion.is_bottom() {
        return Err(wrong_form(rule, "the scope's last line", "⊥", conclusion));
    }
    Ok(Formula::new(refuted.clone()))
}

/// Accepts `A ∨ ¬A` or `¬A ∨ A` with no references.
fn lem(ctx: RuleContext<'_>) -> Result<Formula, CheckError> {
    let rule = Rule::Lem;
    no_references(rule, ctx.cited)?;
    let Node::Or(left, right) = ctx.target.root() else {
        return Err(wrong_form(rule, "the asserted formula", "A ∨ ¬A", ctx.target));
    };
    if right.negated() == Some(&**left) || left.negated() == Some(&**right) {
        Ok(ctx.target.clone())
    } else {
        Err(wrong_form(rule, "the asserted formula", "A ∨ ¬A", ctx.target))
    }
}
