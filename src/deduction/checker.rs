use std::fmt;

use tracing::{debug, trace};

use crate::core::{CheckError, CheckOptions, VerifyMode};
use crate::formula::Formula;

use super::rules::{self, Rule, RuleContext};
use super::scope::ScopeTracker;
use super::script::{
    parse_line_body, read_script, source_lines, split_cases, RawLine, Reference, ScriptItem,
    SourceLine,
};
use super::table::{LineRecord, LineTable, Vantage};

/// Outcome of checking one proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Line numbers that failed, in proof order.
    Invalid { lines: Vec<u32> },
    UnmatchedEndScope,
    UnclosedScopes,
    /// The script could not be split into scope markers and numbered lines.
    Malformed(CheckError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid Deduction"),
            Self::Invalid { lines } => {
                let rendered = lines
                    .iter()
                    .map(|number| format!("Invalid Deduction at Line {number}"))
                    .collect::<Vec<_>>();
                write!(f, "{}", rendered.join("\n"))
            }
            Self::UnmatchedEndScope => {
                write!(f, "Invalid scope nesting: EndScope without matching BeginScope")
            }
            Self::UnclosedScopes => write!(f, "Invalid Deduction: Unclosed scopes"),
            Self::Malformed(err) => write!(f, "Error: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofReport {
    pub verdict: Verdict,
    /// Every error met while checking, in the order it was found.
    pub diagnostics: Vec<CheckError>,
}

impl ProofReport {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }
}

/// One proof of a multi-proof script together with the verdict its file expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub index: usize,
    pub report: ProofReport,
    pub expected: Option<String>,
}

impl CaseReport {
    /// `false` only when an expected verdict is given and differs.
    pub fn matches_expected(&self) -> bool {
        self.expected
            .as_deref()
            .map_or(true, |expected| expected == self.report.verdict.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProofChecker {
    options: CheckOptions,
}

impl ProofChecker {
    pub fn new(options: CheckOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CheckOptions {
        self.options
    }

    /// Checks `source` as a single proof.
    pub fn check_source(&self, source: &str) -> ProofReport {
        self.check_lines(&source_lines(source))
    }

    /// Checks every `---`-separated proof of a script.
    pub fn check_cases(&self, source: &str) -> Vec<CaseReport> {
        split_cases(source)
            .into_iter()
            .map(|case| {
                debug!(case = case.index, lines = case.lines.len(), "checking proof");
                CaseReport {
                    index: case.index,
                    report: self.check_lines(&case.lines),
                    expected: case.expected,
                }
            })
            .collect()
    }

    pub fn check_lines(&self, lines: &[SourceLine<'_>]) -> ProofReport {
        let items = match read_script(lines) {
            Ok(items) => items,
            Err(err) => {
                debug!(error = %err, "script is malformed");
                return ProofReport {
                    verdict: Verdict::Malformed(err.clone()),
                    diagnostics: vec![err],
                };
            }
        };

        let mut state = ProofState::new(self.options);
        for item in items {
            match item {
                ScriptItem::BeginScope { .. } => {
                    state.scopes.begin();
                }
                ScriptItem::EndScope { span } => {
                    if let Err(err) = state.scopes.end(state.last_number) {
                        debug!(error = %err, "proof aborted");
                        state.diagnostics.push(err.with_span(span));
                        return state.finish_with(Verdict::UnmatchedEndScope);
                    }
                }
                ScriptItem::Line(raw) => {
                    if let Err(err) = state.check_line(&raw) {
                        let err = err.with_proof_line(raw.number).with_span(raw.span.clone());
                        debug!(line = raw.number, error = %err, "line rejected");
                        state.invalid.push(raw.number);
                        state.diagnostics.push(err);
                        if self.options.mode == VerifyMode::FailFast {
                            state.halted = true;
                            break;
                        }
                    }
                }
            }
        }

        state.finish()
    }
}

struct ProofState {
    options: CheckOptions,
    table: LineTable,
    scopes: ScopeTracker,
    last_number: Option<u32>,
    invalid: Vec<u32>,
    diagnostics: Vec<CheckError>,
    halted: bool,
}

impl ProofState {
    fn new(options: CheckOptions) -> Self {
        Self {
            options,
            table: LineTable::new(),
            scopes: ScopeTracker::new(),
            last_number: None,
            invalid: Vec::new(),
            diagnostics: Vec::new(),
            halted: false,
        }
    }

    fn check_line(&mut self, raw: &RawLine<'_>) -> Result<(), CheckError> {
        if let Some(previous) = self.last_number.filter(|previous| raw.number <= *previous) {
            return Err(CheckError::syntax(format!(
                "line number {} does not follow line {previous}",
                raw.number
            )));
        }
        self.last_number = Some(raw.number);

        let body = parse_line_body(raw.body, self.options.max_formula_depth)?;
        let rule = body.rule;
        let at = Vantage {
            number: raw.number,
            scope_level: self.scopes.depth(),
            frame: self.scopes.innermost(),
        };
        if rule == Rule::Assumption {
            self.scopes.bind_assumption(raw.number);
        }

        let outcome = if rule.is_given() {
            Ok(())
        } else {
            self.evaluate(&body.formula, rule, &body.references, at)
        };

        // Lines that failed their rule stay visible to later lines.
        trace!(line = raw.number, level = at.scope_level, "entering line");
        self.table.insert(LineRecord {
            number: raw.number,
            formula: body.formula,
            rule,
            scope_level: at.scope_level,
            frame: at.frame,
        });
        if outcome.is_ok() {
            debug!(line = raw.number, %rule, "line accepted");
        }
        outcome
    }

    fn evaluate(
        &self,
        asserted: &Formula,
        rule: Rule,
        references: &[Reference],
        at: Vantage,
    ) -> Result<(), CheckError> {
        let cited = self.table.resolve_all(references, at, &self.scopes)?;
        let derived = rules::apply(
            rule,
            RuleContext {
                cited: &cited,
                target: asserted,
            },
        )?;
        if derived == *asserted {
            Ok(())
        } else {
            Err(CheckError::rule_violation(format!(
                "The derived formula does not match: {rule} (derived: {derived}, asserted: {asserted}; fix: assert the formula the rule produces)"
            )))
        }
    }

    fn finish(mut self) -> ProofReport {
        let open = self.scopes.depth();
        if open > 0 && !self.halted {
            self.diagnostics.push(CheckError::scope(format!(
                "{open} scope(s) still open at the end of the proof"
            )));
        }

        let verdict = if !self.invalid.is_empty() {
            Verdict::Invalid {
                lines: std::mem::take(&mut self.invalid),
            }
        } else if open > 0 {
            Verdict::UnclosedScopes
        } else {
            Verdict::Valid
        };
        self.finish_with(verdict)
    }

    fn finish_with(self, verdict: Verdict) -> ProofReport {
        debug!(%verdict, lines = self.table.len(), "proof checked");
        ProofReport {
            verdict,
            diagnostics: self.diagnostics,
        }
    }
}
