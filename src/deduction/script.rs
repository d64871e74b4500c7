use std::fmt;

use tracing::trace;

use crate::core::{CheckError, SourceSpan};
use crate::formula::{parse_formula_with_limit, Formula};

use super::rules::Rule;

const BEGIN_SCOPE: &str = "BeginScope";
const END_SCOPE: &str = "EndScope";
const CASE_SEPARATOR: &str = "---";
const INPUT_MARKER: &str = "input:";
const OUTPUT_MARKER: &str = "output:";
const CLAUSE_GAP: usize = 4;

/// One line of script text together with its 1-based position in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

pub fn source_lines(source: &str) -> Vec<SourceLine<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| SourceLine {
            number: index + 1,
            text,
        })
        .collect()
}

/// One proof out of a script file, with the verdict a test harness expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofCase<'a> {
    pub index: usize,
    pub lines: Vec<SourceLine<'a>>,
    pub expected: Option<String>,
}

/// Splits a script into proofs separated by `---` lines. Inside a proof an
/// `input:` marker is skipped and everything after `output:` is taken as the
/// expected verdict.
pub fn split_cases(source: &str) -> Vec<ProofCase<'_>> {
    let mut cases = Vec::new();
    let mut builder = CaseBuilder::default();

    for line in source_lines(source) {
        let trimmed = line.text.trim();
        if trimmed == CASE_SEPARATOR {
            builder.finish_into(&mut cases);
            continue;
        }
        if builder.in_output {
            if !trimmed.is_empty() {
                builder.expected.push(trimmed.to_owned());
            }
        } else if trimmed == OUTPUT_MARKER {
            builder.in_output = true;
        } else if trimmed != INPUT_MARKER {
            builder.lines.push(line);
        }
    }
    builder.finish_into(&mut cases);

    cases
}

#[derive(Debug, Default)]
struct CaseBuilder<'a> {
    lines: Vec<SourceLine<'a>>,
    expected: Vec<String>,
    in_output: bool,
}

impl<'a> CaseBuilder<'a> {
    fn finish_into(&mut self, cases: &mut Vec<ProofCase<'a>>) {
        let builder = std::mem::take(self);
        let has_content = builder
            .lines
            .iter()
            .any(|line| !is_layout(line.text.trim()));
        if !has_content && builder.expected.is_empty() {
            return;
        }
        cases.push(ProofCase {
            index: cases.len() + 1,
            lines: builder.lines,
            expected: (!builder.expected.is_empty()).then(|| builder.expected.join("\n")),
        });
    }
}

fn is_layout(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("//")
}

/// A structural item of a proof script. Numbered lines keep their body as
/// text so that formula errors stay attached to that line only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem<'a> {
    BeginScope { span: SourceSpan },
    EndScope { span: SourceSpan },
    Line(RawLine<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub number: u32,
    pub body: &'a str,
    pub span: SourceSpan,
}

pub fn read_script<'a>(lines: &[SourceLine<'a>]) -> Result<Vec<ScriptItem<'a>>, CheckError> {
    let mut items = Vec::new();
    for line in lines {
        let trimmed = line.text.trim();
        if is_layout(trimmed) {
            continue;
        }
        let span = SourceSpan {
            line: line.number,
            column: leading_column(line.text),
        };
        let item = match trimmed {
            BEGIN_SCOPE => ScriptItem::BeginScope { span },
            END_SCOPE => ScriptItem::EndScope { span },
            _ => ScriptItem::Line(read_numbered_line(trimmed, span)?),
        };
        trace!(line = line.number, ?item, "read script item");
        items.push(item);
    }
    Ok(items)
}

fn leading_column(text: &str) -> usize {
    text.chars().take_while(|ch| ch.is_whitespace()).count() + 1
}

fn read_numbered_line(trimmed: &str, span: SourceSpan) -> Result<RawLine<'_>, CheckError> {
    let (number_text, body) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let number = number_text
        .parse::<u32>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| {
            CheckError::syntax(format!(
                "expected a positive line number, 'BeginScope' or 'EndScope', found '{number_text}'"
            ))
            .with_span(span.clone())
        })?;
    Ok(RawLine {
        number,
        body: body.trim(),
        span,
    })
}

/// A reference cited by a rule: a single line or a closed scope `start-end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    Line(u32),
    Scope { start: u32, end: u32 },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(number) => write!(f, "{number}"),
            Self::Scope { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// The parsed body of a numbered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBody {
    pub formula: Formula,
    pub rule: Rule,
    pub references: Vec<Reference>,
}

/// Splits `<formula>    <rule>, <ref>, ...` at the first gap of four or more
/// whitespace characters (or a tab). Without such a gap the formula is the
/// first whitespace-free token.
pub fn parse_line_body(body: &str, max_formula_depth: usize) -> Result<LineBody, CheckError> {
    let (formula_text, clause) = split_formula_and_clause(body);
    if clause.is_empty() {
        return Err(CheckError::syntax(
            "missing rule clause (separate it from the formula by four or more spaces)",
        ));
    }

    let formula = parse_formula_with_limit(formula_text, max_formula_depth)?;
    let mut parts = clause.split(',').map(str::trim);
    let rule_name = parts.next().unwrap_or_default();
    let rule = Rule::parse(rule_name).ok_or_else(|| {
        CheckError::rule_violation(format!(
            "No such rule: {rule_name} (available: {}; fix: replace the rule name before the references)",
            Rule::available_names()
        ))
    })?;
    let references = parts.map(parse_reference).collect::<Result<Vec<_>, _>>()?;

    Ok(LineBody {
        formula,
        rule,
        references,
    })
}

fn split_formula_and_clause(body: &str) -> (&str, &str) {
    let body = body.trim();
    if let Some(start) = find_clause_gap(body) {
        return (body[..start].trim_end(), body[start..].trim_start());
    }
    match body.split_once(char::is_whitespace) {
        Some((formula, clause)) => (formula, clause.trim_start()),
        None => (body, ""),
    }
}

/// Byte offset of the first run of `CLAUSE_GAP` whitespace characters, or of
/// the first tab.
fn find_clause_gap(body: &str) -> Option<usize> {
    let mut gap_start: Option<usize> = None;
    let mut run = 0;
    for (index, ch) in body.char_indices() {
        if ch.is_whitespace() {
            let start = *gap_start.get_or_insert(index);
            run += 1;
            if run >= CLAUSE_GAP || ch == '\t' {
                return Some(start);
            }
        } else {
            gap_start = None;
            run = 0;
        }
    }
    None
}

fn parse_reference(text: &str) -> Result<Reference, CheckError> {
    let parse_number = |raw: &str| {
        raw.trim()
            .parse::<u32>()
            .map_err(|_| CheckError::syntax(format!("invalid reference: '{text}'")))
    };

    if text.is_empty() {
        return Err(CheckError::syntax("empty reference in rule clause"));
    }
    match text.split_once('-') {
        Some((start, end)) => Ok(Reference::Scope {
            start: parse_number(start)?,
            end: parse_number(end)?,
        }),
        None => parse_number(text).map(Reference::Line),
    }
}
