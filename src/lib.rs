pub mod cli;
pub mod core;
pub mod deduction;
pub mod formula;

use std::fs::File;
use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::debug;

use crate::cli::{CheckCommand, Cli, Command, FormulaCommand, InputSource};
use crate::core::CheckOptions;
use crate::deduction::{CaseReport, ProofChecker};
use crate::formula::{parse_formula, FormulaError};

#[cfg(test)]
const MAX_INPUT_BYTES: usize = 1024;
#[cfg(not(test))]
const MAX_INPUT_BYTES: usize = 8 * 1024 * 1024;

pub fn run<I, S>(
    args: I,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<(), RunError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = Cli::parse(args)?;
    match cli.command {
        Command::Check(command) => run_check(command, stdin, stdout, stderr),
        Command::Formula(command) => run_formula(command, stdin, stdout),
    }
}

fn run_check(
    command: CheckCommand,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<(), RunError> {
    let source = read_source(&command.input, stdin)?;
    let checker = ProofChecker::new(CheckOptions::default().with_mode(command.mode));
    debug!(
        input = %command.input,
        mode = checker.options().mode.as_str(),
        "checking proofs"
    );

    let mut cases = checker.check_cases(&source);
    if cases.is_empty() {
        cases.push(CaseReport {
            index: 1,
            report: checker.check_source(&source),
            expected: None,
        });
    }

    let total = cases.len();
    let mut failed = 0;
    for case in &cases {
        let prefix = if total > 1 {
            format!("Proof {}: ", case.index)
        } else {
            String::new()
        };
        for line in case.report.verdict.to_string().lines() {
            write_line(stdout, &format!("{prefix}{line}"))?;
        }
        if command.verbose {
            for diagnostic in &case.report.diagnostics {
                write_line(stderr, &format!("{prefix}{diagnostic}"))
                    .map_err(|err| err.with_context("stderr"))?;
            }
        }

        let passed = match &case.expected {
            Some(expected) => {
                let matched = case.matches_expected();
                if !matched {
                    write_line(stdout, &format!("{prefix}expected: {expected}"))?;
                }
                matched
            }
            None => case.report.is_valid(),
        };
        if !passed {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(RunError::Rejected { failed, total });
    }
    Ok(())
}

fn run_formula(
    command: FormulaCommand,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<(), RunError> {
    let text = match command.text {
        Some(text) => text,
        None => read_source(&InputSource::Stdin, stdin)?,
    };
    let formula = parse_formula(text.trim())?;
    write_line(stdout, &formula.to_string())?;
    if command.tree {
        write_line(stdout, &formula.preorder_dump())?;
    }
    Ok(())
}

fn write_line(out: &mut dyn Write, text: &str) -> Result<(), RunError> {
    writeln!(out, "{text}").map_err(|source| RunError::Io {
        source,
        context: "stdout".to_string(),
    })
}

fn read_source(input: &InputSource, stdin: &mut dyn Read) -> Result<String, RunError> {
    match input {
        InputSource::Stdin => read_limited_utf8(stdin, "stdin"),
        InputSource::File(path) => {
            let context = path.display().to_string();
            let mut file = File::open(path).map_err(|source| RunError::Io {
                source,
                context: context.clone(),
            })?;
            read_limited_utf8(&mut file, &context)
        }
    }
}

fn read_limited_utf8(reader: &mut dyn Read, context: &str) -> Result<String, RunError> {
    let mut bytes = Vec::new();
    let mut limited_reader = reader.take((MAX_INPUT_BYTES + 1) as u64);
    limited_reader
        .read_to_end(&mut bytes)
        .map_err(|source| RunError::Io {
            source,
            context: context.to_string(),
        })?;
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(RunError::InputTooLarge {
            context: context.to_string(),
            max_bytes: MAX_INPUT_BYTES,
        });
    }

    String::from_utf8(bytes).map_err(|_| RunError::InvalidUtf8 {
        context: context.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Cli(#[from] cli::CliError),

    #[error("I/O error ({context}): {source}")]
    Io { source: io::Error, context: String },

    #[error("input too large ({context}): limit is {max_bytes} bytes")]
    InputTooLarge { context: String, max_bytes: usize },

    #[error("input is not valid UTF-8 ({context})")]
    InvalidUtf8 { context: String },

    #[error("invalid formula: {0}")]
    Formula(#[from] FormulaError),

    #[error("{failed} of {total} proof(s) rejected")]
    Rejected { failed: usize, total: usize },
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Cli(_) => 2,
            Self::Io { .. }
            | Self::InputTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::Formula(_)
            | Self::Rejected { .. } => 1,
        }
    }

    fn with_context(self, context: &str) -> Self {
        match self {
            Self::Io { source, .. } => Self::Io {
                source,
                context: context.to_string(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run, RunError, MAX_INPUT_BYTES};

    struct Output {
        result: Result<(), RunError>,
        stdout: String,
        stderr: String,
    }

    fn run_with_stdin(args: &[&str], input: &str) -> Output {
        let mut stdin = input.as_bytes();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run(args.iter().copied(), &mut stdin, &mut out, &mut err);
        Output {
            result,
            stdout: String::from_utf8(out).expect("stdout should be utf-8"),
            stderr: String::from_utf8(err).expect("stderr should be utf-8"),
        }
    }

    #[test]
    fn checks_single_proof_from_stdin() {
        let output = run_with_stdin(
            &["natded-rs", "check"],
            include_str!("../proofs/implies_intro.nd"),
        );
        assert!(output.result.is_ok());
        assert_eq!(output.stdout, "Valid Deduction\n");
    }

    #[test]
    fn invalid_proof_exits_with_one() {
        let output = run_with_stdin(
            &["natded-rs", "check"],
            include_str!("../proofs/sibling_scope.nd"),
        );
        assert_eq!(output.stdout, "Invalid Deduction at Line 5\n");
        let err = output.result.expect_err("invalid proof should fail");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "1 of 1 proof(s) rejected");
    }

    #[test]
    fn verbose_writes_diagnostics_to_stderr() {
        let output = run_with_stdin(
            &["natded-rs", "check", "--verbose", "--mode", "collect-all"],
            include_str!("../proofs/many_errors.nd"),
        );
        assert!(output.result.is_err());
        assert_eq!(output.stdout.lines().count(), 3);
        assert!(output
            .stderr
            .lines()
            .next()
            .is_some_and(|line| line.starts_with("rule violation: ")));
        assert!(output.stderr.contains("(proof line 4)"));
    }

    #[test]
    fn prefixes_each_proof_of_a_harness_file() {
        let output = run_with_stdin(&["natded-rs", "check"], include_str!("../proofs/harness.nd"));
        assert!(output.result.is_ok(), "every expected verdict matches");
        let lines = output.stdout.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Proof 1: Valid Deduction");
        assert_eq!(lines[1], "Proof 2: Invalid Deduction at Line 2");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn reports_expected_verdict_mismatch() {
        let source = "input:\n1 p    Premise\noutput:\nInvalid Deduction at Line 1\n";
        let output = run_with_stdin(&["natded-rs", "check"], source);
        assert!(matches!(
            output.result,
            Err(RunError::Rejected {
                failed: 1,
                total: 1
            })
        ));
        assert_eq!(
            output.stdout,
            "Valid Deduction\nexpected: Invalid Deduction at Line 1\n"
        );
    }

    #[test]
    fn empty_input_is_a_valid_empty_proof() {
        let output = run_with_stdin(&["natded-rs", "check"], "");
        assert!(output.result.is_ok());
        assert_eq!(output.stdout, "Valid Deduction\n");
    }

    #[test]
    fn prints_canonical_formula_and_tree() {
        let output = run_with_stdin(&["natded-rs", "formula", "--tree", "(p & q) -> ~r"], "");
        assert!(output.result.is_ok());
        assert_eq!(output.stdout, "p ∧ q → ¬r\n→\n  ∧\n    p\n    q\n  ¬\n    r\n");
    }

    #[test]
    fn reads_formula_from_stdin() {
        let output = run_with_stdin(&["natded-rs", "formula"], "((p))\n");
        assert!(output.result.is_ok());
        assert_eq!(output.stdout, "p\n");
    }

    #[test]
    fn formula_errors_exit_with_one() {
        let output = run_with_stdin(&["natded-rs", "formula", "p", "∧"], "");
        let err = output.result.expect_err("formula should fail");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "invalid formula: missing right operand for '∧' at column 3"
        );
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let output = run_with_stdin(&["natded-rs", "check", "--mode", "lazy"], "");
        let err = output.result.expect_err("usage should fail");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Usage:"));
    }

    #[test]
    fn rejects_oversized_input() {
        let input = "a".repeat(MAX_INPUT_BYTES + 1);
        let output = run_with_stdin(&["natded-rs", "check"], &input);
        assert!(matches!(
            output.result,
            Err(RunError::InputTooLarge { max_bytes, .. }) if max_bytes == MAX_INPUT_BYTES
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut stdin = &[0xff_u8, 0xfe][..];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run(["natded-rs", "check"], &mut stdin, &mut out, &mut err);
        assert!(matches!(result, Err(RunError::InvalidUtf8 { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let output = run_with_stdin(&["natded-rs", "check", "does/not/exist.nd"], "");
        let err = output.result.expect_err("missing file should fail");
        assert!(matches!(err, RunError::Io { .. }));
        assert!(err.to_string().starts_with("I/O error (does/not/exist.nd)"));
    }
}
