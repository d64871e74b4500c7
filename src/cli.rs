use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::{ParseVerifyModeError, VerifyMode};

mod check;
mod formula;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub command: Command,
}

impl Cli {
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = args.into_iter().map(Into::into);
        let program = iter.next().unwrap_or_else(|| "natded-rs".to_string());
        let Some(subcommand) = iter.next() else {
            return Err(CliError::missing_subcommand(program));
        };

        let args = iter.collect::<Vec<_>>();
        let command = match subcommand.as_str() {
            "check" => Command::Check(check::parse_check_command(&program, &args)?),
            "formula" => Command::Formula(formula::parse_formula_command(&program, &args)?),
            _ => return Err(CliError::unknown_subcommand(program, subcommand)),
        };
        Ok(Cli { command })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check(CheckCommand),
    Formula(FormulaCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCommand {
    pub mode: VerifyMode,
    pub verbose: bool,
    pub input: InputSource,
}

/// `text` is `None` when the formula is read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaCommand {
    pub tree: bool,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}\n{usage}")]
pub struct CliError {
    kind: CliErrorKind,
    usage: String,
}

impl CliError {
    fn new(program: &str, kind: CliErrorKind) -> Self {
        Self {
            usage: usage_for(program),
            kind,
        }
    }

    fn missing_subcommand(program: String) -> Self {
        Self::new(&program, CliErrorKind::MissingSubcommand)
    }

    fn unknown_subcommand(program: String, subcommand: String) -> Self {
        Self::new(&program, CliErrorKind::UnknownSubcommand { subcommand })
    }

    pub(super) fn missing_mode_value(program: &str) -> Self {
        Self::new(program, CliErrorKind::MissingModeValue)
    }

    pub(super) fn invalid_mode(program: &str, source: ParseVerifyModeError) -> Self {
        Self::new(program, CliErrorKind::InvalidMode { source })
    }

    pub(super) fn unexpected_option(program: &str, option: String) -> Self {
        Self::new(program, CliErrorKind::UnexpectedOption { option })
    }

    pub(super) fn duplicate_option(program: &str, option: &str) -> Self {
        Self::new(
            program,
            CliErrorKind::DuplicateOption {
                option: option.to_string(),
            },
        )
    }

    pub(super) fn too_many_inputs(program: &str, inputs: Vec<String>) -> Self {
        Self::new(program, CliErrorKind::TooManyInputs { inputs })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum CliErrorKind {
    #[error("missing subcommand")]
    MissingSubcommand,
    #[error("unknown subcommand: {subcommand}")]
    UnknownSubcommand { subcommand: String },
    #[error("missing value for --mode")]
    MissingModeValue,
    #[error("{source}")]
    InvalidMode { source: ParseVerifyModeError },
    #[error("unexpected option: {option}")]
    UnexpectedOption { option: String },
    #[error("duplicate option: {option}")]
    DuplicateOption { option: String },
    #[error("too many input files: {}", inputs.join(" "))]
    TooManyInputs { inputs: Vec<String> },
}

fn usage_for(program: &str) -> String {
    format!(
        "Usage:\n  {program} check [--mode fail-fast|collect-all] [--verbose] [--] [file]\n  {program} formula [--tree] [--] [text...]"
    )
}
