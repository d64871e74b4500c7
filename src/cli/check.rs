use std::marker::PhantomData;
use std::path::PathBuf;

use crate::core::VerifyMode;

use super::{CheckCommand, CliError, InputSource};

pub(super) fn parse_check_command(
    program: &str,
    args: &[String],
) -> Result<CheckCommand, CliError> {
    let state = args
        .iter()
        .enumerate()
        .try_fold(CheckParseState::default(), |state, (index, token)| {
            state.consume(program, args, index, token)
        })?;
    state.finish(program)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CheckStateCore {
    mode: Option<VerifyMode>,
    verbose: bool,
    input: Option<InputSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ModeOptions;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ModePositional;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ExpectAny;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ExpectModeValue;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckParser<M, E> {
    core: CheckStateCore,
    _marker: PhantomData<(M, E)>,
}

impl CheckParser<ModeOptions, ExpectAny> {
    fn consume(
        self,
        program: &str,
        args: &[String],
        index: usize,
        token: &str,
    ) -> Result<CheckParseState, CliError> {
        match classify_options_event(token) {
            OptionsEvent::EndOfOptions => {
                Ok(CheckParseState::PositionalAny(CheckParser::new(self.core)))
            }
            OptionsEvent::ModeOption => {
                self.core.ensure_mode_unset(program)?;
                Ok(CheckParseState::OptionsModeValue(CheckParser::new(
                    self.core,
                )))
            }
            OptionsEvent::ModeInlineValue(value) => {
                self.core.ensure_mode_unset(program)?;
                let mode = parse_verify_mode(program, value)?;
                Ok(CheckParseState::OptionsAny(CheckParser::new(
                    self.core.with_mode(mode),
                )))
            }
            OptionsEvent::VerboseFlag => {
                if self.core.verbose {
                    return Err(CliError::duplicate_option(program, "--verbose"));
                }
                Ok(CheckParseState::OptionsAny(CheckParser::new(
                    CheckStateCore {
                        verbose: true,
                        ..self.core
                    },
                )))
            }
            OptionsEvent::UnexpectedOption(option) => {
                Err(CliError::unexpected_option(program, option.to_string()))
            }
            OptionsEvent::PositionalInput(path) => Ok(CheckParseState::OptionsAny(
                CheckParser::new(self.core.with_input(program, args, index, path)?),
            )),
        }
    }
}

impl<M> CheckParser<M, ExpectAny> {
    fn finish(self) -> CheckCommand {
        self.core.finish()
    }
}

impl CheckParser<ModeOptions, ExpectModeValue> {
    fn consume(self, program: &str, token: &str) -> Result<CheckParseState, CliError> {
        let mode = parse_verify_mode(program, token)?;
        Ok(CheckParseState::OptionsAny(CheckParser::new(
            self.core.with_mode(mode),
        )))
    }
}

impl CheckParser<ModePositional, ExpectAny> {
    fn consume(
        self,
        program: &str,
        args: &[String],
        index: usize,
        token: &str,
    ) -> Result<CheckParseState, CliError> {
        let core = self.core.with_input(program, args, index, token)?;
        Ok(CheckParseState::PositionalAny(CheckParser::new(core)))
    }
}

impl<M, E> CheckParser<M, E> {
    fn new(core: CheckStateCore) -> Self {
        Self {
            core,
            _marker: PhantomData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CheckParseState {
    OptionsAny(CheckParser<ModeOptions, ExpectAny>),
    OptionsModeValue(CheckParser<ModeOptions, ExpectModeValue>),
    PositionalAny(CheckParser<ModePositional, ExpectAny>),
}

impl Default for CheckParseState {
    fn default() -> Self {
        Self::OptionsAny(CheckParser::new(CheckStateCore::default()))
    }
}

impl CheckParseState {
    fn consume(
        self,
        program: &str,
        args: &[String],
        index: usize,
        token: &str,
    ) -> Result<Self, CliError> {
        match self {
            Self::OptionsAny(state) => state.consume(program, args, index, token),
            Self::OptionsModeValue(state) => state.consume(program, token),
            Self::PositionalAny(state) => state.consume(program, args, index, token),
        }
    }

    fn finish(self, program: &str) -> Result<CheckCommand, CliError> {
        match self {
            Self::OptionsAny(state) => Ok(state.finish()),
            Self::PositionalAny(state) => Ok(state.finish()),
            Self::OptionsModeValue(_) => Err(CliError::missing_mode_value(program)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionsEvent<'a> {
    EndOfOptions,
    ModeOption,
    ModeInlineValue(&'a str),
    VerboseFlag,
    UnexpectedOption(&'a str),
    PositionalInput(&'a str),
}

impl CheckStateCore {
    fn ensure_mode_unset(&self, program: &str) -> Result<(), CliError> {
        match self.mode {
            Some(_) => Err(CliError::duplicate_option(program, "--mode")),
            None => Ok(()),
        }
    }

    fn with_mode(self, mode: VerifyMode) -> Self {
        Self {
            mode: Some(mode),
            ..self
        }
    }

    fn with_input(
        self,
        program: &str,
        args: &[String],
        index: usize,
        path: &str,
    ) -> Result<Self, CliError> {
        if self.input.is_some() {
            return Err(CliError::too_many_inputs(program, args[index..].to_vec()));
        }
        Ok(Self {
            input: Some(InputSource::File(PathBuf::from(path))),
            ..self
        })
    }

    fn finish(self) -> CheckCommand {
        CheckCommand {
            mode: self.mode.unwrap_or_default(),
            verbose: self.verbose,
            input: self.input.unwrap_or(InputSource::Stdin),
        }
    }
}

fn parse_verify_mode(program: &str, token: &str) -> Result<VerifyMode, CliError> {
    VerifyMode::try_from(token).map_err(|e| CliError::invalid_mode(program, e))
}

fn classify_options_event(token: &str) -> OptionsEvent<'_> {
    match token {
        "--" => OptionsEvent::EndOfOptions,
        "--mode" => OptionsEvent::ModeOption,
        "--verbose" | "-v" => OptionsEvent::VerboseFlag,
        _ => {
            if let Some(value) = token.strip_prefix("--mode=") {
                OptionsEvent::ModeInlineValue(value)
            } else if token.starts_with('-') {
                OptionsEvent::UnexpectedOption(token)
            } else {
                OptionsEvent::PositionalInput(token)
            }
        }
    }
}
