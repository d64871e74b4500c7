use super::{CliError, FormulaCommand};

/// Options come first; the first other word starts the formula text, and
/// every remaining word is joined to it with single spaces.
pub(super) fn parse_formula_command(
    program: &str,
    args: &[String],
) -> Result<FormulaCommand, CliError> {
    let mut tree = false;
    let mut words: Vec<&str> = Vec::new();
    let mut options_done = false;

    for token in args {
        if options_done || !words.is_empty() {
            words.push(token);
            continue;
        }
        match token.as_str() {
            "--" => options_done = true,
            "--tree" => {
                if tree {
                    return Err(CliError::duplicate_option(program, "--tree"));
                }
                tree = true;
            }
            option if option.starts_with("--") => {
                return Err(CliError::unexpected_option(program, option.to_string()));
            }
            word => words.push(word),
        }
    }

    Ok(FormulaCommand {
        tree,
        text: (!words.is_empty()).then(|| words.join(" ")),
    })
}
