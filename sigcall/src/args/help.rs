//! Help text and error reporting through clap.
//!
//! The command built here mirrors the parser's option definitions. It is
//! only used for rendering: tokens are never parsed by clap.

use super::{Action, Error, Form, FunctionParser, OptionSpec};
use crate::ast::Parameter;
use crate::typehint::{Nargs, typehint_name};
use clap::builder::PossibleValuesParser;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};

impl FunctionParser<'_> {
    /// A `clap` command describing this function's arguments.
    #[must_use]
    pub fn command(&self) -> Command {
        let signature = self.signature;
        let mut command = Command::new(signature.name.clone())
            .bin_name(signature.name.clone())
            .no_binary_name(true);
        if let Some(doc) = &signature.doc {
            command = command.about(doc.clone());
        }
        if self.flags.contains_key("help") {
            command = command.disable_help_flag(true);
        }

        let mut required_so_far = true;
        for spec in &self.specs {
            let param = &signature.params[spec.index];
            let mut arg = Arg::new(param.name.clone())
                .help(help_text(param, self.stdin_target == Some(spec.index)))
                .help_heading(param.kind.title());
            if let Some(choices) = &spec.choices {
                arg = arg.value_parser(PossibleValuesParser::new(choices.clone()));
            }

            match &spec.form {
                Form::Positional => {
                    required_so_far &= param.is_required();
                    let value_name = match spec.nargs {
                        Nargs::Any => format!("{}...", param.name),
                        _ => param.name.clone(),
                    };
                    arg = arg.value_name(value_name).required(required_so_far);
                    command = command.arg(arg);
                }
                Form::Flag(long) => {
                    arg = arg.long(long.clone());
                    arg = match (spec.action, spec.nargs) {
                        (Action::Toggle, _) => arg.action(ArgAction::SetTrue),
                        (Action::Store, Nargs::One) => arg.action(ArgAction::Set),
                        (Action::Store, Nargs::Exact(n)) => arg.action(ArgAction::Append).num_args(n),
                        (Action::Store, Nargs::Any) => arg.action(ArgAction::Append).num_args(0..),
                    };
                    if spec.action == Action::Store {
                        arg = arg.value_name(param.name.clone());
                    }
                    command = command.arg(arg);
                    if let Some(negation) = self.negation_of(spec, long) {
                        command = command.arg(
                            Arg::new(format!("no-{long}"))
                                .long(negation)
                                .action(ArgAction::SetTrue)
                                .help(format!("unset --{long}"))
                                .help_heading(param.kind.title()),
                        );
                    }
                }
            }
        }
        tracing::trace!(function = %signature.name, args = self.specs.len(), "built help command");
        command
    }

    /// Rendered `--help` output.
    #[must_use]
    pub fn render_help(&self) -> String {
        self.command().render_help().to_string()
    }

    /// Convert a parse error into a `clap` error carrying the usage line.
    #[must_use]
    pub fn report(&self, error: &Error) -> clap::Error {
        let kind = match error {
            Error::Cast { .. } => ErrorKind::ValueValidation,
            Error::InvalidChoice { .. } => ErrorKind::InvalidValue,
            Error::ExpectedArguments { .. } => ErrorKind::WrongNumberOfValues,
            Error::IgnoredExplicit { .. } => ErrorKind::TooManyValues,
            Error::Unrecognized(_) => ErrorKind::UnknownArgument,
            Error::MissingRequired(_) => ErrorKind::MissingRequiredArgument,
            Error::Stdin(_) => ErrorKind::Io,
            Error::Help => ErrorKind::DisplayHelp,
        };
        self.command().error(kind, error)
    }

    /// Print help or the error and exit: status 0 for help, 2 otherwise.
    pub fn exit(&self, error: &Error) -> ! {
        if matches!(error, Error::Help) {
            print!("{}", self.render_help());
            std::process::exit(0);
        }
        self.report(error).exit()
    }

    fn negation_of(&self, spec: &OptionSpec, long: &str) -> Option<String> {
        if spec.action != Action::Toggle {
            return None;
        }
        let negation = format!("no-{long}");
        match self.flags.get(&negation) {
            Some(&(index, true)) if index == spec.index => Some(negation),
            _ => None,
        }
    }
}

fn help_text(param: &Parameter, stdin_target: bool) -> String {
    let mut parts = Vec::new();
    if let Some(hint) = param.effective_hint() {
        parts.push(typehint_name(&hint));
    }
    match &param.default {
        Some(default) => parts.push(format!("(default: {})", default.repr())),
        None => parts.push("(required)".to_string()),
    }
    if stdin_target {
        parts.push("[stdin]".to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ast::Signature;
    use crate::input::Input;

    fn help(sig: &str) -> String {
        let sig = Signature::parse(sig).unwrap().with_doc("Does a thing.");
        let input = Input::terminal();
        FunctionParser::new(&sig, &input).render_help()
    }

    #[test]
    fn test_help_groups_by_kind() {
        let text = help("f(one: str, /, two: int = 2, *, three: bool = false)");
        assert!(text.contains("Does a thing."));
        assert!(text.contains("positional only args"));
        assert!(text.contains("positional or keyword args"));
        assert!(text.contains("keyword only args"));
        assert!(text.contains("str (required)"));
        assert!(text.contains("int (default: 2)"));
        assert!(text.contains("--three"));
        assert!(text.contains("--no-three"));
    }

    #[test]
    fn test_help_shows_type_names() {
        let text = help(r#"f(files: list[TextIO], mode: Literal["r", "w"] = "r")"#);
        assert!(text.contains("file(s) / stdin"));
        assert!(text.contains("(default: \"r\")"));
        assert!(text.contains("[possible values: r, w]"));
    }

    #[test]
    fn test_help_variadic_positional() {
        let text = help("f(a: int, items: list[str], b: int, /)");
        assert!(text.contains("items..."));
    }

    #[test]
    fn test_help_parameter_named_help() {
        let text = help("f(help: str)");
        assert!(text.contains("--help"));
    }

    #[test]
    fn test_negation_yields_to_declared_flag() {
        let sig = Signature::parse("f(*, x: bool = false, no_x: int = 0)").unwrap();
        let input = Input::terminal();
        let parser = FunctionParser::new(&sig, &input);
        parser.command().debug_assert();
        let text = parser.render_help();
        assert_eq!(text.matches("--no-x").count(), 1, "{text}");
        let parsed = parser.parse(&["--no-x", "3"]).unwrap();
        assert_eq!(parsed.invocation.kwargs["no_x"], crate::value::Value::Int(3));
    }

    #[test]
    fn test_stdin_target_marked() {
        let sig = Signature::parse("f(text: str)").unwrap();
        let input = Input::piped(std::io::Cursor::new(&b"x"[..]));
        let text = FunctionParser::new(&sig, &input).render_help();
        assert!(text.contains("[stdin]"));
    }

    #[test]
    fn test_report_keeps_message() {
        let sig = Signature::parse("f(a: int)").unwrap();
        let input = Input::terminal();
        let parser = FunctionParser::new(&sig, &input);
        let err = parser.parse(&["1", "2"]).unwrap_err();
        let report = parser.report(&err);
        assert_eq!(report.kind(), ErrorKind::UnknownArgument);
        assert!(report.to_string().contains("unrecognised arguments: 2"));

        let err = parser.parse::<&str>(&[]).unwrap_err();
        let report = parser.report(&err);
        assert_eq!(report.kind(), ErrorKind::MissingRequiredArgument);
        assert!(report.to_string().contains("the following arguments are required: a"));
    }
}
