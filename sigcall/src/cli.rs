//! CLI module containing the main entry point logic.

use crate::args::FunctionParser;
use crate::ast::Signature;
use crate::input::Input;
use crate::runner::{self, Definition, Module, RunError};
use crate::{config, demo, fatal_error, wrapper};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments for the sigcall tool.
#[derive(ClapParser)]
#[command(name = "sigcall")]
#[command(version = PKG_VERSION)]
#[command(about = "Call typed functions from the shell", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the shell wrapper for the built-in module and print its path
    Source {
        /// Directory to write wrappers under (default: $SIGCALL_HOME or ~/.sigcall)
        #[arg(long, value_name = "PATH")]
        home: Option<PathBuf>,
    },

    /// Call a function with shell arguments and print its result
    #[command(disable_help_flag = true)]
    Run {
        /// Name of the function to call
        function: String,

        /// Arguments for the function
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List the built-in module's functions and variables
    List,

    /// Apply a signature to arguments and print the resulting invocation as JSON
    #[command(disable_help_flag = true)]
    Parse {
        /// Signature descriptor, e.g. "f(a: int, /, *, b: list[str])"
        signature: String,

        /// Arguments to parse
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

/// Main CLI logic.
pub fn run_cli() {
    config::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Source { home } => {
            config::set_custom_home(home);
            source();
        }
        Commands::Run { function, args } => run(&function, &args),
        Commands::List => list(),
        Commands::Parse { signature, args } => parse(&signature, &args),
    }
}

fn load_module() -> Module {
    demo::module().unwrap_or_else(|e| fatal_error(&e.to_string()))
}

fn source() {
    let module = load_module();
    let exe = std::env::current_exe()
        .unwrap_or_else(|e| fatal_error(&format!("Error: cannot locate sigcall executable: {e}")));
    let runner_command = format!("'{}' run", exe.display().to_string().replace('\'', r"'\''"));

    let contents = wrapper::build_wrapper(&module, &runner_command);
    let name = wrapper::make_wrapper_name(&module.path);
    let home = config::sigcall_home_or_exit();
    match wrapper::write_wrapper_file(&home, &contents, &name) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => fatal_error(&format!("Error: failed to write wrapper: {e}")),
    }
}

fn run(function: &str, args: &[String]) {
    let module = load_module();
    let input = Input::from_stdin();
    let result = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        runner::run_from_wrapper(&module, function, args, &input, &mut out)
    };

    match result {
        Ok(()) => {}
        Err(RunError::Args(e)) => match module.get_callable(function) {
            Ok(f) => f.parser(&input).exit(&e),
            Err(_) => fatal_error(&format!("Error: {e}")),
        },
        Err(e) => fatal_error(&format!("Error: {e}")),
    }
}

fn list() {
    let module = load_module();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (name, definition) in module.definitions() {
        let line = match definition {
            Definition::Function(function) => {
                let signature = function.signature();
                match signature.doc.as_deref().and_then(|doc| doc.lines().next()) {
                    Some(summary) => format!("{signature}\n    {summary}"),
                    None => signature.to_string(),
                }
            }
            Definition::Variable(value) => format!("{name} = {}", value.repr()),
        };
        if writeln!(out, "{line}").is_err() {
            return;
        }
    }
}

fn parse(signature: &str, args: &[String]) {
    let signature = Signature::parse(signature).unwrap_or_else(|e| fatal_error(&e.to_string()));
    let input = Input::from_stdin();
    let parser = FunctionParser::new(&signature, &input);
    let parsed = parser.parse(args).unwrap_or_else(|e| parser.exit(&e));

    match serde_json::to_string_pretty(&parsed.invocation.report()) {
        Ok(json) => println!("{json}"),
        Err(e) => fatal_error(&format!("Error: failed to serialise invocation: {e}")),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["sigcall", "run", "multiply", "--b", "3", "--help"]).unwrap();
        match cli.command {
            Commands::Run { function, args } => {
                assert_eq!(function, "multiply");
                assert_eq!(args, ["--b", "3", "--help"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_subcommand() {
        let cli = Cli::try_parse_from(["sigcall", "parse", "f(a: int)", "-5"]).unwrap();
        match cli.command {
            Commands::Parse { signature, args } => {
                assert_eq!(signature, "f(a: int)");
                assert_eq!(args, ["-5"]);
            }
            _ => panic!("expected parse"),
        }
    }

    #[test]
    fn test_source_home_flag() {
        let cli = Cli::try_parse_from(["sigcall", "source", "--home", "/tmp/x"]).unwrap();
        assert!(matches!(cli.command, Commands::Source { home: Some(ref p) } if p == &PathBuf::from("/tmp/x")));
    }
}
