//! The built-in module exposed by `sigcall source`.

use crate::parser::ParseError;
use crate::runner::{Function, Module, Output};
use crate::value::{Stream, Value};
use indexmap::IndexMap;
use std::time::Duration;

/// Name of the built-in module.
pub const MODULE_NAME: &str = "demo";

/// Build the built-in module.
///
/// # Errors
///
/// Returns `Err` if one of the built-in signatures fails to parse.
pub fn module() -> Result<Module, ParseError> {
    let mut settings = IndexMap::new();
    settings.insert("colour".to_string(), Value::from("auto"));
    settings.insert("retries".to_string(), Value::Int(3));

    Ok(Module::new(MODULE_NAME, "sigcall/demo")
        .function(multiply()?)
        .function(fileexists()?)
        .function(stdout_stderr()?)
        .function(pygrep()?)
        .function(countdown()?)
        .function(echo_after()?)
        .variable("VERSION", env!("CARGO_PKG_VERSION"))
        .variable("PRIMES", vec![2_i64, 3, 5, 7, 11])
        .variable("SETTINGS", Value::Map(settings))
        .variable("_INTERNAL", "not exported"))
}

fn multiply() -> Result<Function, ParseError> {
    Ok(Function::parse("multiply(a: int, b: int) -> int", |args| {
        let product = args
            .int("a")?
            .checked_mul(args.int("b")?)
            .ok_or_else(|| anyhow::anyhow!("result does not fit in an int"))?;
        Ok(Output::from(product))
    })?
    .with_doc("Values are coerced to ints, or rejected if they are not valid ints."))
}

fn fileexists() -> Result<Function, ParseError> {
    Ok(Function::parse("fileexists(file: Path) -> bool", |args| {
        Ok(Output::from(args.path("file")?.exists()))
    })?
    .with_doc("Values are converted to paths. Booleans print as lowercase shell words."))
}

fn stdout_stderr() -> Result<Function, ParseError> {
    Ok(Function::parse("stdout_stderr() -> str", |_| {
        eprintln!("emitted messages should go to stderr");
        Ok(Output::from("returned values should go to stdout"))
    })?
    .with_doc("Messages go to stderr and return values to stdout, so `VAR=$(stdout_stderr)` captures only the return value."))
}

fn pygrep() -> Result<Function, ParseError> {
    Ok(Function::parse("pygrep(pattern: Pattern, files: list[TextIO])", |args| {
        let pattern = args.pattern("pattern")?.clone();
        let files: Vec<Stream> = args
            .values("files")?
            .iter()
            .filter_map(Value::as_stream)
            .cloned()
            .collect();
        let prefixed = files.len() > 1;

        let matches = files.into_iter().flat_map(move |file| {
            let pattern = pattern.clone();
            let prefix = if prefixed {
                format!("{}:", file.label())
            } else {
                String::new()
            };
            file.lines().filter_map(move |line| match line {
                Ok(line) if pattern.is_match(&line) => Some(Ok(Output::from(format!("{prefix}{line}")))),
                Ok(_) => None,
                Err(e) => Some(Err(e.into())),
            })
        });
        Ok(Output::lazy(matches))
    })?
    .with_doc("A minimal grep. Matching lines are printed as they are found."))
}

fn countdown() -> Result<Function, ParseError> {
    Ok(Function::parse("countdown(start: int = 3)", |args| {
        let start = args.int("start")?;
        Ok(Output::lazy((0..=start.max(0)).rev().map(|n| Ok(Output::from(n)))))
    })?
    .with_doc("Counts down to zero, one line per number."))
}

fn echo_after() -> Result<Function, ParseError> {
    Ok(Function::parse("echo_after(message: str, delay_ms: int = 0) -> str", |args| {
        let message = args.string("message")?;
        let delay = u64::try_from(args.int("delay_ms")?.max(0))?;
        Ok(Output::pending(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(Output::from(message))
        }))
    })?
    .with_doc("Waits asynchronously, then returns the message."))
}
