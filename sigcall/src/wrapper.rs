//! Shell wrapper generation.
//!
//! A wrapper is a sourceable bash script exposing a module's functions as
//! shell functions and its variables as shell variables.

use crate::runner::{Definition, Module};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[allow(clippy::expect_used)]
static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[./ ]").expect("wrapper name pattern is valid"));

/// Escape a value for use inside double quotes.
fn escape_shell_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`")
}

/// Render a value as a shell literal, with the `declare` flag for its type.
#[must_use]
pub fn to_shell(value: &Value) -> (String, &'static str) {
    match value {
        Value::None => (String::new(), ""),
        Value::Bool(b) => (b.to_string(), ""),
        Value::Int(i) => (i.to_string(), "-i"),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            let items: Vec<String> = items.iter().map(|item| to_shell(item).0).collect();
            (format!("({})", items.join(" ")), "-a")
        }
        Value::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("[\"{}\"]={}", escape_shell_value(key), to_shell(value).0))
                .collect();
            (format!("({})", entries.join(" ")), "-A")
        }
        other => (format!("\"{}\"", escape_shell_value(&other.to_string())), ""),
    }
}

/// A global variable declaration followed by its assignment.
#[must_use]
pub fn make_var(name: &str, value: &Value) -> String {
    let (literal, typedef) = to_shell(value);
    let flags = format!("-g {typedef}");
    format!("declare {} {name}\n{name}={literal}\n", flags.trim())
}

/// A shell function forwarding its arguments to the runner.
#[must_use]
pub fn make_fn(name: &str, runner_name: &str) -> String {
    format!("{name}() {{\n    {runner_name} {name} \"$@\"\n}}\n")
}

/// The shared runner function every wrapped function calls through.
#[must_use]
pub fn make_runner(runner_name: &str, runner_command: &str) -> String {
    format!("{runner_name}() {{\n    {runner_command} \"$@\"\n}}\n")
}

/// File name for a module's wrapper: the path's parts in reverse order,
/// joined by `_`.
#[must_use]
pub fn make_wrapper_name(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .rev()
        .map(|part| match part {
            Component::RootDir => "/".to_string(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect();
    format!("{}.sh", UNSAFE_NAME_CHARS.replace_all(&parts.join("_"), "_"))
}

/// Wrapper script for `module`. `runner_command` is the command line that
/// runs a function of this module, minus the function name and arguments.
#[must_use]
pub fn build_wrapper(module: &Module, runner_command: &str) -> String {
    let title = format!("sigcall wrapper for {} ({})", module.name, module.path.display());
    let rule = "#".repeat(title.len() + 12);
    let runner_name = format!(
        "_sigcall_run_{}",
        UNSAFE_NAME_CHARS.replace_all(&module.name, "_")
    );

    let mut sections = vec![
        format!("{rule}\n##### {title} #####\n{rule}\n"),
        "# sigcall runner".to_string(),
        make_runner(&runner_name, runner_command),
        "\n# Definitions".to_string(),
    ];
    for (name, definition) in module.definitions() {
        sections.push(match definition {
            Definition::Function(_) => make_fn(name, &runner_name),
            Definition::Variable(value) => make_var(name, value),
        });
    }
    sections.join("\n")
}

/// Write a wrapper under `<home>/wrappers/`, creating the directory.
///
/// # Errors
///
/// Returns `Err` if the directory or file cannot be written.
pub fn write_wrapper_file(home: &Path, contents: &str, name: &str) -> io::Result<PathBuf> {
    let dir = home.join("wrappers");
    fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    fs::write(&path, contents)?;
    tracing::debug!(path = %path.display(), "wrote wrapper");
    Ok(path)
}
