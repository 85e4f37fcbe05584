//! # sigcall
//!
//! Call typed functions from the shell.
//!
//! A function is described by a signature such as
//! `pygrep(pattern: Pattern, files: list[TextIO])`. Raw shell tokens and
//! piped standard input are matched to its parameters, cast to the declared
//! types and handed to the function body. Return values are printed back in
//! a form the shell can consume.
//!
//! - [`parser`] reads signature descriptors into [`ast::Signature`].
//! - [`args::FunctionParser`] resolves tokens against a signature.
//! - [`caster`] converts raw strings into typed [`value::Value`]s.
//! - [`runner`] calls functions and prints their results.
//! - [`wrapper`] generates sourceable shell wrappers.

pub mod args;
pub mod ast;
pub mod caster;
pub mod cli;
pub mod config;
pub mod demo;
pub mod input;
pub mod invocation;
pub mod params;
pub mod parser;
pub mod runner;
pub mod typehint;
pub mod value;
pub mod wrapper;

/// Print an error message and exit with code 1.
pub fn fatal_error(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
