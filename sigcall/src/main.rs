//! # sigcall
//!
//! Expose typed functions to the shell.
//!
//! ## Usage
//!
//! - Generate the wrapper: `source "$(sigcall source)"`
//! - Call a function: `multiply 6 7`, `sigcall run multiply --a 6 --b 7`
//! - Pipe data in: `cat log.txt | pygrep error`
//! - Inspect parsing: `sigcall parse 'f(a: int, *, b: list[str])' 1 --b x y`

/// Entry point for the CLI tool.
fn main() {
    sigcall::cli::run_cli();
}
