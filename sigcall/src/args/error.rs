//! Argument parsing errors.

use crate::caster::CastingError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("argument {argument}: {source}")]
    Cast {
        argument: String,
        #[source]
        source: CastingError,
    },

    #[error("argument {argument}: invalid choice: '{value}' (choose from {})", .choices.join(", "))]
    InvalidChoice {
        argument: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("argument {argument}: expected {expected}")]
    ExpectedArguments { argument: String, expected: String },

    #[error("argument {argument}: ignored explicit argument '{value}'")]
    IgnoredExplicit { argument: String, value: String },

    #[error("unrecognised arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),

    #[error("the following arguments are required: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("failed to read standard input: {0}")]
    Stdin(#[source] io::Error),

    /// `-h` or `--help` was given.
    #[error("help requested")]
    Help,
}

impl Error {
    pub(crate) fn expected(argument: impl Into<String>, count: usize) -> Self {
        Self::ExpectedArguments {
            argument: argument.into(),
            expected: if count == 1 {
                "one argument".to_string()
            } else {
                format!("{count} arguments")
            },
        }
    }
}
