//! Invocation assembly: the arguments a function is finally called with.

use crate::caster::OpenFiles;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Positional-only values in declared order, everything else by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

/// JSON form of an [`Invocation`], as printed by `sigcall parse`.
#[derive(Debug, Serialize)]
pub struct InvocationReport {
    pub args: Vec<serde_json::Value>,
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

impl Invocation {
    #[must_use]
    pub fn report(&self) -> InvocationReport {
        InvocationReport {
            args: self.args.iter().map(Value::to_json).collect(),
            kwargs: self
                .kwargs
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        }
    }
}

/// A successful parse: the invocation plus the files opened to build it.
///
/// The files stay open until this value is dropped, so keep it alive for
/// the duration of the call.
#[derive(Debug)]
pub struct Parsed {
    pub invocation: Invocation,
    pub files: OpenFiles,
}
