//! Parameter classification.
//!
//! Groups a signature's parameters by calling convention and decides which
//! one, if any, receives piped standard input.

use crate::ast::{ParamKind, Parameter, TypeHint};
use crate::typehint::{Nargs, contains_stream, nargs};
use crate::value::Value;

/// A signature's parameters grouped by how they may be supplied.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSet<'a> {
    params: &'a [Parameter],
}

impl<'a> ParameterSet<'a> {
    #[must_use]
    pub fn new(params: &'a [Parameter]) -> Self {
        Self { params }
    }

    /// Parameters of one calling convention, with their declaration index.
    pub fn of_kind(&self, kind: ParamKind) -> impl Iterator<Item = (usize, &'a Parameter)> + 'a {
        self.params.iter().enumerate().filter(move |(_, p)| p.kind == kind)
    }

    pub fn positional_only(&self) -> impl Iterator<Item = (usize, &'a Parameter)> + 'a {
        self.of_kind(ParamKind::PositionalOnly)
    }

    pub fn positional_or_keyword(&self) -> impl Iterator<Item = (usize, &'a Parameter)> + 'a {
        self.of_kind(ParamKind::PositionalOrKeyword)
    }

    pub fn keyword_only(&self) -> impl Iterator<Item = (usize, &'a Parameter)> + 'a {
        self.of_kind(ParamKind::KeywordOnly)
    }

    /// Parameters without a default.
    pub fn required(&self) -> impl Iterator<Item = (usize, &'a Parameter)> + 'a {
        self.params.iter().enumerate().filter(|(_, p)| p.is_required())
    }

    /// Index of the parameter that receives piped input.
    ///
    /// Nothing is targeted unless input is piped. Otherwise the first
    /// parameter annotated with a stream type wins; failing that the first
    /// parameter, unless every parameter is keyword-only.
    #[must_use]
    pub fn stdin_target(&self, piped: bool) -> Option<usize> {
        if !piped {
            return None;
        }
        if let Some(index) = self
            .params
            .iter()
            .position(|p| p.annotation.as_ref().is_some_and(contains_stream))
        {
            return Some(index);
        }
        if self.keyword_only().count() == self.params.len() {
            return None;
        }
        Some(0)
    }
}

/// Whether the parameter is a boolean switch: annotated `bool`, or
/// unannotated with a boolean default.
#[must_use]
pub fn is_boolean(param: &Parameter) -> bool {
    param.annotation == Some(TypeHint::Bool) || matches!(param.default, Some(Value::Bool(_)))
}

/// Token count for the parameter's effective type.
#[must_use]
pub fn param_nargs(param: &Parameter) -> Nargs {
    nargs(param.effective_hint().as_ref())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ast::{ContainerKind, Signature};
    use crate::value::StreamKind;

    fn signature(text: &str) -> Signature {
        Signature::parse(text).expect("signature should parse")
    }

    #[test]
    fn test_grouping() {
        let sig = signature("f(a, /, b, c = 1, *, d)");
        let set = ParameterSet::new(&sig.params);
        let names = |it: Vec<(usize, &Parameter)>| it.iter().map(|(_, p)| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(set.positional_only().collect()), ["a"]);
        assert_eq!(names(set.positional_or_keyword().collect()), ["b", "c"]);
        assert_eq!(names(set.keyword_only().collect()), ["d"]);
        assert_eq!(names(set.required().collect()), ["a", "b", "d"]);
        let indices: Vec<usize> = set.keyword_only().map(|(i, _)| i).collect();
        assert_eq!(indices, [3]);
    }

    #[test]
    fn test_stdin_target_requires_piped_input() {
        let sig = signature("f(one: str, two: TextIO)");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(false), None);
    }

    #[test]
    fn test_stdin_target_prefers_stream_parameter() {
        let sig = signature("f(one: int, two: TextIO, three: list[BinaryIO])");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(true), Some(1));
        let sig = signature("f(one: int, two: list[BinaryIO])");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(true), Some(1));
    }

    #[test]
    fn test_stdin_target_falls_back_to_first_parameter() {
        let sig = signature("f(one: int, *, two: str)");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(true), Some(0));
        let sig = signature("f(*, one: int, two: str)");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(true), None);
        let sig = signature("f()");
        assert_eq!(ParameterSet::new(&sig.params).stdin_target(true), None);
    }

    #[test]
    fn test_boolean_detection() {
        let sig = signature("f(a: bool, b = false, c: int = 0, d: bool | None = None)");
        let flags: Vec<bool> = sig.params.iter().map(is_boolean).collect();
        assert_eq!(flags, [true, true, false, false]);
    }

    #[test]
    fn test_param_nargs_uses_effective_hint() {
        let param = Parameter::new("items", ParamKind::KeywordOnly)
            .with_default(Value::List(Vec::new()));
        assert_eq!(param_nargs(&param), Nargs::Any);
        let stream = Parameter::new("file", ParamKind::KeywordOnly)
            .with_annotation(TypeHint::container_of(ContainerKind::List, TypeHint::Stream(StreamKind::Text)));
        assert_eq!(param_nargs(&stream), Nargs::Any);
    }
}
