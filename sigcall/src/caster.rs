//! Value casting: raw shell strings to typed [`Value`]s.
//!
//! The [`Caster`] owns every file it opens while casting stream parameters.
//! Those handles are collected in an [`OpenFiles`] guard which closes them
//! when dropped, so a failed parse never leaks a handle and a successful one
//! keeps them open exactly as long as the caller holds the guard.

use crate::ast::{Class, ContainerKind, TemporalKind, TypeHint};
use crate::input::Input;
use crate::typehint::{Family, Numeric, classify, is_container, typehint_name};
use crate::value::{Pattern, Stream, StreamKind, Value};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Raw argument text: a single token, or several for multi-value parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw {
    One(String),
    Many(Vec<String>),
}

impl Raw {
    pub fn many<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Many(tokens.into_iter().map(Into::into).collect())
    }

    /// The uncast value: a string, or a list of strings.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::One(text) => Value::Str(text),
            Self::Many(tokens) => Value::List(tokens.into_iter().map(Value::Str).collect()),
        }
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(text) => write!(f, "{text}"),
            Self::Many(tokens) => write!(f, "{}", tokens.join(" ")),
        }
    }
}

impl From<&str> for Raw {
    fn from(text: &str) -> Self {
        Self::One(text.to_string())
    }
}

impl From<String> for Raw {
    fn from(text: String) -> Self {
        Self::One(text)
    }
}

#[derive(Debug, Error)]
pub enum CastingError {
    #[error("invalid literal for {type_name}: '{value}'")]
    Invalid { value: String, type_name: String },

    #[error("invalid choice: '{value}' (choose from {})", .choices.join(", "))]
    Choice { value: String, choices: Vec<String> },

    #[error("expected {expected} values for {type_name}, got {got}")]
    Arity {
        expected: usize,
        got: usize,
        type_name: String,
    },

    #[error("malformed {type_name} value '{value}': {reason}")]
    Payload {
        value: String,
        type_name: String,
        reason: String,
    },

    #[error("cannot construct {type_name} from '{value}': {reason}")]
    Construct {
        value: String,
        type_name: String,
        reason: String,
    },

    #[error("no such file or directory: {path}")]
    MissingFile { path: String },

    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid pattern '{value}': {source}")]
    Pattern {
        value: String,
        #[source]
        source: regex::Error,
    },
}

/// File handles opened while casting. Every handle is closed on drop.
#[derive(Debug, Default)]
pub struct OpenFiles {
    handles: Vec<Stream>,
}

impl OpenFiles {
    pub fn track(&mut self, stream: Stream) {
        self.handles.push(stream);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Close every tracked handle now.
    pub fn close_all(&mut self) {
        for handle in self.handles.drain(..) {
            tracing::debug!(file = %handle.label(), "closing file argument");
            handle.close();
        }
    }

    /// Stop tracking the handles without closing them.
    #[must_use]
    pub fn release(mut self) -> Vec<Stream> {
        std::mem::take(&mut self.handles)
    }
}

impl Drop for OpenFiles {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Casts raw strings against type hints, tracking opened files.
pub struct Caster<'a> {
    input: &'a Input,
    opened: OpenFiles,
}

impl<'a> Caster<'a> {
    #[must_use]
    pub fn new(input: &'a Input) -> Self {
        Self {
            input,
            opened: OpenFiles::default(),
        }
    }

    /// Cast `raw` against `hint`.
    ///
    /// With `strict` unset, a failed cast yields the raw value unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `strict` is set and the value is invalid for the hint.
    pub fn cast(&mut self, raw: Raw, hint: Option<&TypeHint>, strict: bool) -> Result<Value, CastingError> {
        match self.cast_strict(&raw, hint) {
            Ok(value) => Ok(value),
            Err(e) if strict => Err(e),
            Err(e) => {
                tracing::debug!(raw = %raw, error = %e, "inferred type did not fit, keeping raw value");
                Ok(raw.into_value())
            }
        }
    }

    /// The handles opened so far.
    #[must_use]
    pub fn finish(self) -> OpenFiles {
        self.opened
    }

    fn cast_strict(&mut self, raw: &Raw, hint: Option<&TypeHint>) -> Result<Value, CastingError> {
        let invalid = || CastingError::Invalid {
            value: raw.to_string(),
            type_name: hint.map_or_else(|| "str".to_string(), typehint_name),
        };

        match classify(hint) {
            Family::Unknown => Ok(untyped(raw)),
            Family::Null => Err(invalid()),
            Family::Boolean => {
                let text = scalar(raw).ok_or_else(invalid)?;
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(invalid())
                }
            }
            Family::Numeric(Numeric::Int) => scalar(raw)
                .and_then(|text| text.trim().parse::<i64>().ok())
                .map(Value::Int)
                .ok_or_else(invalid),
            Family::Numeric(Numeric::Float) => scalar(raw)
                .and_then(|text| text.trim().parse::<f64>().ok())
                .map(Value::Float)
                .ok_or_else(invalid),
            Family::String => scalar(raw).map(|text| Value::Str(text.to_string())).ok_or_else(invalid),
            Family::Bytes => scalar(raw)
                .map(|text| Value::Bytes(text.as_bytes().to_vec()))
                .ok_or_else(invalid),
            Family::Union(members) => self.cast_union(raw, members).ok_or_else(invalid),
            Family::Literal(allowed) => self.cast_literal(raw, allowed),
            Family::Temporal(kind) => scalar(raw)
                .and_then(|text| parse_temporal(text, kind))
                .ok_or_else(invalid),
            Family::Pattern(sub) => {
                let text = scalar(raw).ok_or_else(invalid)?;
                compile_pattern(text, sub)
            }
            Family::Stream(kind) => {
                let text = scalar(raw).ok_or_else(invalid)?;
                self.cast_stream(text, kind)
            }
            Family::Mapping(_) => {
                let text = scalar(raw).ok_or_else(invalid)?;
                parse_mapping(text, hint)
            }
            Family::Collection { kind, member } => {
                let members: Vec<TypeHint> = member.cloned().into_iter().collect();
                self.cast_collection(raw, kind, &members, false, hint)
            }
            Family::Tuple { members, fixed } => {
                self.cast_collection(raw, ContainerKind::Tuple, members, fixed, hint)
            }
            Family::Opaque(class) => {
                let text = scalar(raw).ok_or_else(invalid)?;
                construct(text, class)
            }
        }
    }

    /// First member that accepts the value wins. When the union holds both
    /// `int` and `float`, a scalar result must render back to the raw text,
    /// so `"1.0"` is never taken as the int branch and `"1"` never as float.
    fn cast_union(&mut self, raw: &Raw, members: &[TypeHint]) -> Option<Value> {
        let numeric_tie = members.contains(&TypeHint::Int) && members.contains(&TypeHint::Float);
        for member in members {
            let candidate = match raw {
                Raw::Many(tokens) if tokens.len() == 1 && !is_container(member) => {
                    Raw::One(tokens[0].clone())
                }
                other => other.clone(),
            };
            let Ok(value) = self.cast_strict(&candidate, Some(member)) else {
                continue;
            };
            if numeric_tie
                && let Raw::One(text) = &candidate
                && matches!(value, Value::Int(_) | Value::Float(_))
                && value.to_string() != *text
            {
                continue;
            }
            return Some(value);
        }
        None
    }

    fn cast_literal(&mut self, raw: &Raw, allowed: &[Value]) -> Result<Value, CastingError> {
        for candidate in allowed {
            let Some(hint) = TypeHint::of_value(candidate) else {
                continue;
            };
            if let Ok(value) = self.cast_strict(raw, Some(&hint))
                && allowed.contains(&value)
            {
                return Ok(value);
            }
        }
        Err(CastingError::Choice {
            value: raw.to_string(),
            choices: allowed.iter().map(ToString::to_string).collect(),
        })
    }

    fn cast_stream(&mut self, text: &str, kind: StreamKind) -> Result<Value, CastingError> {
        if let Some(stream) = self.input.stream(kind) {
            return Ok(Value::Stream(stream));
        }
        let path = Path::new(text);
        if !path.exists() {
            return Err(CastingError::MissingFile {
                path: text.to_string(),
            });
        }
        let stream = Stream::open(path, kind).map_err(|source| CastingError::Open {
            path: text.to_string(),
            source,
        })?;
        tracing::debug!(file = %text, ?kind, "opened file argument");
        self.opened.track(stream.clone());
        Ok(Value::Stream(stream))
    }

    fn cast_collection(
        &mut self,
        raw: &Raw,
        kind: ContainerKind,
        members: &[TypeHint],
        fixed: bool,
        hint: Option<&TypeHint>,
    ) -> Result<Value, CastingError> {
        let type_name = || hint.map_or_else(|| kind.name().to_string(), typehint_name);

        let single = match raw {
            Raw::One(text) => Some(text.as_str()),
            Raw::Many(tokens) if tokens.len() == 1 => Some(tokens[0].as_str()),
            Raw::Many(_) => None,
        };
        if kind == ContainerKind::List
            && let Some(text) = single
            && let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(text)
        {
            let Some(member) = members.first() else {
                return Ok(Value::from_json(serde_json::Value::Array(items)));
            };
            // Members are recast from their JSON text; strings lose their quotes.
            return items
                .into_iter()
                .map(|item| {
                    let token = match item {
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    self.cast_strict(&Raw::One(token), Some(member))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }

        let tokens = match raw {
            Raw::One(text) => shlex::split(text).ok_or_else(|| CastingError::Invalid {
                value: text.clone(),
                type_name: type_name(),
            })?,
            Raw::Many(tokens) => tokens.clone(),
        };

        let values = if members.is_empty() {
            tokens.into_iter().map(Value::Str).collect()
        } else if fixed {
            if members.len() != tokens.len() {
                return Err(CastingError::Arity {
                    expected: members.len(),
                    got: tokens.len(),
                    type_name: type_name(),
                });
            }
            tokens
                .into_iter()
                .zip(members)
                .map(|(token, member)| self.cast_strict(&Raw::One(token), Some(member)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            tokens
                .into_iter()
                .map(|token| self.cast_strict(&Raw::One(token), Some(&members[0])))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(match kind {
            ContainerKind::Tuple => Value::Tuple(values),
            ContainerKind::Set | ContainerKind::FrozenSet => Value::set(values),
            ContainerKind::List | ContainerKind::Sequence | ContainerKind::Collection => {
                Value::List(values)
            }
        })
    }
}

/// Cast a raw value without piped input.
///
/// Files opened for stream hints are handed to the returned value, which
/// keeps them open until it is dropped.
///
/// # Errors
///
/// Returns `Err` if `strict` is set and the value is invalid for the hint.
pub fn cast_to_type(raw: impl Into<Raw>, hint: Option<&TypeHint>, strict: bool) -> Result<Value, CastingError> {
    let input = Input::terminal();
    let mut caster = Caster::new(&input);
    let value = caster.cast(raw.into(), hint, strict)?;
    // Opened streams stay open through the clones held by `value`.
    let _handles = caster.finish().release();
    Ok(value)
}

fn scalar(raw: &Raw) -> Option<&str> {
    match raw {
        Raw::One(text) => Some(text),
        Raw::Many(_) => None,
    }
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// `"true"`/`"false"` become booleans, digit strings become integers,
/// everything else stays a string.
fn untyped(raw: &Raw) -> Value {
    fn guess(text: &str) -> Value {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ if is_decimal(text) => text
                .parse::<i64>()
                .map_or_else(|_| Value::Str(text.to_string()), Value::Int),
            _ => Value::Str(text.to_string()),
        }
    }
    match raw {
        Raw::One(text) => guess(text),
        Raw::Many(tokens) => Value::List(tokens.iter().map(|t| guess(t)).collect()),
    }
}

fn parse_temporal(text: &str, kind: TemporalKind) -> Option<Value> {
    if kind != TemporalKind::Time && is_decimal(text) {
        let secs = text.parse::<i64>().ok()?;
        let local = DateTime::from_timestamp(secs, 0)?
            .with_timezone(&Local)
            .naive_local();
        return Some(match kind {
            TemporalKind::Date => Value::Date(local.date()),
            _ => Value::DateTime(local),
        });
    }
    match kind {
        TemporalKind::Date => text.parse::<NaiveDate>().ok().map(Value::Date),
        TemporalKind::DateTime => parse_datetime(text).map(Value::DateTime),
        TemporalKind::Time => text
            .parse::<NaiveTime>()
            .ok()
            .or_else(|| NaiveTime::parse_from_str(text, "%H:%M").ok())
            .map(Value::Time),
    }
}

/// Naive ISO-8601 forms are taken as local time. Offset forms (`+01:00`,
/// `Z`) are converted to local time.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    text.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%:z"))
                .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
                .ok()
                .map(|aware| aware.with_timezone(&Local).naive_local())
        })
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").ok())
        .or_else(|| {
            text.parse::<NaiveDate>()
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn compile_pattern(text: &str, sub: Option<&TypeHint>) -> Result<Value, CastingError> {
    let error = |source| CastingError::Pattern {
        value: text.to_string(),
        source,
    };
    let pattern = match sub {
        Some(TypeHint::Bytes) => Pattern::Bytes(regex::bytes::Regex::new(text).map_err(error)?),
        _ => Pattern::Text(regex::Regex::new(text).map_err(error)?),
    };
    Ok(Value::Pattern(pattern))
}

fn parse_mapping(text: &str, hint: Option<&TypeHint>) -> Result<Value, CastingError> {
    let payload = |reason: String| CastingError::Payload {
        value: text.to_string(),
        type_name: hint.map_or_else(|| "dict".to_string(), typehint_name),
        reason,
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json @ serde_json::Value::Object(_)) => Ok(Value::from_json(json)),
        Ok(other) => Err(payload(format!(
            "expected a JSON object, got {}",
            Value::from_json(other).type_name()
        ))),
        Err(e) => Err(payload(e.to_string())),
    }
}

fn construct(text: &str, class: &Class) -> Result<Value, CastingError> {
    let Some(constructor) = class.constructor else {
        return Err(CastingError::Invalid {
            value: text.to_string(),
            type_name: class.name.clone(),
        });
    };
    constructor(text).map_err(|reason| CastingError::Construct {
        value: text.to_string(),
        type_name: class.name.clone(),
        reason,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ast::MappingKind;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn cast(raw: impl Into<Raw>, hint: &TypeHint) -> Result<Value, CastingError> {
        cast_to_type(raw, Some(hint), true)
    }

    fn ok(raw: impl Into<Raw>, hint: &TypeHint) -> Value {
        cast(raw, hint).expect("cast should succeed")
    }

    fn strs(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn ints(items: &[i64]) -> Vec<Value> {
        items.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(ok("1", &TypeHint::Int), Value::Int(1));
        assert_eq!(ok("1.0", &TypeHint::Float), Value::Float(1.0));
        assert_eq!(ok("true", &TypeHint::Bool), Value::Bool(true));
        assert_eq!(ok("False", &TypeHint::Bool), Value::Bool(false));
        assert_eq!(ok("hi", &TypeHint::Str), Value::from("hi"));
        assert_eq!(ok("hi", &TypeHint::Bytes), Value::Bytes(b"hi".to_vec()));
    }

    #[test]
    fn test_primitive_round_trips() {
        for value in [Value::Int(-42), Value::Float(2.5), Value::Bool(false), Value::from("x y")] {
            let hint = TypeHint::of_value(&value).unwrap();
            assert_eq!(ok(value.to_string(), &hint), value);
        }
    }

    #[test]
    fn test_invalid_values_are_errors_when_strict() {
        let err = cast("maybe", &TypeHint::Bool).unwrap_err();
        assert_eq!(err.to_string(), "invalid literal for bool: 'maybe'");
        assert!(cast("1.5", &TypeHint::Int).is_err());
        assert!(cast("x", &TypeHint::NoneType).is_err());
        assert!(cast(Raw::many(["1", "2"]), &TypeHint::Int).is_err());
    }

    #[test]
    fn test_non_strict_falls_back_to_raw() {
        assert_eq!(
            cast_to_type("abc", Some(&TypeHint::Int), false).unwrap(),
            Value::from("abc")
        );
    }

    #[test]
    fn test_untyped_heuristic() {
        assert_eq!(cast_to_type("1", None, false).unwrap(), Value::Int(1));
        assert_eq!(cast_to_type("true", None, false).unwrap(), Value::Bool(true));
        assert_eq!(cast_to_type("1646803515", None, false).unwrap(), Value::Int(1_646_803_515));
        assert_eq!(cast_to_type("2022-03-09", None, false).unwrap(), Value::from("2022-03-09"));
        assert_eq!(cast_to_type("-1", None, false).unwrap(), Value::from("-1"));
    }

    #[test]
    fn test_containers() {
        let abc = Raw::many(["a", "b", "c"]);
        assert_eq!(ok(abc.clone(), &TypeHint::container(ContainerKind::List)), Value::List(strs(&["a", "b", "c"])));
        assert_eq!(ok(abc.clone(), &TypeHint::container(ContainerKind::Tuple)), Value::Tuple(strs(&["a", "b", "c"])));
        assert_eq!(ok(abc.clone(), &TypeHint::container(ContainerKind::Set)), Value::set(strs(&["c", "b", "a"])));
        assert_eq!(ok(abc.clone(), &TypeHint::container(ContainerKind::Sequence)), Value::List(strs(&["a", "b", "c"])));
        assert_eq!(ok(abc, &TypeHint::container(ContainerKind::Collection)), Value::List(strs(&["a", "b", "c"])));
    }

    #[test]
    fn test_container_member_types() {
        let list_int = TypeHint::container_of(ContainerKind::List, TypeHint::Int);
        assert_eq!(ok(Raw::many(["1", "2", "3"]), &list_int), Value::List(ints(&[1, 2, 3])));

        let mixed = TypeHint::container_of(
            ContainerKind::List,
            TypeHint::union(vec![TypeHint::Bool, TypeHint::Int, TypeHint::Str]),
        );
        assert_eq!(
            ok(Raw::many(["false", "1", "two", "3"]), &mixed),
            Value::List(vec![Value::Bool(false), Value::Int(1), Value::from("two"), Value::Int(3)])
        );

        let fixed = TypeHint::fixed_tuple(vec![TypeHint::Bool, TypeHint::Int, TypeHint::Str, TypeHint::Int]);
        assert_eq!(
            ok(Raw::many(["false", "1", "two", "3"]), &fixed),
            Value::Tuple(vec![Value::Bool(false), Value::Int(1), Value::from("two"), Value::Int(3)])
        );

        let variadic = TypeHint::container_of(ContainerKind::Tuple, TypeHint::Int);
        assert_eq!(ok(Raw::many(["1", "2", "3"]), &variadic), Value::Tuple(ints(&[1, 2, 3])));
        assert_eq!(ok(Raw::many(["1"]), &TypeHint::fixed_tuple(vec![TypeHint::Int])), Value::Tuple(ints(&[1])));
    }

    #[test]
    fn test_fixed_tuple_arity() {
        let one = TypeHint::fixed_tuple(vec![TypeHint::Int]);
        let two = TypeHint::fixed_tuple(vec![TypeHint::Int, TypeHint::Int]);
        assert!(matches!(cast(Raw::many(["1", "2", "3"]), &one), Err(CastingError::Arity { .. })));
        assert!(matches!(cast(Raw::many(["1", "2", "3"]), &two), Err(CastingError::Arity { .. })));
        assert!(matches!(cast(Raw::many(["1"]), &two), Err(CastingError::Arity { .. })));
        assert_eq!(ok("1 2", &two), Value::Tuple(ints(&[1, 2])));
    }

    #[test]
    fn test_single_string_is_shell_split() {
        let hint = TypeHint::container(ContainerKind::Tuple);
        assert_eq!(ok(r#"a "b c" d"#, &hint), Value::Tuple(strs(&["a", "b c", "d"])));
        assert!(cast(r#"a "b"#, &hint).is_err());
    }

    #[test]
    fn test_unions() {
        let int_str = TypeHint::union(vec![TypeHint::Int, TypeHint::Str]);
        assert_eq!(ok("test", &int_str), Value::from("test"));

        let int_list = TypeHint::union(vec![TypeHint::Int, TypeHint::container(ContainerKind::List)]);
        assert_eq!(ok(Raw::many(["test"]), &int_list), Value::List(strs(&["test"])));
        assert_eq!(ok(Raw::many(["1"]), &int_list), Value::Int(1));

        let bool_int = TypeHint::union(vec![TypeHint::Bool, TypeHint::Int]);
        assert_eq!(ok("1", &bool_int), Value::Int(1));

        let optional = TypeHint::optional(TypeHint::container_of(ContainerKind::Tuple, TypeHint::Int));
        assert_eq!(ok(Raw::many(["1", "2", "3"]), &optional), Value::Tuple(ints(&[1, 2, 3])));
    }

    #[test]
    fn test_int_float_tie_break() {
        let int_float = TypeHint::union(vec![TypeHint::Int, TypeHint::Float]);
        let float_int = TypeHint::union(vec![TypeHint::Float, TypeHint::Int]);
        for hint in [&int_float, &float_int] {
            assert_eq!(ok("1.0", hint), Value::Float(1.0));
            assert_eq!(ok("1", hint), Value::Int(1));
        }
    }

    #[test]
    fn test_union_exhaustion_names_union() {
        let hint = TypeHint::union(vec![TypeHint::Int, TypeHint::Float]);
        let err = cast("abc", &hint).unwrap_err();
        assert_eq!(err.to_string(), "invalid literal for int | float: 'abc'");
    }

    #[test]
    fn test_literals() {
        let lit = |values: Vec<Value>| TypeHint::Literal(values);
        assert_eq!(ok("1", &lit(vec![Value::from("2"), Value::Int(1)])), Value::Int(1));
        assert_eq!(
            ok("1", &lit(vec![Value::from("2"), Value::from("1"), Value::Int(1)])),
            Value::from("1")
        );
        let verbs = lit(strs(&["get", "set", "del"]));
        assert_eq!(ok("set", &verbs), Value::from("set"));
        let err = cast("fly", &verbs).unwrap_err();
        assert_eq!(err.to_string(), "invalid choice: 'fly' (choose from get, set, del)");
        assert_eq!(ok("false", &lit(vec![Value::Bool(true), Value::Bool(false)])), Value::Bool(false));
        assert_eq!(
            ok("1.1", &lit(vec![Value::Int(1), Value::Float(1.1), Value::from("1.1")])),
            Value::Float(1.1)
        );
    }

    #[test]
    fn test_patterns() {
        let value = ok("^abc$", &TypeHint::Pattern(None));
        let Value::Pattern(Pattern::Text(re)) = value else {
            panic!("expected text pattern, got {value:?}");
        };
        assert!(re.is_match("abc"));

        let bytes = ok("^a", &TypeHint::Pattern(Some(Box::new(TypeHint::Bytes))));
        assert!(matches!(bytes, Value::Pattern(Pattern::Bytes(_))));
        assert!(matches!(cast("(", &TypeHint::Pattern(None)), Err(CastingError::Pattern { .. })));
    }

    #[test]
    fn test_json_payloads() {
        let dict = TypeHint::Mapping {
            kind: MappingKind::Dict,
            members: Vec::new(),
        };
        let value = ok(r#"{"one": 2, "three": [4, 5]}"#, &dict);
        let map = value.as_map().unwrap();
        assert_eq!(map.get("one"), Some(&Value::Int(2)));
        assert_eq!(map.get("three"), Some(&Value::List(ints(&[4, 5]))));
        assert!(matches!(cast("[1]", &dict), Err(CastingError::Payload { .. })));
        assert!(matches!(cast("{", &dict), Err(CastingError::Payload { .. })));

        let list = TypeHint::container(ContainerKind::List);
        let value = ok(Raw::many([r#"["one", {"two": 3}]"#]), &list);
        let items = value.as_slice().unwrap();
        assert_eq!(items[0], Value::from("one"));
        assert!(items[1].as_map().is_some());

        let list_int = TypeHint::container_of(ContainerKind::List, TypeHint::Int);
        assert_eq!(ok("[1, 2, 3]", &list_int), Value::List(ints(&[1, 2, 3])));
        assert_eq!(ok(Raw::many(["[4, 5]"]), &list_int), Value::List(ints(&[4, 5])));
        assert!(matches!(cast(r#"[1, "two"]"#, &list_int), Err(CastingError::Invalid { .. })));

        let list_str = TypeHint::container_of(ContainerKind::List, TypeHint::Str);
        assert_eq!(ok(r#"["a b", "c"]"#, &list_str), Value::List(strs(&["a b", "c"])));
    }

    #[test]
    fn test_dates_and_times() {
        let stamp = 1_646_803_515;
        let local = Local.timestamp_opt(stamp, 0).unwrap().naive_local();
        assert_eq!(
            ok(stamp.to_string(), &TypeHint::Temporal(TemporalKind::Date)),
            Value::Date(local.date())
        );
        assert_eq!(
            ok(stamp.to_string(), &TypeHint::Temporal(TemporalKind::DateTime)),
            Value::DateTime(local)
        );
        assert_eq!(
            ok("2022-03-09", &TypeHint::Temporal(TemporalKind::Date)),
            Value::Date(NaiveDate::from_ymd_opt(2022, 3, 9).unwrap())
        );
        assert_eq!(
            ok("2022-03-09T00:05:23", &TypeHint::Temporal(TemporalKind::DateTime)),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2022, 3, 9).unwrap().and_hms_opt(0, 5, 23).unwrap()
            )
        );
        assert_eq!(
            ok("04:23:01.000384", &TypeHint::Temporal(TemporalKind::Time)),
            Value::Time(NaiveTime::from_hms_micro_opt(4, 23, 1, 384).unwrap())
        );
        assert!(cast("yesterday", &TypeHint::Temporal(TemporalKind::Date)).is_err());
    }

    #[test]
    fn test_datetimes_with_offsets() {
        let utc = Utc.with_ymd_and_hms(2022, 3, 9, 0, 5, 23).unwrap();
        let local = Value::DateTime(utc.with_timezone(&Local).naive_local());
        let hint = TypeHint::Temporal(TemporalKind::DateTime);
        assert_eq!(ok("2022-03-09T00:05:23+00:00", &hint), local);
        assert_eq!(ok("2022-03-09T00:05:23Z", &hint), local);
        assert_eq!(ok("2022-03-09 01:05:23+01:00", &hint), local);
    }

    #[test]
    fn test_path_class_and_opaque_class() {
        assert_eq!(
            ok("/tmp/x", &TypeHint::Class(Class::path())),
            Value::Path("/tmp/x".into())
        );
        assert!(cast("x", &TypeHint::Class(Class::opaque("Widget"))).is_err());
    }

    #[test]
    fn test_stream_from_file() {
        let value = ok("/dev/null", &TypeHint::Stream(StreamKind::Text));
        let stream = value.as_stream().unwrap();
        assert!(!stream.is_closed());
        assert_eq!(stream.read_to_string().unwrap(), "");

        let err = cast("/no/such/file", &TypeHint::Stream(StreamKind::Text)).unwrap_err();
        assert_eq!(err.to_string(), "no such file or directory: /no/such/file");
    }

    #[test]
    fn test_stream_from_piped_input() {
        let input = Input::piped(Cursor::new(b"piped".to_vec()));
        let mut caster = Caster::new(&input);
        let value = caster
            .cast(Raw::from("ignored"), Some(&TypeHint::Stream(StreamKind::Text)), true)
            .unwrap();
        assert!(caster.finish().is_empty());
        assert_eq!(value.as_stream().unwrap().read_to_string().unwrap(), "piped");
    }

    #[test]
    fn test_opened_files_close_on_drop() {
        let input = Input::terminal();
        let mut caster = Caster::new(&input);
        let value = caster
            .cast(Raw::many(["/dev/null", "/dev/null"]), Some(&TypeHint::container_of(ContainerKind::List, TypeHint::Stream(StreamKind::Binary))), true)
            .unwrap();
        let files = caster.finish();
        assert_eq!(files.len(), 2);
        drop(files);
        for item in value.as_slice().unwrap() {
            assert!(item.as_stream().unwrap().is_closed());
        }
    }
}
