//! Type classification.
//!
//! Every [`TypeHint`] belongs to exactly one [`Family`], which decides how a
//! raw shell string is cast and how many tokens a parameter takes.

use crate::ast::{Class, ContainerKind, MappingKind, TemporalKind, TypeHint};
use crate::value::{StreamKind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Int,
    Float,
}

/// The semantic family of a type hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Family<'a> {
    Unknown,
    Null,
    Boolean,
    Numeric(Numeric),
    String,
    Bytes,
    /// Lists, sets and abstract sequences, with an optional member type.
    Collection {
        kind: ContainerKind,
        member: Option<&'a TypeHint>,
    },
    Tuple {
        members: &'a [TypeHint],
        fixed: bool,
    },
    Mapping(MappingKind),
    Union(&'a [TypeHint]),
    Literal(&'a [Value]),
    Temporal(TemporalKind),
    Pattern(Option<&'a TypeHint>),
    Stream(StreamKind),
    Opaque(&'a Class),
}

/// Classify a hint. `None` and `Any` are unknown.
#[must_use]
pub fn classify(hint: Option<&TypeHint>) -> Family<'_> {
    let Some(hint) = hint else {
        return Family::Unknown;
    };
    match hint {
        TypeHint::Any => Family::Unknown,
        TypeHint::Union(members) => Family::Union(members),
        TypeHint::NoneType => Family::Null,
        TypeHint::Bool => Family::Boolean,
        TypeHint::Literal(values) => Family::Literal(values),
        TypeHint::Temporal(kind) => Family::Temporal(*kind),
        TypeHint::Pattern(inner) => Family::Pattern(inner.as_deref()),
        TypeHint::Stream(kind) => Family::Stream(*kind),
        TypeHint::Mapping { kind, .. } => Family::Mapping(*kind),
        TypeHint::Container {
            kind: ContainerKind::Tuple,
            members,
            variadic,
        } => Family::Tuple {
            members,
            fixed: !*variadic && !members.is_empty(),
        },
        TypeHint::Container { kind, members, .. } => Family::Collection {
            kind: *kind,
            member: members.first(),
        },
        TypeHint::Int => Family::Numeric(Numeric::Int),
        TypeHint::Float => Family::Numeric(Numeric::Float),
        TypeHint::Str => Family::String,
        TypeHint::Bytes => Family::Bytes,
        TypeHint::Class(class) => Family::Opaque(class),
    }
}

/// Whether the hint is, or contains, a stream type.
#[must_use]
pub fn contains_stream(hint: &TypeHint) -> bool {
    stream_kind(hint).is_some()
}

/// The first stream kind found in the hint, searching through unions and
/// container members.
#[must_use]
pub fn stream_kind(hint: &TypeHint) -> Option<StreamKind> {
    match hint {
        TypeHint::Stream(kind) => Some(*kind),
        TypeHint::Union(members)
        | TypeHint::Container { members, .. }
        | TypeHint::Mapping { members, .. } => members.iter().find_map(stream_kind),
        _ => None,
    }
}

/// Whether the hint (or one of its union members) is a container.
#[must_use]
pub fn is_container(hint: &TypeHint) -> bool {
    match hint {
        TypeHint::Container { .. } => true,
        TypeHint::Union(members) => members.iter().any(is_container),
        _ => false,
    }
}

/// How many shell tokens a parameter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    One,
    Exact(usize),
    Any,
}

/// Token count for a hint: containers take a variable count, fixed tuples
/// take exactly their arity, everything else takes one token.
#[must_use]
pub fn nargs(hint: Option<&TypeHint>) -> Nargs {
    let Some(hint) = hint else {
        return Nargs::One;
    };
    match hint {
        TypeHint::Container {
            kind: ContainerKind::Tuple,
            members,
            variadic,
        } => {
            if *variadic || members.is_empty() {
                Nargs::Any
            } else {
                Nargs::Exact(members.len())
            }
        }
        TypeHint::Container { .. } => Nargs::Any,
        TypeHint::Union(members) => members
            .iter()
            .map(|member| nargs(Some(member)))
            .find(|n| *n != Nargs::One)
            .unwrap_or(Nargs::One),
        _ => Nargs::One,
    }
}

/// The allowed raw tokens for a literal hint.
#[must_use]
pub fn literal_choices(hint: Option<&TypeHint>) -> Option<Vec<String>> {
    match hint {
        Some(TypeHint::Literal(values)) => Some(values.iter().map(ToString::to_string).collect()),
        _ => None,
    }
}

/// Human-readable type name used in help text and error messages.
#[must_use]
pub fn typehint_name(hint: &TypeHint) -> String {
    if !matches!(hint, TypeHint::Union(_)) && contains_stream(hint) {
        let name = if is_container(hint) { "file(s)" } else { "file" };
        return format!("{name} / stdin");
    }
    match hint {
        TypeHint::Union(members) => members
            .iter()
            .filter(|member| **member != TypeHint::NoneType)
            .map(typehint_name)
            .collect::<Vec<_>>()
            .join(" | "),
        TypeHint::Literal(values) => {
            let names: Vec<String> = values.iter().map(ToString::to_string).collect();
            format!("{{{}}}", names.join(", "))
        }
        TypeHint::Container {
            kind,
            members,
            variadic,
        } => match (kind, members.as_slice()) {
            (_, []) => kind.name().to_string(),
            (ContainerKind::Tuple, members) if !*variadic => {
                let names: Vec<String> = members.iter().map(typehint_name).collect();
                format!("[{}]", names.join(", "))
            }
            (_, [member, ..]) => format!("[{} ...]", typehint_name(member)),
        },
        TypeHint::Mapping { kind, .. } => kind.name().to_string(),
        TypeHint::Pattern(_) => "Pattern".to_string(),
        TypeHint::NoneType => "None".to_string(),
        other => other.to_string(),
    }
}
