//! Signature descriptor parser using pest
//!
//! Turns text such as `copy(src: Path, /, dst: Path, *, force: bool = false)`
//! into a [`Signature`]. Besides the grammar itself, the parser enforces the
//! ordering rules of parameter kinds: at most one `/`, at most one `*`, `/`
//! before `*`, unique names and no required positional after a defaulted one.

mod error;

pub use error::ParseError;

use crate::ast::{
    Class, ContainerKind, MappingKind, ParamKind, Parameter, Signature, TemporalKind, TypeHint,
};
use crate::value::{StreamKind, Value};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct SignatureParser;

/// Parse a signature descriptor.
///
/// # Errors
///
/// Returns `Err` if the input violates the grammar, or if the parameter list
/// is semantically invalid:
/// - a parameter name is used twice
/// - `/` or `*` appears more than once, or `/` follows `*`
/// - `/` is the first item, or `*` is the last item
/// - a required positional parameter follows one with a default
/// - an unknown generic form is used with `...`
pub fn parse_signature(input: &str) -> Result<Signature, ParseError> {
    let mut pairs = SignatureParser::parse(Rule::signature, input)
        .map_err(|e| ParseError::from_pest(&e, input))?;

    let mut signature = Signature::default();
    let Some(root) = pairs.next() else {
        return Ok(signature);
    };
    for inner in root.into_inner() {
        match inner.as_rule() {
            Rule::dotted_identifier => signature.name = inner.as_str().to_string(),
            Rule::param_list => signature.params = parse_param_list(inner, input)?,
            Rule::return_type => {
                if let Some(hint) = inner.into_inner().next() {
                    signature.returns = Some(parse_type(hint, input)?);
                }
            }
            _ => {}
        }
    }

    tracing::trace!(signature = %signature, "parsed signature");
    Ok(signature)
}

fn parse_param_list(pair: Pair<'_, Rule>, input: &str) -> Result<Vec<Parameter>, ParseError> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut kind = ParamKind::PositionalOrKeyword;
    let mut seen_slash = false;
    let mut seen_star = false;
    let mut defaulted: Option<String> = None;
    let mut last_span = None;

    for item in pair.into_inner() {
        let span = item.as_span();
        last_span = Some((item.as_rule(), span));
        match item.as_rule() {
            Rule::positional_marker => {
                if seen_slash {
                    return Err(ParseError::at("`/` may appear only once", input, span));
                }
                if seen_star {
                    return Err(ParseError::at("`/` must come before `*`", input, span));
                }
                if params.is_empty() {
                    return Err(ParseError::at(
                        "at least one parameter must precede `/`",
                        input,
                        span,
                    ));
                }
                for param in &mut params {
                    param.kind = ParamKind::PositionalOnly;
                }
                seen_slash = true;
            }
            Rule::keyword_marker => {
                if seen_star {
                    return Err(ParseError::at("`*` may appear only once", input, span));
                }
                kind = ParamKind::KeywordOnly;
                seen_star = true;
            }
            Rule::param => {
                let param = parse_param(item, kind, input)?;
                if params.iter().any(|p| p.name == param.name) {
                    return Err(ParseError::at(
                        format!("duplicate parameter `{}`", param.name),
                        input,
                        span,
                    ));
                }
                if param.kind != ParamKind::KeywordOnly {
                    match (&defaulted, param.is_required()) {
                        (Some(previous), true) => {
                            return Err(ParseError::at(
                                format!(
                                    "required parameter `{}` follows parameter `{previous}` with a default",
                                    param.name
                                ),
                                input,
                                span,
                            )
                            .with_hint(
                                "Move the parameter before any defaulted ones, or after a bare `*`.",
                            ));
                        }
                        (None, false) => defaulted = Some(param.name.clone()),
                        _ => {}
                    }
                }
                params.push(param);
            }
            _ => {}
        }
    }

    if let Some((Rule::keyword_marker, span)) = last_span {
        return Err(ParseError::at(
            "named parameters must follow a bare `*`",
            input,
            span,
        ));
    }

    Ok(params)
}

fn parse_param(pair: Pair<'_, Rule>, kind: ParamKind, input: &str) -> Result<Parameter, ParseError> {
    let mut inner = pair.into_inner();
    let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
    let mut param = Parameter::new(name, kind);

    for part in inner {
        match part.as_rule() {
            Rule::param_type_annotation => {
                if let Some(hint) = part.into_inner().next() {
                    param.annotation = Some(parse_type(hint, input)?);
                }
            }
            Rule::param_default => {
                if let Some(literal) = part.into_inner().next() {
                    param.default = Some(parse_literal(literal, input)?);
                }
            }
            _ => {}
        }
    }

    Ok(param)
}

/// Parse a `type_expr` pair.
fn parse_type(pair: Pair<'_, Rule>, input: &str) -> Result<TypeHint, ParseError> {
    let terms = pair
        .into_inner()
        .map(|term| parse_term(term, input))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypeHint::union(terms))
}

fn parse_term(pair: Pair<'_, Rule>, input: &str) -> Result<TypeHint, ParseError> {
    let span = pair.as_span();
    let Some(inner) = pair.into_inner().next() else {
        return Err(ParseError::at("expected type", input, span));
    };

    match inner.as_rule() {
        Rule::none_type => Ok(TypeHint::NoneType),
        Rule::named_type => Ok(named_type(inner.as_str())),
        Rule::literal_type => {
            let values = inner
                .into_inner()
                .map(|literal| parse_literal(literal, input))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeHint::Literal(values))
        }
        Rule::generic_type => {
            let span = inner.as_span();
            let mut parts = inner.into_inner();
            let name = parts.next().map(|p| p.as_str().to_string()).unwrap_or_default();
            let mut args = Vec::new();
            let mut variadic = false;
            if let Some(type_args) = parts.next() {
                for arg in type_args.into_inner() {
                    match arg.as_rule() {
                        Rule::ellipsis => variadic = true,
                        _ => args.push(parse_type(arg, input)?),
                    }
                }
            }
            generic_type(&name, args, variadic).map_err(|message| ParseError::at(message, input, span))
        }
        _ => Err(ParseError::at("expected type", input, span)),
    }
}

/// Last segment of a dotted name: `typing.List` is `List`.
fn base_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn named_type(name: &str) -> TypeHint {
    match base_name(name) {
        "Any" => TypeHint::Any,
        "NoneType" => TypeHint::NoneType,
        "bool" => TypeHint::Bool,
        "int" => TypeHint::Int,
        "float" => TypeHint::Float,
        "str" => TypeHint::Str,
        "bytes" => TypeHint::Bytes,
        other => match container_kind(other) {
            Some(kind) => TypeHint::container(kind),
            None => match mapping_kind(other) {
                Some(kind) => TypeHint::Mapping {
                    kind,
                    members: Vec::new(),
                },
                None => match other {
                    "date" => TypeHint::Temporal(TemporalKind::Date),
                    "datetime" => TypeHint::Temporal(TemporalKind::DateTime),
                    "time" => TypeHint::Temporal(TemporalKind::Time),
                    "Pattern" => TypeHint::Pattern(None),
                    "TextIO" | "TextIOWrapper" | "TextIOBase" => TypeHint::Stream(StreamKind::Text),
                    "BinaryIO" | "BufferedReader" | "IO" => TypeHint::Stream(StreamKind::Binary),
                    "Path" | "PurePath" | "PosixPath" => TypeHint::Class(Class::path()),
                    _ => TypeHint::Class(Class::opaque(name)),
                },
            },
        },
    }
}

fn container_kind(name: &str) -> Option<ContainerKind> {
    match name {
        "list" | "List" | "MutableSequence" => Some(ContainerKind::List),
        "tuple" | "Tuple" => Some(ContainerKind::Tuple),
        "set" | "Set" | "MutableSet" | "AbstractSet" => Some(ContainerKind::Set),
        "frozenset" | "FrozenSet" => Some(ContainerKind::FrozenSet),
        "Sequence" => Some(ContainerKind::Sequence),
        "Collection" | "Iterable" => Some(ContainerKind::Collection),
        _ => None,
    }
}

fn mapping_kind(name: &str) -> Option<MappingKind> {
    match name {
        "dict" | "Dict" | "Mapping" | "MutableMapping" => Some(MappingKind::Dict),
        "defaultdict" | "DefaultDict" => Some(MappingKind::DefaultDict),
        _ => None,
    }
}

fn generic_type(name: &str, args: Vec<TypeHint>, variadic: bool) -> Result<TypeHint, String> {
    let base = base_name(name);
    if let Some(kind) = container_kind(base) {
        if variadic && kind != ContainerKind::Tuple {
            return Err(format!("`...` is only allowed in tuple types, not `{name}`"));
        }
        if variadic && args.len() != 1 {
            return Err("`tuple[T, ...]` takes exactly one member type".to_string());
        }
        if kind != ContainerKind::Tuple && args.len() > 1 {
            return Err(format!("`{name}` takes a single member type"));
        }
        return Ok(TypeHint::Container {
            kind,
            members: args,
            variadic,
        });
    }
    if variadic {
        return Err(format!("`...` is only allowed in tuple types, not `{name}`"));
    }
    if let Some(kind) = mapping_kind(base) {
        return Ok(TypeHint::Mapping {
            kind,
            members: args,
        });
    }
    match base {
        "Optional" => {
            let mut members = args;
            members.push(TypeHint::NoneType);
            Ok(TypeHint::union(members))
        }
        "Union" => Ok(TypeHint::union(args)),
        "Pattern" => Ok(TypeHint::Pattern(args.into_iter().next().map(Box::new))),
        "IO" => Ok(match args.first() {
            Some(TypeHint::Str) => TypeHint::Stream(StreamKind::Text),
            _ => TypeHint::Stream(StreamKind::Binary),
        }),
        _ => Ok(named_type(name)),
    }
}

fn parse_literal(pair: Pair<'_, Rule>, input: &str) -> Result<Value, ParseError> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::none => Ok(Value::None),
        Rule::boolean => Ok(Value::Bool(matches!(pair.as_str(), "true" | "True"))),
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| ParseError::at(format!("invalid integer: {e}"), input, span)),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ParseError::at(format!("invalid float: {e}"), input, span)),
        Rule::string => {
            let raw = pair.into_inner().next().map_or("", |inner| inner.as_str());
            Ok(Value::Str(unescape(raw)))
        }
        Rule::list => pair
            .into_inner()
            .map(|item| parse_literal(item, input))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        _ => Err(ParseError::at("expected literal value", input, span)),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
