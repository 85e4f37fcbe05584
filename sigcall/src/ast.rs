// Function signature definitions

use crate::value::{StreamKind, Value};
use std::fmt;
use std::path::PathBuf;

/// How a parameter may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
}

impl ParamKind {
    /// Heading used when grouping parameters in help output.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::PositionalOnly => "positional only args",
            Self::PositionalOrKeyword => "positional or keyword args",
            Self::KeywordOnly => "keyword only args",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Tuple,
    Set,
    FrozenSet,
    Sequence,
    Collection,
}

impl ContainerKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Sequence => "Sequence",
            Self::Collection => "Collection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Dict,
    DefaultDict,
}

impl MappingKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dict => "dict",
            Self::DefaultDict => "defaultdict",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
}

impl TemporalKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
        }
    }
}

/// Builds a value of a class from a single argument string.
pub type Constructor = fn(&str) -> Result<Value, String>;

/// A named type outside the built-in families.
///
/// Classes are equal when their names are.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub constructor: Option<Constructor>,
}

impl Class {
    /// A class with no known way to construct it from text.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
        }
    }

    /// The built-in filesystem path class.
    #[must_use]
    pub fn path() -> Self {
        Self {
            name: "Path".to_string(),
            constructor: Some(|text| Ok(Value::Path(PathBuf::from(text)))),
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A parameter's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    Any,
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Container {
        kind: ContainerKind,
        members: Vec<TypeHint>,
        /// `tuple[T, ...]`
        variadic: bool,
    },
    Mapping {
        kind: MappingKind,
        members: Vec<TypeHint>,
    },
    Union(Vec<TypeHint>),
    Literal(Vec<Value>),
    Temporal(TemporalKind),
    Pattern(Option<Box<TypeHint>>),
    Stream(StreamKind),
    Class(Class),
}

impl TypeHint {
    /// A container with no member types.
    #[must_use]
    pub fn container(kind: ContainerKind) -> Self {
        Self::Container {
            kind,
            members: Vec::new(),
            variadic: false,
        }
    }

    /// A container whose members are all `member`.
    #[must_use]
    pub fn container_of(kind: ContainerKind, member: TypeHint) -> Self {
        Self::Container {
            kind,
            members: vec![member],
            variadic: kind == ContainerKind::Tuple,
        }
    }

    /// `tuple[a, b, ...]` with a fixed member list.
    #[must_use]
    pub fn fixed_tuple(members: Vec<TypeHint>) -> Self {
        Self::Container {
            kind: ContainerKind::Tuple,
            members,
            variadic: false,
        }
    }

    /// `T | None`
    #[must_use]
    pub fn optional(hint: TypeHint) -> Self {
        Self::union(vec![hint, Self::NoneType])
    }

    /// Union of the given members, flattened and deduplicated.
    ///
    /// A single remaining member is returned as-is.
    #[must_use]
    pub fn union(members: Vec<TypeHint>) -> Self {
        let mut flat: Vec<TypeHint> = Vec::new();
        for member in members {
            let nested = match member {
                Self::Union(inner) => inner,
                other => vec![other],
            };
            for hint in nested {
                if !flat.contains(&hint) {
                    flat.push(hint);
                }
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat)
        }
    }

    /// The type of a default value, used when a parameter has no annotation.
    #[must_use]
    pub fn of_value(value: &Value) -> Option<TypeHint> {
        Some(match value {
            Value::None => return None,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Str(_) => Self::Str,
            Value::Bytes(_) => Self::Bytes,
            Value::List(_) => Self::container(ContainerKind::List),
            Value::Tuple(_) => Self::container(ContainerKind::Tuple),
            Value::Set(_) => Self::container(ContainerKind::Set),
            Value::Map(_) => Self::Mapping {
                kind: MappingKind::Dict,
                members: Vec::new(),
            },
            Value::Date(_) => Self::Temporal(TemporalKind::Date),
            Value::DateTime(_) => Self::Temporal(TemporalKind::DateTime),
            Value::Time(_) => Self::Temporal(TemporalKind::Time),
            Value::Pattern(_) => Self::Pattern(None),
            Value::Path(_) => Self::Class(Class::path()),
            Value::Stream(stream) => Self::Stream(stream.kind()),
        })
    }
}

fn write_members(f: &mut fmt::Formatter<'_>, members: &[TypeHint]) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{member}")?;
    }
    Ok(())
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::NoneType => write!(f, "None"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::Bytes => write!(f, "bytes"),
            Self::Container {
                kind,
                members,
                variadic,
            } => {
                write!(f, "{}", kind.name())?;
                if !members.is_empty() {
                    write!(f, "[")?;
                    write_members(f, members)?;
                    if *variadic && *kind == ContainerKind::Tuple {
                        write!(f, ", ...")?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Self::Mapping { kind, members } => {
                write!(f, "{}", kind.name())?;
                if !members.is_empty() {
                    write!(f, "[")?;
                    write_members(f, members)?;
                    write!(f, "]")?;
                }
                Ok(())
            }
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Self::Literal(values) => {
                let inner: Vec<String> = values.iter().map(Value::repr).collect();
                write!(f, "Literal[{}]", inner.join(", "))
            }
            Self::Temporal(kind) => write!(f, "{}", kind.name()),
            Self::Pattern(None) => write!(f, "Pattern"),
            Self::Pattern(Some(inner)) => write!(f, "Pattern[{inner}]"),
            Self::Stream(StreamKind::Text) => write!(f, "TextIO"),
            Self::Stream(StreamKind::Binary) => write!(f, "BinaryIO"),
            Self::Class(class) => write!(f, "{}", class.name),
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<TypeHint>,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            default: None,
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, hint: TypeHint) -> Self {
        self.annotation = Some(hint);
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// The type used for casting: the annotation when it says more than
    /// `Any`, otherwise the type of the default, otherwise unknown.
    #[must_use]
    pub fn effective_hint(&self) -> Option<TypeHint> {
        match &self.annotation {
            Some(hint) if *hint != TypeHint::Any => Some(hint.clone()),
            _ => self.default.as_ref().and_then(TypeHint::of_value),
        }
    }

    /// Whether the type came from an explicit annotation.
    ///
    /// Cast failures of inferred types fall back to the raw string.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        matches!(&self.annotation, Some(hint) if *hint != TypeHint::Any)
    }

    /// Long flag for this parameter: `--` plus the name with `_` as `-`.
    #[must_use]
    pub fn flag(&self) -> String {
        format!("--{}", self.name.replace('_', "-"))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(hint) = &self.annotation {
            write!(f, ": {hint}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {}", default.repr())?;
        }
        Ok(())
    }
}

/// A function signature: name, ordered parameters, return type and doc.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<Parameter>,
    pub returns: Option<TypeHint>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a signature descriptor such as `grep(pattern: str, /, *files: list[TextIO])`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the descriptor is malformed or declares an invalid
    /// parameter order.
    pub fn parse(text: &str) -> Result<Self, crate::parser::ParseError> {
        crate::parser::parse_signature(text)
    }

    #[must_use]
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn with_returns(mut self, hint: TypeHint) -> Self {
        self.returns = Some(hint);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.params.len() + 2);
        let mut star_written = false;
        for (i, param) in self.params.iter().enumerate() {
            if param.kind == ParamKind::KeywordOnly && !star_written {
                parts.push("*".to_string());
                star_written = true;
            }
            parts.push(param.to_string());
            let next_kind = self.params.get(i + 1).map(|p| p.kind);
            if param.kind == ParamKind::PositionalOnly && next_kind != Some(ParamKind::PositionalOnly) {
                parts.push("/".to_string());
            }
        }
        write!(f, "{}({})", self.name, parts.join(", "))?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_hint_prefers_annotation() {
        let param = Parameter::new("n", ParamKind::PositionalOrKeyword)
            .with_annotation(TypeHint::Float)
            .with_default(1_i64);
        assert_eq!(param.effective_hint(), Some(TypeHint::Float));
        assert!(param.is_strict());
    }

    #[test]
    fn test_effective_hint_falls_back_to_default_type() {
        let param = Parameter::new("n", ParamKind::PositionalOrKeyword)
            .with_annotation(TypeHint::Any)
            .with_default(1_i64);
        assert_eq!(param.effective_hint(), Some(TypeHint::Int));
        assert!(!param.is_strict());

        let none_default = Parameter::new("n", ParamKind::KeywordOnly).with_default(Value::None);
        assert_eq!(none_default.effective_hint(), None);
    }

    #[test]
    fn test_flag_uses_dashes() {
        let param = Parameter::new("dry_run", ParamKind::KeywordOnly);
        assert_eq!(param.flag(), "--dry-run");
    }

    #[test]
    fn test_union_flattens_and_collapses() {
        let hint = TypeHint::union(vec![
            TypeHint::Int,
            TypeHint::Union(vec![TypeHint::Str, TypeHint::Int]),
        ]);
        assert_eq!(hint, TypeHint::Union(vec![TypeHint::Int, TypeHint::Str]));
        assert_eq!(TypeHint::union(vec![TypeHint::Int, TypeHint::Int]), TypeHint::Int);
    }

    #[test]
    fn test_classes_compare_by_name() {
        let a = TypeHint::Class(Class::path());
        let b = TypeHint::Class(Class::opaque("Path"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_display_inserts_markers() {
        let signature = Signature::new("f")
            .param(Parameter::new("a", ParamKind::PositionalOnly).with_annotation(TypeHint::Int))
            .param(Parameter::new("b", ParamKind::PositionalOrKeyword))
            .param(
                Parameter::new("c", ParamKind::KeywordOnly)
                    .with_annotation(TypeHint::optional(TypeHint::Str))
                    .with_default(Value::None),
            )
            .with_returns(TypeHint::Bool);
        assert_eq!(
            signature.to_string(),
            "f(a: int, /, b, *, c: str | None = None) -> bool"
        );
    }

    #[test]
    fn test_tuple_display() {
        assert_eq!(
            TypeHint::container_of(ContainerKind::Tuple, TypeHint::Int).to_string(),
            "tuple[int, ...]"
        );
        assert_eq!(
            TypeHint::fixed_tuple(vec![TypeHint::Int, TypeHint::Str]).to_string(),
            "tuple[int, str]"
        );
    }
}
