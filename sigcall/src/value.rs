//! Typed values produced by casting shell arguments.
//!
//! A [`Value`] is what a function body receives for each parameter. Values
//! render back to shell-friendly text through their `Display` impl: booleans
//! are lowercase, floats always carry a fractional part and containers are
//! written as compact JSON.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Whether a stream yields text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Text,
    Binary,
}

/// A compiled regular expression over text or bytes.
#[derive(Debug, Clone)]
pub enum Pattern {
    Text(regex::Regex),
    Bytes(regex::bytes::Regex),
}

impl Pattern {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(re) => re.as_str(),
            Self::Bytes(re) => re.as_str(),
        }
    }

    /// Whether the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Text(re) => re.is_match(text),
            Self::Bytes(re) => re.is_match(text.as_bytes()),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.as_str() == b.as_str(),
            (Self::Bytes(a), Self::Bytes(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

struct Source {
    label: String,
    reader: Option<Box<dyn BufRead>>,
}

/// A shared, closable handle over a file or piped standard input.
///
/// Clones share the same underlying reader, so a handle held by a function
/// body observes [`Stream::close`] performed by whoever opened it.
#[derive(Clone)]
pub struct Stream {
    source: Rc<RefCell<Source>>,
    kind: StreamKind,
}

impl Stream {
    pub(crate) fn new(label: impl Into<String>, reader: Box<dyn BufRead>, kind: StreamKind) -> Self {
        Self {
            source: Rc::new(RefCell::new(Source {
                label: label.into(),
                reader: Some(reader),
            })),
            kind,
        }
    }

    /// Wrap any reader as a stream.
    pub fn from_reader(label: impl Into<String>, reader: impl Read + 'static, kind: StreamKind) -> Self {
        Self::new(label, Box::new(BufReader::new(reader)), kind)
    }

    /// Open a file for reading.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file cannot be opened.
    pub fn open(path: &Path, kind: StreamKind) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(path.display().to_string(), file, kind))
    }

    /// Another view of the same underlying source with a different kind.
    pub(crate) fn view(&self, kind: StreamKind) -> Self {
        Self {
            source: Rc::clone(&self.source),
            kind,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.source.borrow().label.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.source.borrow().reader.is_none()
    }

    /// Release the underlying reader. Closing twice is a no-op.
    pub fn close(&self) {
        self.source.borrow_mut().reader = None;
    }

    /// Whether both handles share one underlying source.
    #[must_use]
    pub fn same_source(&self, other: &Stream) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }

    fn with_reader<T>(&self, f: impl FnOnce(&mut dyn BufRead) -> io::Result<T>) -> io::Result<T> {
        let mut source = self.source.borrow_mut();
        let reader = source
            .reader
            .as_mut()
            .ok_or_else(|| io::Error::other("I/O operation on closed stream"))?;
        f(reader.as_mut())
    }

    /// Read everything that is left as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the stream is closed or the read fails.
    pub fn read_to_end(&self) -> io::Result<Vec<u8>> {
        self.with_reader(|reader| {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        })
    }

    /// Read everything that is left as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the stream is closed, the read fails or the content
    /// is not valid UTF-8.
    pub fn read_to_string(&self) -> io::Result<String> {
        let bytes = self.read_to_end()?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Read one line without its terminator, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the stream is closed, the read fails or the line is
    /// not valid UTF-8.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let bytes = self.with_reader(|reader| {
            let mut buf = Vec::new();
            reader.read_until(b'\n', &mut buf)?;
            Ok(buf)
        })?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let mut line =
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Iterate over the remaining lines.
    #[must_use]
    pub fn lines(&self) -> Lines {
        Lines {
            stream: self.clone(),
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("label", &self.label())
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Line iterator returned by [`Stream::lines`].
pub struct Lines {
    stream: Stream,
}

impl Iterator for Lines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.read_line().transpose()
    }
}

/// A typed argument value.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Map(IndexMap<String, Value>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Pattern(Pattern),
    Path(PathBuf),
    Stream(Stream),
}

impl Value {
    /// Build a set, dropping duplicates while keeping first-seen order.
    #[must_use]
    pub fn set(values: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self::Set(unique)
    }

    /// Name of the value's type, as used in messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Map(_) => "dict",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Pattern(_) => "Pattern",
            Self::Path(_) => "Path",
            Self::Stream(_) => "stream",
        }
    }

    /// Source-literal form, as written in signature defaults.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\"")),
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a list, tuple or set.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Self::Pattern(pattern) => Some(pattern),
            _ => None,
        }
    }

    /// Convert a decoded JSON document into a value.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert into JSON. Values with no JSON counterpart become strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::None => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

fn format_float(f: f64) -> String {
    // Debug keeps the fractional part of integral floats: 1.0, not 1
    format!("{f:?}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Self::List(_) | Self::Tuple(_) | Self::Set(_) | Self::Map(_) => {
                write!(f, "{}", self.to_json())
            }
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Pattern(p) => write!(f, "{}", p.as_str()),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Stream(s) => write!(f, "{}", s.label()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a.len() == b.len() && a.iter().all(|v| b.contains(v)),
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Stream(a), Self::Stream(b)) => a.same_source(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_display_matches_shell_conventions() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::from(vec!["a", "b c"]).to_string(), r#"["a","b c"]"#);
    }

    #[test]
    fn test_set_is_order_insensitive_and_unique() {
        let a = Value::set(vec![Value::from("a"), Value::from("b"), Value::from("a")]);
        let b = Value::Set(vec![Value::from("b"), Value::from("a")]);
        assert_eq!(a, b);
        assert_eq!(a.as_slice().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_int_and_bool_are_distinct() {
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_from_json_keeps_integers_integral() {
        let json: serde_json::Value = serde_json::from_str(r#"{"one": 2, "three": [4, 5.5]}"#)
            .unwrap_or(serde_json::Value::Null);
        let value = Value::from_json(json);
        let map = value.as_map().cloned().unwrap_or_default();
        assert_eq!(map.get("one"), Some(&Value::Int(2)));
        assert_eq!(
            map.get("three"),
            Some(&Value::List(vec![Value::Int(4), Value::Float(5.5)]))
        );
    }

    #[test]
    fn test_repr_quotes_strings() {
        assert_eq!(Value::from("a \"b\"").repr(), r#""a \"b\"""#);
        assert_eq!(Value::from(vec![1_i64, 2]).repr(), "[1, 2]");
        assert_eq!(Value::None.repr(), "None");
    }

    #[test]
    fn test_stream_lines_and_close() {
        let stream = Stream::from_reader("mem", Cursor::new(b"one\r\ntwo\n".to_vec()), StreamKind::Text);
        let clone = stream.clone();
        let lines: Vec<String> = stream.lines().filter_map(Result::ok).collect();
        assert_eq!(lines, vec!["one", "two"]);

        stream.close();
        assert!(clone.is_closed());
        assert!(clone.read_to_string().is_err());
    }

    #[test]
    fn test_text_stream_rejects_invalid_utf8() {
        let stream = Stream::from_reader("mem", Cursor::new(vec![0x02, 0xc5, 0xd8]), StreamKind::Text);
        let err = stream.read_to_string().map(|_| ()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_views_share_source() {
        let stream = Stream::from_reader("mem", Cursor::new(b"abc".to_vec()), StreamKind::Binary);
        let text = stream.view(StreamKind::Text);
        assert!(text.same_source(&stream));
        assert_eq!(text.kind(), StreamKind::Text);
        assert_eq!(stream.read_to_end().unwrap_or_default(), b"abc");
        assert_eq!(text.read_to_string().unwrap_or_default(), "");
    }
}
