//! Function registry, invocation and result printing.
//!
//! A [`Module`] holds named definitions. [`run_from_wrapper`] is the path a
//! generated shell function takes: look the function up, parse the raw
//! arguments against its signature, call it and print what it returns.

use crate::args::{self, FunctionParser};
use crate::ast::{ParamKind, Signature};
use crate::input::Input;
use crate::invocation::Invocation;
use crate::parser::ParseError;
use crate::value::{Pattern, Stream, Value};
use anyhow::{Context, anyhow};
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use thiserror::Error;

type LazyItems = Box<dyn Iterator<Item = anyhow::Result<Output>>>;
type PendingOutput = Pin<Box<dyn Future<Output = anyhow::Result<Output>>>>;
type Body = Box<dyn Fn(&Arguments<'_>) -> anyhow::Result<Output>>;

/// What a function body hands back.
pub enum Output {
    Value(Value),
    /// Items produced on demand and printed as they arrive.
    Lazy(LazyItems),
    /// A result still to be computed asynchronously.
    Pending(PendingOutput),
}

/// How the printer treats an [`Output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Boolean,
    Lazy,
    Pending,
    Plain,
}

impl Output {
    #[must_use]
    pub fn none() -> Self {
        Self::Value(Value::None)
    }

    pub fn lazy<I>(items: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Output>>,
        I::IntoIter: 'static,
    {
        Self::Lazy(Box::new(items.into_iter()))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Output>> + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    #[must_use]
    pub fn kind(&self) -> ReturnKind {
        match self {
            Self::Value(Value::Bool(_)) => ReturnKind::Boolean,
            Self::Value(_) => ReturnKind::Plain,
            Self::Lazy(_) => ReturnKind::Lazy,
            Self::Pending(_) => ReturnKind::Pending,
        }
    }
}

macro_rules! output_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Output {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

output_from!(Value, bool, i64, f64, &str, String, PathBuf);

impl<T: Into<Value>> From<Vec<T>> for Output {
    fn from(items: Vec<T>) -> Self {
        Self::Value(items.into())
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Lazy(_) => write!(f, "Lazy(..)"),
            Self::Pending(_) => write!(f, "Pending(..)"),
        }
    }
}

/// A callable definition: a signature and the code behind it.
pub struct Function {
    signature: Signature,
    body: Body,
}

impl Function {
    pub fn new<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments<'_>) -> anyhow::Result<Output> + 'static,
    {
        Self {
            signature,
            body: Box::new(body),
        }
    }

    /// Build a function from a textual signature.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the signature does not parse.
    pub fn parse<F>(signature: &str, body: F) -> Result<Self, ParseError>
    where
        F: Fn(&Arguments<'_>) -> anyhow::Result<Output> + 'static,
    {
        Ok(Self::new(Signature::parse(signature)?, body))
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.signature.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn parser<'a>(&'a self, input: &'a Input) -> FunctionParser<'a> {
        FunctionParser::new(&self.signature, input)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}

/// The arguments a function body sees, looked up by parameter name.
#[derive(Debug)]
pub struct Arguments<'a> {
    signature: &'a Signature,
    invocation: &'a Invocation,
}

impl<'a> Arguments<'a> {
    #[must_use]
    pub fn new(signature: &'a Signature, invocation: &'a Invocation) -> Self {
        Self {
            signature,
            invocation,
        }
    }

    /// The value for `name`: given by keyword, given by position, or the
    /// declared default.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if let Some(value) = self.invocation.kwargs.get(name) {
            return Some(value);
        }
        let param = self.signature.get(name)?;
        if param.kind == ParamKind::PositionalOnly {
            let position = self
                .signature
                .params
                .iter()
                .filter(|p| p.kind == ParamKind::PositionalOnly)
                .position(|p| p.name == name)?;
            if let Some(value) = self.invocation.args.get(position) {
                return Some(value);
            }
        }
        param.default.as_ref()
    }

    /// Like [`Arguments::get`], failing when the parameter has no value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `name` was not supplied and has no default.
    pub fn require(&self, name: &str) -> anyhow::Result<&'a Value> {
        self.get(name)
            .ok_or_else(|| anyhow!("missing argument '{name}'"))
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not an integer.
    pub fn int(&self, name: &str) -> anyhow::Result<i64> {
        self.require(name)?
            .as_int()
            .with_context(|| format!("argument '{name}' is not an int"))
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not numeric.
    pub fn float(&self, name: &str) -> anyhow::Result<f64> {
        self.require(name)?
            .as_float()
            .with_context(|| format!("argument '{name}' is not a float"))
    }

    /// String form of any argument.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the argument is missing.
    pub fn string(&self, name: &str) -> anyhow::Result<String> {
        Ok(self.require(name)?.to_string())
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not a boolean.
    pub fn boolean(&self, name: &str) -> anyhow::Result<bool> {
        self.require(name)?
            .as_bool()
            .with_context(|| format!("argument '{name}' is not a bool"))
    }

    /// Members of a container argument; a missing optional argument is empty.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the argument is present but not a container.
    pub fn values(&self, name: &str) -> anyhow::Result<&'a [Value]> {
        match self.get(name) {
            None | Some(Value::None) => Ok(&[]),
            Some(value) => value
                .as_slice()
                .with_context(|| format!("argument '{name}' is not a collection")),
        }
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not a stream.
    pub fn stream(&self, name: &str) -> anyhow::Result<&'a Stream> {
        self.require(name)?
            .as_stream()
            .with_context(|| format!("argument '{name}' is not a file"))
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not a path.
    pub fn path(&self, name: &str) -> anyhow::Result<&'a Path> {
        self.require(name)?
            .as_path()
            .with_context(|| format!("argument '{name}' is not a path"))
    }

    /// # Errors
    ///
    /// Returns `Err` if the argument is missing or not a pattern.
    pub fn pattern(&self, name: &str) -> anyhow::Result<&'a Pattern> {
        self.require(name)?
            .as_pattern()
            .with_context(|| format!("argument '{name}' is not a pattern"))
    }
}

/// Call `function` with a parsed invocation.
///
/// A pending result is driven to completion before returning.
///
/// # Errors
///
/// Returns `Err` if the body fails or the async runtime cannot start.
pub fn call(function: &Function, invocation: &Invocation) -> anyhow::Result<Output> {
    tracing::debug!(function = %function.signature.name, "calling function");
    let arguments = Arguments::new(&function.signature, invocation);
    resolve((function.body)(&arguments)?)
}

fn resolve(mut output: Output) -> anyhow::Result<Output> {
    while let Output::Pending(future) = output {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to start async runtime")?;
        output = runtime.block_on(future)?;
    }
    Ok(output)
}

/// Print a result for the shell.
///
/// `None` prints nothing. Lazy items are printed one by one as they are
/// produced. Every printed value ends with a newline.
///
/// # Errors
///
/// Returns `Err` if a lazy item or pending result fails, or on write failure.
pub fn print_result(output: Output, out: &mut dyn Write) -> Result<(), RunError> {
    match output {
        Output::Value(Value::None) => Ok(()),
        Output::Value(value) => {
            let mut text = value.to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            out.write_all(text.as_bytes())?;
            out.flush()?;
            Ok(())
        }
        Output::Lazy(items) => {
            for item in items {
                print_result(item.map_err(RunError::Call)?, out)?;
            }
            Ok(())
        }
        pending @ Output::Pending(_) => print_result(resolve(pending).map_err(RunError::Call)?, out),
    }
}

/// A module-level definition.
#[derive(Debug)]
pub enum Definition {
    Function(Function),
    Variable(Value),
}

/// A named set of definitions that can be exposed to the shell.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub path: PathBuf,
    definitions: IndexMap<String, Definition>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            definitions: IndexMap::new(),
        }
    }

    /// Register a function under its signature's name.
    #[must_use]
    pub fn function(mut self, function: Function) -> Self {
        self.definitions
            .insert(function.signature.name.clone(), Definition::Function(function));
        self
    }

    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.definitions
            .insert(name.into(), Definition::Variable(value.into()));
        self
    }

    /// Look up a callable by name. Dotted names are looked up as registered.
    ///
    /// # Errors
    ///
    /// Returns `Err` if nothing is defined under `name` or it is a variable.
    pub fn get_callable(&self, name: &str) -> Result<&Function, RunError> {
        match self.definitions.get(name) {
            Some(Definition::Function(function)) => Ok(function),
            Some(Definition::Variable(_)) => Err(RunError::NotCallable(name.to_string())),
            None => Err(RunError::NotFound {
                name: name.to_string(),
                module: self.name.clone(),
            }),
        }
    }

    /// Public definitions, in declaration order. Names starting with `_`
    /// are private.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.definitions
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, definition)| (name.as_str(), definition))
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("'{name}' not found in module '{module}'")]
    NotFound { name: String, module: String },

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error(transparent)]
    Args(#[from] args::Error),

    #[error("{0:#}")]
    Call(anyhow::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Look up `name`, parse `raw_args` against it, call it and print the result.
///
/// Files opened for stream arguments are closed before returning, whether
/// the call succeeds or not.
///
/// # Errors
///
/// Returns `Err` if the function is unknown, the arguments do not parse,
/// the call fails or the output cannot be written.
pub fn run_from_wrapper<S: AsRef<str>>(
    module: &Module,
    name: &str,
    raw_args: &[S],
    input: &Input,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let function = module.get_callable(name)?;
    let parsed = function.parser(input).parse(raw_args)?;
    let output = call(function, &parsed.invocation).map_err(RunError::Call)?;
    print_result(output, out)?;
    drop(parsed);
    Ok(())
}
