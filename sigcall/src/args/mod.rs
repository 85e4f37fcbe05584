//! Signature-driven argument parsing.
//!
//! A [`FunctionParser`] turns the raw shell tokens for one call into an
//! [`Invocation`]. Parsing happens in three passes:
//!
//! 1. A permissive scan assigns flags and positional-only tokens, keeping
//!    whatever it cannot place.
//! 2. Reconciliation hands the leftover bare tokens to positional-or-keyword
//!    parameters that were not given as flags, in declaration order.
//! 3. Every resolved raw value is cast against its parameter's type.

mod error;
mod help;
mod scan;

pub use error::Error;

use crate::ast::{ParamKind, Parameter, Signature};
use crate::caster::{Caster, Raw};
use crate::input::Input;
use crate::invocation::{Invocation, Parsed};
use crate::params::{ParameterSet, is_boolean, param_nargs};
use crate::typehint::{Nargs, contains_stream, literal_choices};
use crate::value::Value;
use scan::{Resolved, Scanner};
use std::collections::HashMap;

/// How a parameter appears on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Form {
    Positional,
    /// Long flag name without the leading dashes.
    Flag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Store,
    /// `--name` sets true, `--no-name` sets false.
    Toggle,
}

/// Command-line shape of a single parameter.
#[derive(Debug, Clone)]
pub(crate) struct OptionSpec {
    pub index: usize,
    pub form: Form,
    pub action: Action,
    pub nargs: Nargs,
    pub choices: Option<Vec<String>>,
    /// Name used in error messages.
    pub label: String,
}

impl OptionSpec {
    pub(crate) fn check_choices(&self, argument: &str, raw: &Raw) -> Result<(), Error> {
        let Some(choices) = &self.choices else {
            return Ok(());
        };
        let tokens: Vec<&String> = match raw {
            Raw::One(token) => vec![token],
            Raw::Many(tokens) => tokens.iter().collect(),
        };
        match tokens.into_iter().find(|t| !choices.contains(t)) {
            Some(value) => Err(Error::InvalidChoice {
                argument: argument.to_string(),
                value: value.clone(),
                choices: choices.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Parses command-line tokens against one function signature.
pub struct FunctionParser<'a> {
    signature: &'a Signature,
    input: &'a Input,
    stdin_target: Option<usize>,
    specs: Vec<OptionSpec>,
    flags: HashMap<String, (usize, bool)>,
}

impl<'a> FunctionParser<'a> {
    #[must_use]
    pub fn new(signature: &'a Signature, input: &'a Input) -> Self {
        let stdin_target = ParameterSet::new(&signature.params).stdin_target(input.is_piped());
        let specs: Vec<OptionSpec> = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| option_spec(index, param, stdin_target == Some(index)))
            .collect();

        let mut flags = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if let Form::Flag(long) = &spec.form {
                flags.insert(long.clone(), (i, false));
            }
        }
        for (i, spec) in specs.iter().enumerate() {
            if let (Form::Flag(long), Action::Toggle) = (&spec.form, spec.action) {
                flags.entry(format!("no-{long}")).or_insert((i, true));
            }
        }

        tracing::debug!(
            function = %signature.name,
            options = specs.len(),
            stdin_target = ?stdin_target.map(|i| &signature.params[i].name),
            "built option definitions"
        );
        Self {
            signature,
            input,
            stdin_target,
            specs,
            flags,
        }
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        self.signature
    }

    /// Index of the parameter that will receive piped input, if any.
    #[must_use]
    pub fn stdin_target(&self) -> Option<usize> {
        self.stdin_target
    }

    /// Resolve and cast `tokens` into an invocation.
    ///
    /// Files opened while casting are returned with the invocation and
    /// closed when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Err` for unknown or surplus tokens, missing required
    /// parameters, values that fail to cast, and when help is requested.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Parsed, Error> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let params = &self.signature.params;
        let groups = ParameterSet::new(params);

        let mut scan = Scanner::new(&self.specs, &self.flags, params.len()).run(&tokens)?;

        // Piped input wins over anything given on the command line.
        if let Some(target) = self.stdin_target {
            scan.resolved[target] = Some(Resolved::Raw(Raw::One("-".to_string())));
        }

        let mut leftovers = std::mem::take(&mut scan.leftovers).into_iter().peekable();
        let pending: Vec<&OptionSpec> = groups
            .positional_or_keyword()
            .filter(|(index, _)| scan.resolved[*index].is_none())
            .map(|(index, _)| &self.specs[index])
            .collect();
        for (n, spec) in pending.iter().enumerate() {
            if leftovers.peek().is_none() {
                break;
            }
            let last = n + 1 == pending.len();
            let raw = match spec.nargs {
                Nargs::Any if last => Raw::Many(leftovers.by_ref().map(|(_, t)| t).collect()),
                Nargs::Any => Raw::Many(leftovers.next().map(|(_, t)| t).into_iter().collect()),
                Nargs::Exact(k) => Raw::Many(leftovers.by_ref().take(k).map(|(_, t)| t).collect()),
                Nargs::One => match leftovers.next() {
                    Some((_, token)) => Raw::One(token),
                    None => break,
                },
            };
            tracing::trace!(parameter = %params[spec.index].name, raw = %raw, "reconciled positional value");
            spec.check_choices(&spec.label, &raw)?;
            scan.resolved[spec.index] = Some(Resolved::Raw(raw));
        }

        let mut unrecognized: Vec<(usize, String)> = leftovers.collect();
        unrecognized.extend(scan.unknown_flags);
        if !unrecognized.is_empty() {
            unrecognized.sort_by_key(|(position, _)| *position);
            return Err(Error::Unrecognized(
                unrecognized.into_iter().map(|(_, t)| t).collect(),
            ));
        }

        let missing: Vec<String> = groups
            .required()
            .filter(|(index, _)| scan.resolved[*index].is_none())
            .map(|(_, param)| param.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequired(missing));
        }

        if let Some(target) = self.stdin_target {
            let hint = params[target].effective_hint();
            if !hint.as_ref().is_some_and(contains_stream)
                && let Some(text) = self.input.read_text().map_err(Error::Stdin)?
            {
                scan.resolved[target] = Some(Resolved::Raw(Raw::One(text)));
            }
        }

        let mut caster = Caster::new(self.input);
        let mut positional: Vec<Option<Value>> = Vec::new();
        let mut invocation = Invocation::default();
        for ((param, spec), resolved) in params.iter().zip(&self.specs).zip(scan.resolved) {
            let value = match resolved {
                None => None,
                Some(Resolved::Toggle(on)) => Some(Value::Bool(on)),
                Some(Resolved::Raw(raw)) => {
                    let hint = param.effective_hint();
                    let value = caster
                        .cast(raw, hint.as_ref(), param.is_strict())
                        .map_err(|source| Error::Cast {
                            argument: spec.label.clone(),
                            source,
                        })?;
                    Some(value)
                }
            };
            if param.kind == ParamKind::PositionalOnly {
                positional.push(value);
            } else if let Some(value) = value {
                invocation.kwargs.insert(param.name.clone(), value);
            }
        }

        while positional.last().is_some_and(Option::is_none) {
            positional.pop();
        }
        for (value, (_, param)) in positional.into_iter().zip(groups.positional_only()) {
            invocation
                .args
                .push(value.or_else(|| param.default.clone()).unwrap_or(Value::None));
        }

        tracing::debug!(
            function = %self.signature.name,
            args = invocation.args.len(),
            kwargs = invocation.kwargs.len(),
            "parsed invocation"
        );
        Ok(Parsed {
            invocation,
            files: caster.finish(),
        })
    }
}

fn option_spec(index: usize, param: &Parameter, stdin_target: bool) -> OptionSpec {
    let positional = param.kind == ParamKind::PositionalOnly && !stdin_target;
    let boolean = is_boolean(param);

    let (form, label) = if positional {
        (Form::Positional, param.name.clone())
    } else {
        let flag = param.flag();
        let long = flag.strip_prefix("--").unwrap_or(&flag).to_string();
        (Form::Flag(long), flag)
    };
    let action = if boolean && param.kind != ParamKind::PositionalOnly {
        Action::Toggle
    } else {
        Action::Store
    };
    let choices = match action {
        Action::Toggle => None,
        Action::Store if boolean => Some(vec!["true".to_string(), "false".to_string()]),
        Action::Store => literal_choices(param.annotation.as_ref()),
    };

    OptionSpec {
        index,
        form,
        action,
        nargs: if action == Action::Toggle { Nargs::One } else { param_nargs(param) },
        choices,
        label,
    }
}
