//! Permissive first pass over the raw tokens.
//!
//! Flags are matched to their options and positional-only parameters are
//! filled from runs of bare tokens. Anything that cannot be placed is kept
//! aside for reconciliation instead of failing the parse.

use super::{Action, Error, Form, OptionSpec};
use crate::caster::Raw;
use crate::typehint::Nargs;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, VecDeque};

#[allow(clippy::expect_used)]
static NEGATIVE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-\d+$|^-\d*\.\d+$").expect("negative number pattern is valid")
});

/// A value assigned to a parameter during scanning.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved {
    Raw(Raw),
    Toggle(bool),
}

/// Outcome of the permissive pass.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Per parameter index.
    pub resolved: Vec<Option<Resolved>>,
    /// Bare tokens no positional could take, with their argv position.
    pub leftovers: Vec<(usize, String)>,
    /// Flags matching no option, with their argv position.
    pub unknown_flags: Vec<(usize, String)>,
}

/// Whether a token should be read as a flag rather than a value.
pub(crate) fn is_flag_like(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !NEGATIVE_NUMBER.is_match(token)
}

pub(crate) struct Scanner<'a> {
    specs: &'a [OptionSpec],
    flags: &'a HashMap<String, (usize, bool)>,
    help_flag: bool,
    positionals: Vec<usize>,
    next_positional: usize,
    scan: Scan,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        specs: &'a [OptionSpec],
        flags: &'a HashMap<String, (usize, bool)>,
        param_count: usize,
    ) -> Self {
        let positionals = specs
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.form == Form::Positional)
            .map(|(i, _)| i)
            .collect();
        Self {
            specs,
            flags,
            help_flag: !flags.contains_key("help"),
            positionals,
            next_positional: 0,
            scan: Scan {
                resolved: vec![None; param_count],
                ..Scan::default()
            },
        }
    }

    pub(crate) fn run(mut self, tokens: &[String]) -> Result<Scan, Error> {
        let mut stretch: Vec<(usize, String)> = Vec::new();
        let mut literal = false;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if literal || !is_flag_like(token) {
                stretch.push((i, token.clone()));
                i += 1;
                continue;
            }
            if token == "--" {
                literal = true;
                i += 1;
                continue;
            }
            if token == "-h" || (token == "--help" && self.help_flag) {
                return Err(Error::Help);
            }

            self.flush(&mut stretch)?;

            let Some(name) = token.strip_prefix("--") else {
                self.scan.unknown_flags.push((i, token.clone()));
                i += 1;
                continue;
            };
            let (name, inline) = match name.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (name, None),
            };
            let Some(&(spec_index, negated)) = self.flags.get(name) else {
                self.scan.unknown_flags.push((i, token.clone()));
                i += 1;
                continue;
            };
            i += 1;

            let spec = &self.specs[spec_index];
            let argument = format!("--{name}");
            match spec.action {
                Action::Toggle => {
                    if let Some(value) = inline {
                        return Err(Error::IgnoredExplicit { argument, value });
                    }
                    self.scan.resolved[spec.index] = Some(Resolved::Toggle(!negated));
                }
                Action::Store => {
                    let raw = match inline {
                        Some(value) => match spec.nargs {
                            Nargs::One => Raw::One(value),
                            Nargs::Exact(1) | Nargs::Any => Raw::Many(vec![value]),
                            Nargs::Exact(n) => return Err(Error::expected(argument, n)),
                        },
                        None => {
                            let available = tokens[i..]
                                .iter()
                                .take_while(|t| !is_flag_like(t))
                                .count();
                            let take = match spec.nargs {
                                Nargs::One => 1,
                                Nargs::Exact(n) => n,
                                Nargs::Any => available,
                            };
                            if available < take {
                                return Err(Error::expected(argument, take));
                            }
                            let values: Vec<String> = tokens[i..i + take].to_vec();
                            i += take;
                            match spec.nargs {
                                Nargs::One => Raw::One(values.into_iter().next().unwrap_or_default()),
                                _ => Raw::Many(values),
                            }
                        }
                    };
                    spec.check_choices(&argument, &raw)?;
                    self.scan.resolved[spec.index] = Some(Resolved::Raw(raw));
                }
            }
        }

        self.flush(&mut stretch)?;
        Ok(self.scan)
    }

    /// Assign a run of bare tokens to the next positional-only parameters.
    ///
    /// A variable-count positional takes as many tokens as it can while
    /// leaving enough for the fixed counts of the positionals after it.
    fn flush(&mut self, stretch: &mut Vec<(usize, String)>) -> Result<(), Error> {
        let mut tokens: VecDeque<(usize, String)> = stretch.drain(..).collect();

        while !tokens.is_empty() && self.next_positional < self.positionals.len() {
            let spec = &self.specs[self.positionals[self.next_positional]];
            let reserve: usize = self.positionals[self.next_positional + 1..]
                .iter()
                .map(|&i| match self.specs[i].nargs {
                    Nargs::One => 1,
                    Nargs::Exact(n) => n,
                    Nargs::Any => 0,
                })
                .sum();
            let take = match spec.nargs {
                Nargs::One => 1,
                Nargs::Exact(n) if tokens.len() < n => break,
                Nargs::Exact(n) => n,
                Nargs::Any => tokens.len().saturating_sub(reserve).max(1),
            };

            let values: Vec<String> = tokens.drain(..take).map(|(_, t)| t).collect();
            let raw = match spec.nargs {
                Nargs::One => Raw::One(values.into_iter().next().unwrap_or_default()),
                _ => Raw::Many(values),
            };
            let argument = spec.label.clone();
            spec.check_choices(&argument, &raw)?;
            self.scan.resolved[spec.index] = Some(Resolved::Raw(raw));
            self.next_positional += 1;
        }

        self.scan.leftovers.extend(tokens);
        Ok(())
    }
}
