//! User-friendly parse error types and formatting.
//!
//! Converts raw pest parser errors, and semantic errors found while building
//! a signature, into structured diagnostics with source context, a column
//! indicator and an optional hint.

use std::fmt;

use super::Rule;

/// A structured, user-friendly signature error.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message (no raw rule names).
    pub message: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed) where the error begins.
    pub col: usize,
    /// End column for span errors (used to size the underline caret).
    pub col_end: Option<usize>,
    /// The full text of the offending source line.
    pub source_line: Option<String>,
    /// Optional suggestion to help the user fix the error.
    pub hint: Option<String>,
}

impl ParseError {
    /// Build a `ParseError` from a pest error, enriching it with source context.
    pub fn from_pest(error: &pest::error::Error<Rule>, source: &str) -> Self {
        let (line, col, col_end) = match error.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c, None),
            pest::error::LineColLocation::Span((sl, sc), (el, ec)) => {
                let end = if sl == el { Some(ec) } else { None };
                (sl, sc, end)
            }
        };

        let source_line = line_of(source, line);

        let (message, hint) = match &error.variant {
            pest::error::ErrorVariant::ParsingError { positives, .. } => (
                friendly_message(positives),
                friendly_hint(positives, source_line.as_deref()),
            ),
            pest::error::ErrorVariant::CustomError { message } => (message.clone(), None),
        };

        ParseError {
            message,
            line,
            col,
            col_end,
            source_line,
            hint,
        }
    }

    /// An error about a well-formed piece of the descriptor, such as a
    /// duplicate parameter name.
    pub fn at(message: impl Into<String>, source: &str, span: pest::Span<'_>) -> Self {
        let (line, col) = span.start_pos().line_col();
        let (end_line, end_col) = span.end_pos().line_col();
        ParseError {
            message: message.into(),
            line,
            col,
            col_end: (end_line == line).then_some(end_col),
            source_line: line_of(source, line),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn line_of(source: &str, line: usize) -> Option<String> {
    source
        .lines()
        .nth(line.saturating_sub(1))
        .map(str::to_string)
}

/// Return a short, user-facing label for a grammar rule, or `None` to omit it.
fn rule_label(rule: Rule) -> Option<&'static str> {
    match rule {
        Rule::identifier | Rule::dotted_identifier => Some("identifier"),
        Rule::param => Some("parameter"),
        Rule::param_list => Some("parameter list"),
        Rule::positional_marker => Some("`/`"),
        Rule::keyword_marker => Some("`*`"),
        Rule::param_type_annotation => Some("type annotation (`: type`)"),
        Rule::param_default => Some("default value (`= value`)"),
        Rule::return_type => Some("return type (`-> type`)"),
        Rule::type_expr | Rule::type_term | Rule::named_type | Rule::generic_type => Some("type"),
        Rule::literal_type => Some("`Literal[...]`"),
        Rule::ellipsis => Some("`...`"),
        Rule::list
        | Rule::string
        | Rule::float
        | Rule::integer
        | Rule::boolean
        | Rule::none => Some("literal value"),
        _ => None,
    }
}

/// Compose a human-readable message from the expected rule set.
fn friendly_message(positives: &[Rule]) -> String {
    let mut named: Vec<&str> = Vec::new();
    for label in positives.iter().copied().filter_map(rule_label) {
        if !named.contains(&label) {
            named.push(label);
        }
    }

    match named.as_slice() {
        [] => "unexpected token".to_string(),
        [single] => format!("expected {single}"),
        [a, b] => format!("expected {a} or {b}"),
        many => match many.split_last() {
            Some((last, rest)) => format!("expected {} or {}", rest.join(", "), last),
            None => "unexpected token".to_string(),
        },
    }
}

/// Return an actionable hint based on the set of expected rules and context.
fn friendly_hint(positives: &[Rule], source_line: Option<&str>) -> Option<String> {
    let has = |r: Rule| positives.contains(&r);

    if source_line.is_some_and(mentions_variadic) {
        return Some(
            "Variadic parameters (`*args`, `**kwargs`) are not supported; \
             use a bare `*` to start keyword-only parameters."
                .to_string(),
        );
    }

    if has(Rule::param) || has(Rule::positional_marker) {
        return Some(
            "Parameters look like `name`, `name: type` or `name: type = default`. \
             Separate them with commas."
                .to_string(),
        );
    }

    if has(Rule::type_expr) || has(Rule::type_term) {
        return Some(
            "Types look like `int`, `list[str]`, `int | None` or `Literal[\"a\", \"b\"]`."
                .to_string(),
        );
    }

    None
}

/// Whether a line contains `*name` or `**name`.
fn mentions_variadic(line: &str) -> bool {
    line.split('*')
        .skip(1)
        .any(|rest| rest.trim_start().starts_with(|c: char| c.is_alphabetic() || c == '_'))
}

/// Format the caret underline for an error at `col` with optional `col_end`.
fn underline(col: usize, col_end: Option<usize>) -> String {
    let start = col.saturating_sub(1);
    let len = col_end.map_or(1, |end| end.saturating_sub(col).max(1));
    format!("{}{}", " ".repeat(start), "^".repeat(len))
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;
        writeln!(f, "  --> {}:{}", self.line, self.col)?;

        if let Some(ref src) = self.source_line {
            let num = self.line.to_string();
            let pad = " ".repeat(num.len());

            writeln!(f, "   {pad} |")?;
            writeln!(f, "   {num} | {src}")?;
            writeln!(f, "   {pad} | {}", underline(self.col, self.col_end))?;
        }

        if let Some(ref hint) = self.hint {
            writeln!(f)?;
            write!(f, "   = hint: {hint}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::{super::SignatureParser, *};
    use pest::Parser;

    fn parse_err(input: &str) -> ParseError {
        let err = SignatureParser::parse(Rule::signature, input)
            .expect_err("expected a parse failure for this input");
        ParseError::from_pest(&err, input)
    }

    #[test]
    fn test_display_includes_location_and_caret() {
        let rendered = parse_err("f(a: int,, b)").to_string();
        assert!(rendered.contains("error:"), "missing prefix in:\n{rendered}");
        assert!(rendered.contains("--> 1:"), "missing location in:\n{rendered}");
        assert!(rendered.contains("f(a: int,, b)"), "missing source in:\n{rendered}");
        assert!(rendered.contains('^'), "missing caret in:\n{rendered}");
    }

    #[test]
    fn test_no_raw_rule_names_in_message() {
        for input in ["f(", "f(a: )", "f(a = )", "(a)"] {
            let err = parse_err(input);
            assert!(
                !err.message.contains("Rule::") && !err.message.contains('_'),
                "raw rule name in message for `{input}`: {}",
                err.message
            );
        }
    }

    #[test]
    fn test_variadic_hint() {
        let err = parse_err("f(*args)");
        assert!(
            err.hint.as_deref().unwrap_or("").contains("Variadic"),
            "unexpected hint: {:?}",
            err.hint
        );
    }

    #[test]
    fn test_multiline_error_points_to_correct_line() {
        let input = "f(\n  a: int,\n  b: ,\n)";
        let err = parse_err(input);
        assert_eq!(err.line, 3);
        assert!(err.source_line.as_deref().unwrap_or("").contains("b:"));
    }
}
