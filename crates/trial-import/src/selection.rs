//! Row selection expressions.
//!
//! A selection is a single index, a list of indices, or a string of
//! comma-separated terms. Each string term is either an integer or a range
//! `start:stop` / `start:step:stop` with an exclusive stop. Negative numbers
//! count from the end of the table, as in Python slicing.

use std::fmt;

use serde::{Deserialize, Serialize};
use trial_core::errors::{ErrorInfo, TrialError};

/// Which rows of a table to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// One row.
    Index(i64),
    /// Rows in the given order.
    Indices(Vec<i64>),
    /// Range expression such as `"0:10"`, `"1:2:9"` or `"1,5,-1"`.
    Expr(String),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Index(index) => write!(f, "{index}"),
            Selection::Indices(indices) => {
                let parts: Vec<String> = indices.iter().map(i64::to_string).collect();
                write!(f, "[{}]", parts.join(","))
            }
            Selection::Expr(expr) => f.write_str(expr),
        }
    }
}

impl From<i64> for Selection {
    fn from(index: i64) -> Self {
        Selection::Index(index)
    }
}

impl From<Vec<i64>> for Selection {
    fn from(indices: Vec<i64>) -> Self {
        Selection::Indices(indices)
    }
}

impl From<&str> for Selection {
    fn from(expr: &str) -> Self {
        Selection::Expr(expr.to_string())
    }
}

/// Resolves `selection` against a table of `len` rows.
///
/// Indices past the end are returned as-is; callers check them against the
/// data they index.
pub fn parse_selection(selection: &Selection, len: usize) -> Result<Vec<usize>, TrialError> {
    match selection {
        Selection::Index(index) => Ok(vec![resolve_index(*index, len, selection)?]),
        Selection::Indices(indices) => indices
            .iter()
            .map(|&index| resolve_index(index, len, selection))
            .collect(),
        Selection::Expr(expr) => parse_expr(expr, len),
    }
}

fn parse_expr(expr: &str, len: usize) -> Result<Vec<usize>, TrialError> {
    let body = strip_brackets(expr.trim());
    if body.trim().is_empty() {
        return Err(syntax_error("empty-selection", "selection is empty", expr));
    }
    let mut indices = Vec::new();
    for term in body.split(',') {
        let term = term.trim();
        if term.is_empty() {
            return Err(syntax_error("empty-term", "selection contains an empty term", expr));
        }
        if term.contains(':') {
            indices.extend(parse_range(term, len, expr)?);
        } else {
            let index = parse_int(term, expr)?;
            indices.push(resolve_index(index, len, &Selection::Expr(expr.to_string()))?);
        }
    }
    Ok(indices)
}

fn strip_brackets(expr: &str) -> &str {
    let pairs = [('[', ']'), ('(', ')')];
    for (open, close) in pairs {
        if let Some(inner) = expr
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    expr
}

fn parse_range(term: &str, len: usize, expr: &str) -> Result<Vec<usize>, TrialError> {
    let parts: Vec<&str> = term.split(':').map(str::trim).collect();
    let (start, step, stop) = match parts.as_slice() {
        [start, stop] => (*start, "", *stop),
        [start, step, stop] => (*start, *step, *stop),
        _ => {
            return Err(TrialError::SelectionSyntax(term_error(
                "range-arity",
                "ranges take the form start:stop or start:step:stop",
                expr,
                term,
            )))
        }
    };
    let start = parse_optional_int(start, expr)?;
    let stop = parse_optional_int(stop, expr)?;
    let step = parse_optional_int(step, expr)?.unwrap_or(1);
    if step == 0 {
        return Err(TrialError::SelectionSyntax(term_error(
            "zero-step",
            "range step cannot be zero",
            expr,
            term,
        )));
    }

    let len = len as i64;
    let mut indices = Vec::new();
    if step > 0 {
        let start = clamp_bound(start.unwrap_or(0), len, 0, len);
        let stop = clamp_bound(stop.unwrap_or(len), len, 0, len);
        let mut index = start;
        while index < stop {
            indices.push(index as usize);
            match index.checked_add(step) {
                Some(next) => index = next,
                None => break,
            }
        }
    } else {
        let start = clamp_bound(start.unwrap_or(len - 1), len, -1, len - 1);
        let stop = match stop {
            Some(stop) => clamp_bound(stop, len, -1, len - 1),
            None => -1,
        };
        let mut index = start;
        while index > stop {
            indices.push(index as usize);
            match index.checked_add(step) {
                Some(next) => index = next,
                None => break,
            }
        }
    }
    Ok(indices)
}

/// Applies Python slice-bound rules: negative values count from the end and
/// the result is clamped into `[lower, upper]`.
fn clamp_bound(value: i64, len: i64, lower: i64, upper: i64) -> i64 {
    let value = if value < 0 { value + len } else { value };
    value.clamp(lower, upper)
}

fn parse_optional_int(raw: &str, expr: &str) -> Result<Option<i64>, TrialError> {
    if raw.is_empty() {
        Ok(None)
    } else {
        parse_int(raw, expr).map(Some)
    }
}

fn parse_int(raw: &str, expr: &str) -> Result<i64, TrialError> {
    raw.parse::<i64>().map_err(|err| {
        TrialError::SelectionSyntax(
            term_error("invalid-integer", "selection term is not an integer", expr, raw)
                .with_cause(err),
        )
    })
}

fn resolve_index(index: i64, len: usize, selection: &Selection) -> Result<usize, TrialError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 {
        return Err(TrialError::SelectionSyntax(
            ErrorInfo::new("index-underflow", "negative index reaches before the first row")
                .with_context("selection", selection.to_string())
                .with_context("index", index.to_string())
                .with_context("rows", len.to_string()),
        ));
    }
    Ok(resolved as usize)
}

fn syntax_error(code: &str, message: &str, expr: &str) -> TrialError {
    TrialError::SelectionSyntax(ErrorInfo::new(code, message).with_context("selection", expr))
}

fn term_error(code: &str, message: &str, expr: &str, term: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("selection", expr)
        .with_context("term", term)
}
