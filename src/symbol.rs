//! The L-System alphabet.
//!
//! A [`Symbol`] is one of exactly four shapes. Words in a derivation only ever
//! hold [`Symbol::Atomic`] and [`Symbol::Value`]; [`Symbol::Pattern`] appears on
//! the predecessor side of a production and [`Symbol::Expression`] on the
//! successor side.

use crate::error::{FloraError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Variables bound by matching a predecessor against a window of the word.
pub type Variables = HashMap<String, f64>;

/// Computes the parameters of a successor symbol from bound variables.
pub type Expr = Arc<dyn Fn(&Variables) -> Vec<f64> + Send + Sync>;

/// A single instruction of an L-System word.
#[derive(Clone)]
pub enum Symbol {
    /// A parameterless instruction such as `[` or `A`.
    Atomic { name: char },
    /// A concrete instance carrying literal parameters, e.g. `F(1.5)`.
    Value { name: char, values: Vec<f64> },
    /// Predecessor-side pattern binding its parameter names to the matched values.
    Pattern { name: char, params: Vec<String> },
    /// Successor-side template computing its values at apply time.
    Expression {
        name: char,
        params: Vec<String>,
        expr: Expr,
    },
}

impl Symbol {
    pub fn atom(name: char) -> Self {
        Self::Atomic { name }
    }

    pub fn value(name: char, values: impl Into<Vec<f64>>) -> Self {
        Self::Value {
            name,
            values: values.into(),
        }
    }

    pub fn pattern<S: Into<String>>(name: char, params: impl IntoIterator<Item = S>) -> Self {
        Self::Pattern {
            name,
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds an expression-bound successor symbol.
    ///
    /// `params` lists every variable `expr` reads; [`evaluate`](Self::evaluate)
    /// refuses to call `expr` unless all of them are bound.
    pub fn expr<S, F>(name: char, params: impl IntoIterator<Item = S>, expr: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Variables) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::Expression {
            name,
            params: params.into_iter().map(Into::into).collect(),
            expr: Arc::new(expr),
        }
    }

    pub fn name(&self) -> char {
        match self {
            Self::Atomic { name }
            | Self::Value { name, .. }
            | Self::Pattern { name, .. }
            | Self::Expression { name, .. } => *name,
        }
    }

    /// Number of parameters this symbol carries or declares.
    pub fn arity(&self) -> usize {
        match self {
            Self::Atomic { .. } => 0,
            Self::Value { values, .. } => values.len(),
            Self::Pattern { params, .. } | Self::Expression { params, .. } => params.len(),
        }
    }

    /// Literal parameters; empty for every variant but [`Symbol::Value`].
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Value { values, .. } => values,
            _ => &[],
        }
    }

    /// Match-compatibility: same name and same arity. Literal values are never
    /// compared.
    pub fn matches(&self, other: &Symbol) -> bool {
        self.name() == other.name() && self.arity() == other.arity()
    }

    /// Resolves a successor template against bound variables.
    ///
    /// Expressions become [`Symbol::Value`]s. A pattern used as a successor
    /// copies the values of its variables through. Atomic and value symbols
    /// are returned unchanged.
    pub fn evaluate(&self, vars: &Variables) -> Result<Symbol> {
        match self {
            Self::Atomic { .. } | Self::Value { .. } => Ok(self.clone()),
            Self::Pattern { name, params } => {
                let values = params
                    .iter()
                    .map(|p| lookup(*name, p, vars))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::value(*name, values))
            }
            Self::Expression { name, params, expr } => {
                for p in params {
                    lookup(*name, p, vars)?;
                }
                Ok(Self::value(*name, expr(vars)))
            }
        }
    }
}

fn lookup(symbol: char, variable: &str, vars: &Variables) -> Result<f64> {
    vars.get(variable)
        .copied()
        .ok_or_else(|| FloraError::MissingVariable {
            symbol,
            variable: variable.to_string(),
        })
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            Self::Atomic { .. } => Ok(()),
            Self::Value { values, .. } => write_list(f, values.iter().map(|v| format!("{v:?}"))),
            Self::Pattern { params, .. } | Self::Expression { params, .. } => {
                write_list(f, params.iter().cloned())
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return Ok(());
    }
    write!(f, "({})", items.join(","))
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic { .. } => write!(f, "Atomic({self})"),
            Self::Value { .. } => write!(f, "Value({self})"),
            Self::Pattern { .. } => write!(f, "Pattern({self})"),
            Self::Expression { .. } => write!(f, "Expression({self})"),
        }
    }
}

/// Renders a word in canonical form, e.g. `F(1.0)[+X]`.
pub fn render_word(word: &[Symbol]) -> String {
    word.iter().map(ToString::to_string).collect()
}

/// Parses a literal word such as `B(0) F[+X]` into atomic and value symbols.
///
/// Whitespace between symbols is skipped. A symbol followed by `(...)` becomes
/// a [`Symbol::Value`] with its comma-separated numbers.
pub fn parse_word(text: &str) -> Result<Vec<Symbol>> {
    let mut word = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if matches!(c, '(' | ')' | ',') {
            return Err(FloraError::Parse {
                offset,
                reason: format!("unexpected `{c}`"),
            });
        }

        if !matches!(chars.peek(), Some((_, '('))) {
            word.push(Symbol::atom(c));
            continue;
        }
        let (open, _) = chars.next().unwrap_or((offset, '('));
        let mut body = String::new();
        let mut closed = false;
        for (_, d) in chars.by_ref() {
            if d == ')' {
                closed = true;
                break;
            }
            body.push(d);
        }
        if !closed {
            return Err(FloraError::Parse {
                offset: open,
                reason: format!("unclosed parameter list for `{c}`"),
            });
        }

        let mut values = Vec::new();
        if !body.trim().is_empty() {
            for item in body.split(',') {
                let item = item.trim();
                let v = item.parse::<f64>().map_err(|_| FloraError::Parse {
                    offset: open,
                    reason: format!("`{item}` is not a number"),
                })?;
                values.push(v);
            }
        }
        word.push(Symbol::value(c, values));
    }

    Ok(word)
}
