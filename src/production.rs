//! Rewriting rules.

use crate::error::Result;
use crate::symbol::{Symbol, Variables};
use std::fmt;
use std::sync::Arc;

/// Predicate over the variables bound by a predecessor match.
pub type Condition = Arc<dyn Fn(&Variables) -> bool + Send + Sync>;

/// A single production `predecessor : condition -> successor`, optionally
/// weighted for stochastic selection.
#[derive(Clone)]
pub struct Production {
    predecessor: Vec<Symbol>,
    condition: Option<Condition>,
    successor: Vec<Symbol>,
    probability: Option<f64>,
}

impl Production {
    /// Creates an unconditional, unweighted production.
    ///
    /// `predecessor` should hold [`Symbol::Atomic`] and [`Symbol::Pattern`]
    /// elements; any other shape still matches by name and arity but binds
    /// no variables.
    pub fn new(predecessor: impl Into<Vec<Symbol>>, successor: impl Into<Vec<Symbol>>) -> Self {
        Self {
            predecessor: predecessor.into(),
            condition: None,
            successor: successor.into(),
            probability: None,
        }
    }

    /// Guards the production with a condition on the bound variables.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Variables) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Assigns a selection weight.
    ///
    /// The value is stored as given. A weight outside `[0, 1]` is rejected
    /// as ambiguous once this production competes with others for a window.
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn predecessor(&self) -> &[Symbol] {
        &self.predecessor
    }

    pub fn successor(&self) -> &[Symbol] {
        &self.successor
    }

    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    pub fn len(&self) -> usize {
        self.predecessor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessor.is_empty()
    }

    /// Pairs each predecessor parameter name with the value at the same
    /// position in the matched window element.
    pub fn bind(&self, window: &[Symbol]) -> Variables {
        let mut vars = Variables::new();
        for (pattern, actual) in self.predecessor.iter().zip(window) {
            if let Symbol::Pattern { params, .. } = pattern {
                for (param, value) in params.iter().zip(actual.values()) {
                    vars.insert(param.clone(), *value);
                }
            }
        }
        vars
    }

    /// True when the window is element-wise match-compatible with the
    /// predecessor and the condition (if any) holds.
    pub fn applies_to(&self, window: &[Symbol]) -> bool {
        if window.len() != self.predecessor.len()
            || !self.predecessor.iter().zip(window).all(|(p, w)| p.matches(w))
        {
            return false;
        }
        match &self.condition {
            Some(condition) => condition(&self.bind(window)),
            None => true,
        }
    }

    /// Evaluates the successor template against bound variables.
    pub fn expand(&self, vars: &Variables) -> Result<Vec<Symbol>> {
        self.successor.iter().map(|s| s.evaluate(vars)).collect()
    }
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("predecessor", &crate::symbol::render_word(&self.predecessor))
            .field("conditional", &self.condition.is_some())
            .field("successor", &crate::symbol::render_word(&self.successor))
            .field("probability", &self.probability)
            .finish()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            crate::symbol::render_word(&self.predecessor),
            crate::symbol::render_word(&self.successor)
        )?;
        if let Some(p) = self.probability {
            write!(f, " ({p})")?;
        }
        Ok(())
    }
}
