//! The derivation engine.
//!
//! An [`LSystem`] holds the current word and a production set, and rewrites
//! the whole word once per [`perform_derivation_step`](LSystem::perform_derivation_step).
//! Matching is maximal-munch: at each head position the longest predecessor
//! window that any production accepts wins. Ties between several productions
//! on the same window are broken by a weighted draw from the caller's RNG.

use crate::error::{FloraError, Result};
use crate::production::Production;
use crate::sampling::{pick_weighted, weights_sum_to_one};
use crate::symbol::{Symbol, render_word};
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// A stochastic, parametric L-System.
#[derive(Clone, Debug)]
pub struct LSystem {
    axiom: Vec<Symbol>,
    current: Vec<Symbol>,
    ignored: HashSet<char>,
    productions: Vec<Production>,
    longest_predecessor: usize,
    generation: usize,
}

impl LSystem {
    pub fn new(axiom: impl Into<Vec<Symbol>>) -> Self {
        let axiom = axiom.into();
        Self {
            current: axiom.clone(),
            axiom,
            ignored: HashSet::new(),
            productions: Vec::new(),
            longest_predecessor: 0,
            generation: 0,
        }
    }

    /// Marks symbol names as inert passengers: copied through each step, never
    /// matched or consumed by a production.
    pub fn ignore(mut self, names: impl IntoIterator<Item = char>) -> Self {
        self.ignored.extend(names);
        self
    }

    pub fn with_production(mut self, production: Production) -> Self {
        self.add_production(production);
        self
    }

    pub fn add_production(&mut self, production: Production) {
        self.longest_predecessor = self.longest_predecessor.max(production.len());
        self.productions.push(production);
    }

    pub fn axiom(&self) -> &[Symbol] {
        &self.axiom
    }

    pub fn state(&self) -> &[Symbol] {
        &self.current
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn ignored(&self) -> &HashSet<char> {
        &self.ignored
    }

    /// Number of steps applied since construction or the last [`reset`](Self::reset).
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Canonical rendering of the current word.
    pub fn render(&self) -> String {
        render_word(&self.current)
    }

    /// Returns to the axiom.
    pub fn reset(&mut self) {
        self.current = self.axiom.clone();
        self.generation = 0;
    }

    /// Rewrites the whole word once and returns the rendering of the result.
    ///
    /// On error the current word is left untouched.
    pub fn perform_derivation_step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        let state = &self.current;
        let mut next = Vec::with_capacity(state.len() * 2);
        let mut head = 0;

        while head < state.len() {
            let symbol = &state[head];
            if self.ignored.contains(&symbol.name()) {
                next.push(symbol.clone());
                head += 1;
                continue;
            }

            let (production, len) = self.select(head, rng)?;
            let window = &state[head..head + len];
            let vars = production.bind(window);
            trace!(
                position = head,
                window = %render_word(window),
                production = %production,
                "applying production"
            );
            next.extend(production.expand(&vars)?);
            head += len;
        }

        self.current = next;
        self.generation += 1;
        let rendered = self.render();
        debug!(
            generation = self.generation,
            symbols = self.current.len(),
            "derivation step complete"
        );
        Ok(rendered)
    }

    /// Picks the production for the window starting at `head`, longest first.
    fn select<R: Rng + ?Sized>(&self, head: usize, rng: &mut R) -> Result<(&Production, usize)> {
        let state = &self.current;
        let max_len = self.longest_predecessor.min(state.len() - head);

        for len in (1..=max_len).rev() {
            let window = &state[head..head + len];
            let candidates: Vec<&Production> = self
                .productions
                .iter()
                .filter(|p| p.applies_to(window))
                .collect();

            match candidates.as_slice() {
                [] => continue,
                [only] => return Ok((*only, len)),
                _ => return Ok((choose(&candidates, window, rng)?, len)),
            }
        }

        let end = (head + 1).min(state.len());
        Err(FloraError::NoMatchingProduction {
            state: render_word(state),
            position: head,
            window: render_word(&state[head..end]),
        })
    }

    /// Applies `iterations` derivation steps and returns the final rendering.
    pub fn derive<R: Rng + ?Sized>(&mut self, iterations: usize, rng: &mut R) -> Result<String> {
        for _ in 0..iterations {
            self.perform_derivation_step(rng)?;
        }
        Ok(self.render())
    }

    /// Draws an iteration count from `range`, then derives that many steps.
    ///
    /// The count is drawn before any production tie-break so the draw order is
    /// stable for a given seed.
    pub fn derive_range<R: Rng + ?Sized>(
        &mut self,
        range: RangeInclusive<usize>,
        rng: &mut R,
    ) -> Result<String> {
        let iterations = if range.is_empty() {
            *range.start()
        } else {
            rng.random_range(range)
        };
        debug!(iterations, "deriving");
        self.derive(iterations, rng)
    }
}

/// Stochastic tie-break between several productions accepting the same window.
///
/// Validates the probabilities before touching the RNG: every weight must lie
/// in `[0, 1]` and together they must sum to 1.
fn choose<'a, R: Rng + ?Sized>(
    candidates: &[&'a Production],
    window: &[Symbol],
    rng: &mut R,
) -> Result<&'a Production> {
    let ambiguous = |total| FloraError::AmbiguousProduction {
        window: render_word(window),
        candidates: candidates.len(),
        total,
    };

    let weights: Option<Vec<f64>> = candidates.iter().map(|p| p.probability()).collect();
    let weights = weights.ok_or_else(|| ambiguous(None))?;
    let total: f64 = weights.iter().sum();
    let in_range = weights.iter().all(|w| (0.0..=1.0).contains(w));
    if !in_range || !weights_sum_to_one(weights.iter().copied()) {
        return Err(ambiguous(Some(total)));
    }

    let items: Vec<(&'a Production, f64)> =
        candidates.iter().copied().zip(weights).collect();
    pick_weighted(&items, rng)
        .copied()
        .ok_or_else(|| ambiguous(Some(1.0)))
}
