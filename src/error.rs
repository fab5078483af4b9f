//! Error taxonomy for derivation, interpretation and configuration.
//!
//! Every variant is fatal to the single plant generation that raised it.
//! Nothing inside the crate retries; the caller decides whether to skip the
//! instance, substitute a fallback, or abort the scene build.

/// Errors raised while deriving, interpreting or loading a plant.
#[derive(Debug, thiserror::Error)]
pub enum FloraError {
    /// No production matched at any window length down to 1.
    #[error("no production matches `{window}` at position {position} in `{state}`")]
    NoMatchingProduction {
        /// Full rendering of the word being rewritten.
        state: String,
        /// Index of the head cursor.
        position: usize,
        /// Rendering of the length-1 window that failed.
        window: String,
    },

    /// Several productions matched a window but their probabilities are
    /// missing, fall outside `[0, 1]` or do not sum to 1.
    #[error(
        "{candidates} productions match `{window}` but their probabilities {}",
        describe_total(.total)
    )]
    AmbiguousProduction {
        window: String,
        candidates: usize,
        /// `None` when at least one candidate carries no probability.
        total: Option<f64>,
    },

    /// A successor references a variable the predecessor did not bind.
    #[error("successor `{symbol}` references unbound variable `{variable}`")]
    MissingVariable { symbol: char, variable: String },

    /// The turtle met a symbol with no registered operation.
    #[error("unknown turtle instruction `{name}` at position {position}")]
    UnknownInstruction { name: char, position: usize },

    /// A known instruction was given an unsupported number of parameters.
    #[error("instruction `{name}` at position {position} cannot take {arity} parameters")]
    MalformedInstruction {
        name: char,
        arity: usize,
        position: usize,
    },

    /// `~(index)` names no configured sub-model: the index is negative,
    /// fractional, not finite, or past the end of the list.
    #[error("sub-model {index} referenced at {site}, only {available} configured")]
    InvalidSubModelReference {
        /// The index as written in the word.
        index: f64,
        available: usize,
        site: SubModelSite,
    },

    /// `]` without a matching `[`.
    #[error("branch pop at position {position} with an empty stack")]
    UnbalancedBranch { position: usize },

    /// Too many nested `[`.
    #[error("branch stack exceeded {max} entries at position {position}")]
    BranchStackOverflow { max: usize, position: usize },

    /// A literal word could not be parsed.
    #[error("cannot parse word at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    /// A RON growth configuration could not be parsed.
    #[error("failed to parse growth config: {0}")]
    Config(#[source] ron::error::SpannedError),
}

/// Where an invalid sub-model reference was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubModelSite {
    /// Symbol position in the interpreted word.
    Word(usize),
    /// Slot in the placement list handed to the mesh instancer.
    Placement(usize),
}

impl std::fmt::Display for SubModelSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(position) => write!(f, "word position {position}"),
            Self::Placement(slot) => write!(f, "placement {slot}"),
        }
    }
}

fn describe_total(total: &Option<f64>) -> String {
    match total {
        Some(t) => format!("are not a distribution over [0, 1] (sum {t})"),
        None => "are missing".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, FloraError>;
