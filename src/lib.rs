//! # hepdist
//!
//! `hepdist` reduces a file of simulated collision events to a set of weighted kinematic
//! histograms in a single pass. Every event carries a mapping of named weights (one per
//! physics-model hypothesis), and each histogram is bound to one of them, so alternative
//! hypotheses can be compared without re-running the event generator.
//!
//! ```no_run
//! use hepdist::{build_registry, data::io::LheReader, engine::try_run, HepdistResult};
//!
//! # fn main() -> HepdistResult<()> {
//! let reader = LheReader::open("cmsgrid_final.lhe")?.with_weight_filter("(1|.*Coup.*)")?;
//! let histograms = try_run(reader, build_registry())?;
//! histograms.write_pickles("./plots")?;
//! histograms.write_plots("./plots")?;
//! # Ok(())
//! # }
//! ```
#![warn(clippy::perf, clippy::style)]
#![warn(missing_docs)]

use thiserror::Error;

/// Methods for reading and representing [`Event`](crate::data::Event)s.
pub mod data;
/// The single-pass event loop which fills a [`Histograms`] set.
pub mod engine;
/// The [`Histogram`] accumulator and the [`Registry`] which declares them.
pub mod histograms;
/// Utility functions, enums, and four-vectors
pub mod utils;

pub use crate::data::{Event, Particle};
pub use crate::engine::{run, try_run, Engine, RunSummary};
pub use crate::histograms::{build_registry, Histogram, HistogramSpec, Histograms, Registry};
pub use crate::utils::enums::{LeptonFlavor, Observable};
pub use crate::utils::vectors::{Vec3, Vec4};

/// The result type used by all `hepdist` internal methods
pub type HepdistResult<T> = Result<T, HepdistError>;

/// The error type used by all `hepdist` internal methods
#[derive(Error, Debug)]
pub enum HepdistError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An error returned by the Python pickle serializer
    #[error("Pickle conversion error: {0}")]
    PickleError(#[from] serde_pickle::Error),
    /// An invalid weight-name filter
    #[error("Invalid weight filter: {0}")]
    RegexError(#[from] regex::Error),
    /// An event lacks a weight which some histogram is configured to be filled with. The
    /// weight mapping of each event is expected to be complete, so this aborts the run.
    #[error("Event {event} has no weight named \"{key}\"!")]
    MissingWeightKey {
        /// Name of the weight which failed lookup
        key: String,
        /// Zero-based index of the offending event in the input sequence
        event: usize,
    },
    /// A Les Houches event file without a valid header or `<init>` block.
    #[error("Failed to read LHE header: {0}")]
    LheHeaderError(String),
    /// A malformed `<event>` block in a Les Houches event file.
    #[error("Failed to parse LHE event {event}: {reason}")]
    LheParseError {
        /// Zero-based index of the event being read
        event: usize,
        /// What went wrong
        reason: String,
    },
    /// An error raised while drawing a histogram figure.
    #[error("Failed to draw \"{name}\": {reason}")]
    PlotError {
        /// Name of the histogram
        name: String,
        /// What went wrong
        reason: String,
    },
    /// An error which occurs when two histograms with the same name are declared in one
    /// [`Registry`].
    #[error("A histogram by the name \"{name}\" is already registered!")]
    RegistrationError {
        /// Name of histogram which is already registered
        name: String,
    },
    /// An error which occurs when a histogram is declared with an unusable binning.
    #[error("Invalid binning for \"{name}\": {reason}")]
    BinningError {
        /// Name of the histogram
        name: String,
        /// What is wrong with the binning
        reason: String,
    },
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}
