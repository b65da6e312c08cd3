//! Motif search and the counting engine.
//!
//! - [`search`]: Motif, quality-bucketed motif and pattern counting primitives
//! - [`engine`]: Sequential and chunked parallel accumulation over a record stream
//!
//! ## Parallel counting
//!
//! With more than one thread, records are dealt round-robin into one buffer
//! per worker. Once the last buffer holds more than `chunk_size` records,
//! every buffer is tallied into its own zeroed copy of the catalogue and the
//! copies are merged back region by region. Leftover records are flushed
//! through one final cycle, so the result matches a sequential run exactly.

pub mod engine;
pub mod search;

pub use engine::{CountConfig, CountEngine, CountSummary, EngineError};
pub use search::PatternSet;
