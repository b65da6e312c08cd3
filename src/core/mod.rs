//! Core data types for motif counting.
//!
//! - [`Record`]: One sequence observation with its placement, label and optional quality
//! - [`Region`]: A named interval carrying motif, histogram and pattern counters
//!
//! ## Labels
//!
//! A record's label selects the region list it is tallied against:
//!
//! | Label | Meaning |
//! |-------|---------|
//! | reference name | Mapped aligned read that passed both thresholds |
//! | `unmapped` | Unaligned input, or an aligned read without placement |
//! | `qv_fail` | Mean base quality below the quality-value threshold |
//! | `mapq_fail` | Mapping quality below the mapping-quality threshold |
//! | `other` | Catalogue fallback for labels it does not list |

pub mod record;
pub mod region;

pub use record::Record;
pub use region::Region;
