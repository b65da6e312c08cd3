//! Motif catalogue storage.
//!
//! A catalogue maps a label to an ordered list of regions. It is loaded from
//! JSON, counted into, and written back out in the same shape with every
//! counter populated:
//!
//! ```json
//! {
//!   "chr1": [
//!     {"start": 9995, "end": 11005, "name": "p_telomere",
//!      "motifs": {"TTAGGG": 0}, "regex": {"(TTAGGG)(.{0})TTAGGG": 0}}
//!   ],
//!   "unmapped": [
//!     {"start": 0, "end": 0, "name": "all", "motifs": {"TTAGGG": 0}, "regex": {}}
//!   ]
//! }
//! ```
//!
//! Counter values in the input are ignored. A region whose `start` equals
//! its `end` is a wildcard and matches every record of its label.

pub mod store;

pub use store::{CatalogueError, RegionCatalogue};
