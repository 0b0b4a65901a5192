//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file, normalise dates → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Table    │  Vec<Opportunity> with derived fields, immutable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  apply predicates → new Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  counts, ranked sums, rates, indicators
//!   └───────────┘
//! ```
pub mod aggregate;
pub mod dates;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

pub use aggregate::{CategoryCount, CategoryValue, IndicatorSummary};
pub use error::{DataLoadError, DateParseWarning};
pub use filter::{Predicate, PredicateSet};
pub use model::{Category, Flag, Measure, NewOpportunity, Opportunity, Table, YearField};
