//! Common types and utilities shared across the gistmap crates.

pub mod bounds;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod feature;
pub mod query;
pub mod row;
pub mod topology;

pub use bounds::{LatLng, LatLngBounds};
pub use config::{ColorRange, Configuration, LayerConfig, RangeStop, ThematicLayer};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use error::{MapError, MapResult};
pub use feature::FeatureDocument;
pub use query::{parse_query_string, QueryArgs};
pub use row::{AttributeRow, DataTable};
pub use topology::Topology;
