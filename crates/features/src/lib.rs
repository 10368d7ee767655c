//! AuthorMatch Feature Service
//!
//! Emits per-(author, paper) feature rows for labeled and unlabeled
//! assignments, and nearest labeled authors for query authors.

pub mod errors;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod validation;

pub use errors::{FeatureError, Result};
pub use pipeline::{execute, Command, Pipeline};
pub use processor::{FeatureEmitter, FeatureRecord, PassStats};
