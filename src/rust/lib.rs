//! Prepare taxonomy-annotated MSA inputs for structure prediction.
//!
//! Given a fold-input descriptor naming protein chains, this crate runs an
//! external ColabFold-style search, rewrites the resulting alignments so
//! UniRef hits carry species identifiers, and emits an enriched descriptor
//! the downstream inference tool can consume with its own search disabled.

pub mod a3m;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod io;
pub mod pipeline;
pub mod search;
pub mod species;
pub mod types;

pub use config::SearchConfig;
pub use descriptor::FoldInput;
pub use pipeline::{MsaPipeline, TaxonomyMode};
pub use search::{ColabfoldSearch, SearchTool};
