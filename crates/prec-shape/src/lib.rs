//! Partially reconstructed background shapes.
//!
//! Several truth-categorized simulation samples are selected, weighted and
//! concatenated; each category gets a kernel density, and the surviving
//! categories are mixed with fixed fractions from their weighted yields.
//! Per-category tables are memoized in a content-addressed disk cache.
//!
//! ```no_run
//! use prec_frame::{InMemorySource, StaticSelection};
//! use prec_pdf::KdeOptions;
//! use prec_shape::{Collaborators, Observable, PrecBuilder, WeightConfig};
//!
//! # fn main() -> Result<(), prec_core::PrecError> {
//! let collaborators = Collaborators::new(InMemorySource::new(), StaticSelection::default());
//! let prec = PrecBuilder::new(["Bu_JpsiX", "Bd_JpsiX"], "Hlt2RD_BuToKpEE", "jpsi", WeightConfig::ALL)
//!     .build(collaborators)?;
//! let observable = Observable::new("mass", 4500.0, 6000.0)?;
//! let outcome = prec.get_sum("prec", "B_const_mass_M", &observable, &KdeOptions::default())?;
//! if let Some(shape) = outcome.shape {
//!     println!("yield seed: {}", shape.weighted_yield());
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod assembler;
pub mod cache;
pub mod categories;
pub mod config;
pub mod density;
pub mod loader;
pub mod mixture;
mod prec;
pub mod readers;
pub mod report;
pub mod weights;

pub use assembler::{TableAssembler, WGT_BR, WGT_DEC, WGT_SAM};
pub use cache::{CacheEntry, CacheKey, CacheLookup, ContentCache};
pub use categories::{categories_for, Category, CategoryMap, CategoryScheme, IdMatch, Predicate};
pub use config::{BoundsPolicy, Observable, PrecConfig};
pub use density::{CategoryDensity, DensityBuilder};
pub use loader::{BremCategory, LoadedSample, SampleLoader};
pub use mixture::{combine, MixtureDensity, PrecShape};
pub use prec::{Collaborators, Prec, PrecBuilder, PrecOutcome};
pub use readers::{
    DecayWeightReader, MotherIdDecayWeights, ProcessShareWeights, SampleWeightReader, LEGS,
};
pub use report::{BuildReport, CacheEvent, SkippedCategory};
pub use weights::{normalize, WeightConfig};
