#![deny(missing_docs)]
#![doc = "Core error, hashing and serde types shared by the partially reconstructed background crates."]

pub mod errors;
pub mod hash;
pub mod rng;
pub mod serde;
mod types;

pub use errors::{ErrorInfo, PrecError};
pub use hash::stable_hash_string;
pub use rng::{derive_label_seed, derive_substream_seed, RngHandle};
pub use types::{Regime, SchemaVersion};
pub use self::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
