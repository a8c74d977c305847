#![deny(missing_docs)]
#![doc = "Core types for the trial sequencing engine: conditions, ordering methods, errors and the seeding policy."]

pub mod condition;
pub mod errors;
mod method;
pub mod rng;

pub use condition::{is_valid_field_name, Condition, ConditionList};
pub use errors::{ErrorInfo, TrialError};
pub use method::Method;
pub use rng::{derive_substream_seed, RngHandle};
