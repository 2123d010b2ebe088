pub mod config;
pub mod error;
pub mod helpers;
pub mod homeharvest;
pub mod ingest;
pub mod listing_structs;
pub mod normalize;
pub mod pipeline;
pub mod presets;

pub use error::{Error, Result};
