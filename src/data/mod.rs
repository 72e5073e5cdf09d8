//! Dataset acquisition.
//!
//! - `fetch`: download the brasil.io CSV (gzip) over HTTP
//! - `sample`: generate a synthetic table with the same schema for offline runs

pub mod fetch;
pub mod sample;

pub use fetch::{DEFAULT_DATASET_URL, DatasetClient, dataset_url_from_env};
pub use sample::generate_table;
