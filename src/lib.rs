pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod optimizer;
pub mod similarity;
pub mod text;
pub mod util;

pub use crate::error::{CfResult, CodfrelError};
