pub mod describe;
pub mod export;
pub mod infer;
pub mod ingest;
pub mod profile;
pub mod report;
pub mod xlsx;

pub use crate::domain::ports::{Clock, ConfigProvider, Storage};
pub use crate::utils::error::Result;
