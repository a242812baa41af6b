pub mod attestation;
pub mod ranking;
pub mod registration;
pub mod service;

pub use crate::domain::model::{QueryCriteria, RankedResult, ServiceRecord};
pub use crate::domain::ports::DiscoveryBackend;
pub use crate::utils::error::Result;
