pub mod render;
pub mod tools;

pub use tools::{DiscoverRequest, DiscoveryTools, RegisterRequest};
