//! Topic registry
//!
//! Maps topic names to open topics, creates topics on first use, and
//! recovers every topic with a log on disk at startup.

mod errors;
#[allow(clippy::module_inception)]
mod registry;

pub use errors::{RegistryError, RegistryResult};
pub use registry::TopicRegistry;
