mod backend;
mod backends;
mod filter;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{ColorBackend, StubBackend};
pub use filter::{DetectionFilter, FilterOutcome};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection};
