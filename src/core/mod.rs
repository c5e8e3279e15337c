//! Platform-agnostic core module - shared between the dashboard and CLI

pub mod error;
pub mod history;
pub mod model;
pub mod parser;
pub mod preprocess;
pub mod validation;

pub use error::FetchError;
pub use history::{Metric, MetricHistory};
pub use model::{GpuSample, RawGpu, RawGroup, RawWorkstation, Workstation, WorkstationGroup};
pub use parser::parse_groups;
pub use preprocess::{preprocess, SHARED_GROUP};
pub use validation::{Validated, Validation};
