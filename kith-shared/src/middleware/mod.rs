mod auth_extractor;
mod metrics_layer;
mod tracing_layer;

pub use metrics_layer::*;
pub use tracing_layer::*;
