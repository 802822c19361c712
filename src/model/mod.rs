pub mod handle;
pub mod instance;
pub mod resource;

pub use handle::Model;
pub use instance::{Instance, InstanceState};
pub use resource::{ActionConfig, ApiConfig, ResourceConfig};
