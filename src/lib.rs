// ============================================================================
// reflectstore
// ============================================================================
//
// Contract-driven data binding between remote REST resources and a
// centralized in-memory store. Resources are described declaratively
// (endpoints + field contract); the library keeps one canonical table per
// resource and exposes records through model instances with CRUD
// semantics and local, uncommitted edit overlays.

pub(crate) mod actions;
pub mod contract;
pub mod core;
pub mod model;
pub mod query;
pub mod store;
pub mod transport;

// Re-export main types for convenience
pub use contract::{Field, FieldConfig, FieldSpec, FieldType, Validate};
pub use crate::core::{Record, RecordId, Result, StoreError};
pub use model::{ApiConfig, Instance, InstanceState, Model, ResourceConfig};
pub use query::{FilterSpec, OrderSpec, Query};
pub use store::{Selector, Store, StoreBuilder};
pub use transport::{HttpTransport, Method, Transport, TransportResponse};
