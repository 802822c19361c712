pub mod error;
pub mod value;

pub use error::{Result, StoreError};
pub use value::{Record, RecordId, record_id, value_cmp};
