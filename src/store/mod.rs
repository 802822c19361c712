pub mod getters;
pub mod store;
pub mod table;

pub use getters::Selector;
pub use store::{Store, StoreBuilder};
pub use table::TableState;
