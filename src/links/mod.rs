//! User link records and favicon propagation into them

pub mod model;
pub mod sync;

pub use model::{LinkRecord, records_mut};
pub use sync::LinkIconSync;
