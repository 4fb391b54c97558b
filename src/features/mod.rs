pub mod alert;
pub mod seen_store;

pub use seen_store::{SeenSet, StoreError};
