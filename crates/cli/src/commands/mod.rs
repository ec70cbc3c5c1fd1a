//! Command implementations.

mod batch;
mod info;
mod validate;

pub use batch::run_batch;
pub use info::run_info;
pub use validate::run_validate;
