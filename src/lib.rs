pub mod bounded_copy;
pub mod error;
pub mod guarded_counter;
pub mod host_check;
pub mod login;

pub use error::DemoError;
