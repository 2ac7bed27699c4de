//! Synchronization request and result models.

pub mod request;
pub mod resource;
pub mod result;

pub use request::*;
pub use resource::*;
pub use result::*;
