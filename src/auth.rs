//! Identity-domain identifiers, credentials, principals, and signed tokens.

pub mod credential;
pub mod id;
pub mod principal;
pub mod token;

pub use credential::*;
pub use id::*;
pub use principal::*;
pub use token::{claims::*, secret::*, service::*};
