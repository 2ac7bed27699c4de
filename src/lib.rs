//! Authenticated gateway for table synchronization jobs: signed tokens, per-principal rate
//! limits and whitelist gating in front of a pluggable sync engine.
//!
//! Requests flow through [`gateway::Gateway`]: the bearer token is verified, the principal is
//! admitted by the rate limiter, the payload is validated, and the [`dispatch::Dispatcher`]
//! partitions the requested tables through the [`whitelist::Whitelist`] before handing the
//! allowed ones to the bound [`engine::SyncEngine`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod limit;
pub mod obs;
pub mod store;
pub mod sync;
pub mod whitelist;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
