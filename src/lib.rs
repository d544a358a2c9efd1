//! Host-side integration core for embedded card content: expiry-aware session tokens, slot-keyed
//! container lifecycles, and polled card metrics over one pluggable platform SDK.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod config;
pub mod container;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod metrics;
pub mod obs;
pub mod platform;
pub mod prefs;
pub mod session;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))] pub mod _preludet;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
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
#[cfg(test)] use {color_eyre as _, httpmock as _};
