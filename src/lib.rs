//! Client SDK for the RunCast running-weather service—an authenticated request gateway with
//! single-flight credential refresh, typed API operations, and an Open-Meteo weather client.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod session;
pub mod state;
pub mod store;
pub mod weather;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		gateway::{Gateway, GatewayConfig},
		http::ReqwestTransport,
		session::{SessionHandle, TokenSecret, User},
		state::AppState,
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTransport>;

	/// Builds a gateway against the provided base URL with a fresh session and empty local state.
	pub fn build_test_gateway(base_url: &str) -> ReqwestTestGateway {
		let base_url = Url::parse(base_url).expect("Test base URL should parse successfully.");
		let config = GatewayConfig::new(base_url);

		Gateway::new(config, SessionHandle::new(), AppState::default())
	}

	/// Installs a signed-in session on the provided handle for authenticated test calls.
	pub fn seed_session(session: &SessionHandle, access: &str, refresh: Option<&str>) {
		let user = User {
			id: "user-1".into(),
			name: "Test Runner".into(),
			email: "runner@example.com".into(),
			phone_number: "+10000000000".into(),
			city: "Berlin".into(),
		};

		session.sign_in(user, TokenSecret::new(access), refresh.map(TokenSecret::new));
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
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
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
