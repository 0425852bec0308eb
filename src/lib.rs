//! Async client for Persona-style identity services: cached client-credentials tokens, cached
//! signing keys, and local JWT scope validation.
//!
//! The crate is organised around three collaborators that share a caller-owned
//! [`CacheStore`](cache::CacheStore) and [`HttpTransport`](http::HttpTransport):
//!
//! - [`TokenIssuer`](issuer::TokenIssuer) exchanges client credentials for bearer tokens and
//!   reuses them until shortly before the server-declared expiry.
//! - [`PublicKeyProvider`](keys::PublicKeyProvider) fetches and caches the identity service's
//!   RSA signing key per host.
//! - [`TokenValidator`](validator::TokenValidator) verifies inbound JWTs locally and checks their
//!   scopes, falling back to the identity service when the scope list was too large to embed.
//!
//! [`ResourceClient`](resource::ResourceClient) shows how downstream API wrappers consume the
//! issuer to attach `Authorization: Bearer` headers to outbound requests, and
//! [`Login`](login::Login) runs the browser login flow for registered applications.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod http;
pub mod issuer;
pub mod keys;
pub mod login;
pub mod obs;
pub mod resource;
pub mod validator;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
