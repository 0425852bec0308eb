//! Client-level error types shared across the issuer, key provider, validator, and caches.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Remote failures are split three ways so callers can tell "the service rejected the request"
/// ([`Error::Client`]) from "the service is reachable but failing" ([`Error::Server`]) and "the
/// service could not be reached" ([`Error::ServerCommunication`]).
#[derive(Debug, ThisError)]
pub enum Error {
	/// The remote service answered with a 4xx status.
	#[error(transparent)]
	Client(#[from] ClientError),
	/// The remote service answered with a 5xx status.
	#[error("Remote service failed with HTTP {status}.")]
	Server {
		/// HTTP status code returned by the service.
		status: u16,
	},
	/// The remote service could not be reached or answered with an unusable status.
	#[error(transparent)]
	ServerCommunication(#[from] TransportError),
	/// The signing key served by the identity service is not a usable RSA public key.
	#[error("Public key could not be parsed.")]
	InvalidKey {
		/// Underlying PEM/DER parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// A successful response carried a body that could not be decoded.
	#[error("Remote service returned a malformed response body.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Cache backend failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
}

/// 4xx responses, specialised by the statuses callers commonly branch on.
///
/// Every variant except [`ClientError::NotFound`] keeps the server's `error_description`, and the
/// description is used verbatim as the display message when present.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientError {
	/// HTTP 400.
	#[error("{}", .description.as_deref().unwrap_or("The request was malformed."))]
	BadRequest {
		/// Server-supplied `error_description`.
		description: Option<String>,
	},
	/// HTTP 401.
	#[error("{}", .description.as_deref().unwrap_or("The request was not authenticated."))]
	Unauthorized {
		/// Server-supplied `error_description`.
		description: Option<String>,
	},
	/// HTTP 403.
	#[error("{}", .description.as_deref().unwrap_or("The request was not authorized."))]
	Forbidden {
		/// Server-supplied `error_description`.
		description: Option<String>,
	},
	/// HTTP 404.
	#[error("The requested resource was not found.")]
	NotFound,
	/// HTTP 409.
	#[error("{}", .description.as_deref().unwrap_or("The request conflicts with the resource state."))]
	Conflict {
		/// Server-supplied `error_description`.
		description: Option<String>,
	},
	/// Any other 4xx status.
	#[error("{}", describe_other(.status, .description))]
	Other {
		/// HTTP status code returned by the service.
		status: u16,
		/// Server-supplied `error_description`.
		description: Option<String>,
	},
}
impl ClientError {
	/// Classifies a 4xx status, keeping the optional server description.
	pub fn from_status(status: u16, description: Option<String>) -> Self {
		match status {
			400 => Self::BadRequest { description },
			401 => Self::Unauthorized { description },
			403 => Self::Forbidden { description },
			404 => Self::NotFound,
			409 => Self::Conflict { description },
			status => Self::Other { status, description },
		}
	}

	/// HTTP status code represented by this error.
	pub fn status(&self) -> u16 {
		match self {
			Self::BadRequest { .. } => 400,
			Self::Unauthorized { .. } => 401,
			Self::Forbidden { .. } => 403,
			Self::NotFound => 404,
			Self::Conflict { .. } => 409,
			Self::Other { status, .. } => *status,
		}
	}

	/// Server-supplied `error_description`, if any.
	pub fn description(&self) -> Option<&str> {
		match self {
			Self::BadRequest { description }
			| Self::Unauthorized { description }
			| Self::Forbidden { description }
			| Self::Conflict { description }
			| Self::Other { description, .. } => description.as_deref(),
			Self::NotFound => None,
		}
	}
}

fn describe_other(status: &u16, description: &Option<String>) -> String {
	match description {
		Some(description) => description.clone(),
		None => format!("The request was rejected with HTTP {status}."),
	}
}

/// Configuration and validation failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Host or endpoint URL cannot be parsed.
	#[error("Host URL `{url}` is invalid.")]
	InvalidHost {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Host URL cannot carry path segments (e.g., `mailto:`).
	#[error("Host URL `{url}` cannot be used as a base for endpoints.")]
	CannotBeBase {
		/// Offending URL string.
		url: String,
	},
	/// Required environment variable is unset.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` has an invalid value `{value}`.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value found in the environment.
		value: String,
	},
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Scope list failed validation.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, timeouts, unusable statuses).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS).
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request timed out while calling the remote service.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// The service answered with a status that is neither expected nor an error class.
	#[error("Remote service answered with unexpected HTTP {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the service.
		status: u16,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_error_displays_server_description_verbatim() {
		let err = ClientError::from_status(
			400,
			Some("The client credentials are invalid".into()),
		);

		assert_eq!(err.to_string(), "The client credentials are invalid");
		assert_eq!(err.status(), 400);
		assert_eq!(err.description(), Some("The client credentials are invalid"));
	}

	#[test]
	fn client_error_specialises_not_found_and_conflict() {
		assert_eq!(ClientError::from_status(404, Some("gone".into())), ClientError::NotFound);
		assert!(matches!(ClientError::from_status(409, None), ClientError::Conflict { .. }));

		let other = ClientError::from_status(422, None);

		assert_eq!(other.status(), 422);
		assert_eq!(other.to_string(), "The request was rejected with HTTP 422.");
	}

	#[test]
	fn transport_error_converts_into_server_communication_with_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err: Error = TransportError::network(io).into();

		assert!(matches!(err, Error::ServerCommunication(TransportError::Network { .. })));

		let source = StdError::source(&err).expect("Transport error should expose a source.");

		assert_eq!(source.to_string(), "refused");
	}
}
