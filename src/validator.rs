//! Local JWT verification and scope checks for inbound bearer tokens.
//!
//! Routine rejections (expired, tampered, under-scoped tokens) come back as [`Validation`]
//! values. Only infrastructure failures, such as an unreachable identity service while fetching
//! the key or an oversized scope list, surface as [`Error`]s.

// crates.io
use jsonwebtoken::{Algorithm, Validation as JwtValidation, errors::ErrorKind};
// self
use crate::{
	_prelude::*,
	auth::{RequestId, SUPERUSER_SCOPE, ScopeSet, Token, TokenClaims},
	issuer::TokenIssuer,
	keys::{PublicKey, PublicKeyProvider},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Outcome of validating a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Validation {
	/// Signature, expiry, and scopes all check out.
	Valid,
	/// The `exp` claim is in the past.
	ExpiredToken,
	/// The token is malformed, signed by another key, or missing its scope claim.
	InvalidToken,
	/// The signing key served by the identity service could not be parsed.
	InvalidKey,
	/// The token does not carry the requested scopes.
	InsufficientScope,
}
impl Validation {
	/// Returns true for [`Validation::Valid`].
	pub const fn is_valid(self) -> bool {
		matches!(self, Self::Valid)
	}

	/// Stable failure symbol (`expired_token`, `invalid_token`, `invalid_key`,
	/// `insufficient_scope`), or `None` when the token is valid.
	pub const fn as_symbol(self) -> Option<&'static str> {
		match self {
			Self::Valid => None,
			Self::ExpiredToken => Some("expired_token"),
			Self::InvalidToken => Some("invalid_token"),
			Self::InvalidKey => Some("invalid_key"),
			Self::InsufficientScope => Some("insufficient_scope"),
		}
	}

	/// Failure symbol, or `valid`.
	pub const fn label(self) -> &'static str {
		match self.as_symbol() {
			Some(symbol) => symbol,
			None => "valid",
		}
	}
}
impl Display for Validation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// What a token is validated against.
#[derive(Clone, Debug)]
pub struct ValidationRequest {
	/// Identity service that issued the token.
	pub host: Url,
	/// Scopes the caller requires; empty accepts any authentic token.
	pub scopes: ScopeSet,
	/// Require every scope (`true`) or at least one (`false`).
	pub all: bool,
	/// Correlation id sent on the key and token-record lookups.
	pub request_id: RequestId,
}
impl ValidationRequest {
	/// Accepts any authentic token from `host`, with a fresh request id.
	pub fn new(host: Url) -> Self {
		Self { host, scopes: ScopeSet::default(), all: true, request_id: RequestId::generate() }
	}

	/// Sets the required scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Chooses between all-of (`true`, the default) and any-of matching.
	pub fn with_all(mut self, all: bool) -> Self {
		self.all = all;

		self
	}

	/// Overrides the correlation id.
	pub fn with_request_id(mut self, request_id: RequestId) -> Self {
		self.request_id = request_id;

		self
	}
}

/// Verifies inbound tokens with the identity service's signing key.
#[derive(Clone, Debug)]
pub struct TokenValidator {
	keys: PublicKeyProvider,
	issuer: TokenIssuer,
}
impl TokenValidator {
	/// Builds a validator. The issuer is only used to look up token records whose scope list was
	/// too large to embed.
	pub fn new(keys: PublicKeyProvider, issuer: TokenIssuer) -> Self {
		Self { keys, issuer }
	}

	/// Validates `token` against `request`, fetching the signing key for `request.host`.
	///
	/// # Errors
	///
	/// Key endpoint failures, and server or communication failures while fetching an oversized
	/// scope list, are returned as errors. Everything else is a [`Validation`].
	pub async fn validate(&self, token: &Token, request: &ValidationRequest) -> Result<Validation> {
		const KIND: OpKind = OpKind::ValidateToken;

		let span = OpSpan::new(KIND, "validate");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = match self.keys.fetch(&request.host, &request.request_id).await {
					Ok(key) => key,
					Err(Error::InvalidKey { source }) => {
						obs::trace_rejection("invalid_key", &source);

						return Ok(Validation::InvalidKey);
					},
					Err(e) => return Err(e),
				};

				self.check(token, &key, request).await
			})
			.await;

		obs::record_validation(&result);

		result
	}

	/// Same as [`TokenValidator::validate`] with a caller-supplied key.
	pub async fn validate_with_key(
		&self,
		token: &Token,
		key: &PublicKey,
		request: &ValidationRequest,
	) -> Result<Validation> {
		const KIND: OpKind = OpKind::ValidateToken;

		let span = OpSpan::new(KIND, "validate_with_key");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.check(token, key, request)).await;

		obs::record_validation(&result);

		result
	}

	async fn check(
		&self,
		token: &Token,
		key: &PublicKey,
		request: &ValidationRequest,
	) -> Result<Validation> {
		let claims = match decode_claims(token, key) {
			Ok(claims) => claims,
			Err(rejection) => return Ok(rejection),
		};
		let provided = if claims.scopes_truncated() {
			match self.issuer.fetch_record(&request.host, token, &request.request_id).await {
				Ok(record) => Some(record.scopes()),
				Err(Error::Client(e)) => {
					obs::trace_rejection("insufficient_scope", &e);

					return Ok(Validation::InsufficientScope);
				},
				Err(e) => return Err(e),
			}
		} else {
			claims.scopes
		};
		let Some(provided) = provided else {
			obs::trace_rejection("invalid_token", &"token carries no scopes claim");

			return Ok(Validation::InvalidToken);
		};

		if scopes_satisfied(&provided, &request.scopes, request.all) {
			Ok(Validation::Valid)
		} else {
			obs::trace_rejection("insufficient_scope", &request.scopes);

			Ok(Validation::InsufficientScope)
		}
	}
}

/// Verifies the RS256 signature and expiry of `token`, returning its claims.
///
/// The signature is checked first, so an expired token signed by another key is
/// [`Validation::InvalidToken`]. No clock leeway is applied.
pub fn decode_claims(token: &Token, key: &PublicKey) -> Result<TokenClaims, Validation> {
	let mut validation = JwtValidation::new(Algorithm::RS256);

	validation.leeway = 0;
	validation.validate_aud = false;
	validation.set_required_spec_claims(&["exp"]);

	jsonwebtoken::decode::<TokenClaims>(token.expose(), key.decoding_key(), &validation)
		.map(|data| data.claims)
		.map_err(|e| {
			let rejection = match e.kind() {
				ErrorKind::ExpiredSignature => Validation::ExpiredToken,
				ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => Validation::InvalidKey,
				_ => Validation::InvalidToken,
			};

			if let Some(reason) = rejection.as_symbol() {
				obs::trace_rejection(reason, &e);
			}

			rejection
		})
}

/// Scope comparison: an empty request or a superuser grant always passes; otherwise every
/// requested scope (`all`) or at least one of them must be granted.
pub fn scopes_satisfied<S>(provided: &[S], requested: &ScopeSet, all: bool) -> bool
where
	S: AsRef<str>,
{
	if requested.is_empty() || provided.iter().any(|scope| scope.as_ref() == SUPERUSER_SCOPE) {
		return true;
	}

	let overlap = requested.overlap(provided);

	if all { overlap == requested.len() } else { overlap > 0 }
}
