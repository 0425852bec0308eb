//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `persona_auth.op` with the `op`
//!   and `stage` fields, plus debug events for cache lookups and warn events for rejected tokens.
//! - Enable `metrics` to increment the `persona_auth_operation_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and `persona_auth_validation_total`
//!   for every validation verdict, labeled by `result`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, validator::Validation};

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Client-credentials token issuance.
	IssueToken,
	/// Signing key retrieval.
	FetchPublicKey,
	/// Inbound token validation.
	ValidateToken,
	/// Remote token record lookup.
	FetchTokenRecord,
	/// Authorized request issued by a resource client.
	ResourceRequest,
	/// Signed login payload check.
	ValidateLogin,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::IssueToken => "issue_token",
			OpKind::FetchPublicKey => "fetch_public_key",
			OpKind::ValidateToken => "validate_token",
			OpKind::FetchTokenRecord => "fetch_token_record",
			OpKind::ResourceRequest => "resource_request",
			OpKind::ValidateLogin => "validate_login",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Served from cache without a remote call.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::CacheHit => "cache_hit",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of an instrumented operation.
pub fn record_result<T, E>(kind: OpKind, result: &Result<T, E>) {
	match result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(_) => record_op_outcome(kind, OpOutcome::Failure),
	}
}

/// Records the outcome of a validation, counting its verdict when one was reached.
pub fn record_validation(result: &Result<Validation>) {
	record_result(OpKind::ValidateToken, result);

	if let Ok(verdict) = result {
		record_verdict(*verdict);
	}
}
