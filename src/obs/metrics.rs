//! Counters published through the `metrics` facade when the `metrics` feature is enabled.

// self
use crate::{
	obs::{OpKind, OpOutcome},
	validator::Validation,
};

/// Attempts, cache hits, successes, and failures, labeled by `op` and `outcome`.
pub const OPERATION_COUNTER: &str = "persona_auth_operation_total";
/// Validation verdicts, labeled by `result` (`valid` or a failure symbol).
pub const VALIDATION_COUNTER: &str = "persona_auth_validation_total";

/// Counts one `outcome` of `kind`.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(OPERATION_COUNTER, "op" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts one validation verdict.
pub fn record_verdict(verdict: Validation) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(VALIDATION_COUNTER, "result" => verdict.label()).increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = verdict;
	}
}
