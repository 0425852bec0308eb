// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("persona_auth.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event describing a cache lookup. Keys are digests, never secrets.
pub fn trace_cache_lookup(kind: OpKind, key: &str, hit: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(op = kind.as_str(), cache_key = key, hit, "cache lookup");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, key, hit);
	}
}

/// Emits a debug event for an outbound request.
pub fn trace_request(kind: OpKind, url: &Url, request_id: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(op = kind.as_str(), url = %url, request_id, "sending request");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, url, request_id);
	}
}

/// Emits a warn event when a token fails validation.
pub fn trace_rejection(reason: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason, detail = %detail, "token rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn events_are_safe_without_subscriber() {
		let url = Url::parse("https://example.com/oauth/keys").expect("URL fixture should parse.");

		trace_cache_lookup(OpKind::FetchPublicKey, "public_key:abc", true);
		trace_request(OpKind::FetchPublicKey, &url, "req-1");
		trace_rejection("expired_token", &"exp in the past");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::ValidateToken, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
