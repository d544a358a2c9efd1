// self
use crate::{_prelude::*, obs::OpKind};

/// Span builder used around host operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("card_host.op", op = kind.as_str(), stage) }
	}

	/// Creates a span that also records the slot key it operates on.
	pub fn for_slot(kind: OpKind, stage: &'static str, slot: &str) -> Self {
		Self { span: tracing::info_span!("card_host.op", op = kind.as_str(), stage, slot) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> tracing::instrument::Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}

	/// Runs a synchronous section inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		self.span.in_scope(f)
	}
}
