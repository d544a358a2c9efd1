// self
use crate::{
	container::ContainerKind,
	obs::{OpKind, OpOutcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"card_host_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts container creations per kind, so banner churn is visible apart from list churn.
pub fn record_container_outcome(kind: ContainerKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"card_host_container_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Publishes the registry's live-instance count as the `card_host_live_containers` gauge.
pub fn record_live_containers(count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("card_host_live_containers").set(count as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = count;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_is_a_noop_without_recorder() {
		record_op_outcome(OpKind::Acquire, OpOutcome::Failure);
		record_container_outcome(ContainerKind::Banner, OpOutcome::Success);
		record_live_containers(3);
	}
}
