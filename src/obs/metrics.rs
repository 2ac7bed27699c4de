// self
use crate::{
	obs::{OpKind, OpOutcome},
	sync::ResourceOutcome,
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"datasync_gateway_op_total",
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

/// Records one per-resource dispatch outcome.
pub fn record_resource_outcome(outcome: &ResourceOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("datasync_gateway_resource_total", "outcome" => outcome.label())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_installed_exporter() {
		record_op_outcome(OpKind::Sync, OpOutcome::Failure);
		record_resource_outcome(&ResourceOutcome::SkippedNotWhitelisted);
	}
}
