mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// self
use common::*;
use datasync_gateway::{
	dispatch::DispatchOptions,
	engine::{MockEngine, ScriptedEngine},
	sync::{ResourceOutcome, SyncRequest, SyncStatus},
};

fn request(names: &[&str], dry_run: bool) -> SyncRequest {
	SyncRequest::from_names(names, dry_run).expect("Request fixture should be valid.")
}

#[tokio::test]
async fn one_failure_yields_partial_failure() {
	let engine = Arc::new(ScriptedEngine::new().fail("b", "duplicate key in target"));
	let dispatcher = dispatcher(&["a", "b"], engine.clone());
	let result = dispatcher.dispatch(&admin(), request(&["a", "b"], false)).await;

	assert_eq!(result.status, SyncStatus::PartialFailure);
	assert_eq!(result.outcome("a"), Some(&ResourceOutcome::succeeded()));
	assert_eq!(result.outcome("b"), Some(&ResourceOutcome::failed("duplicate key in target")));
	assert_eq!(engine.call_count(), 2);
	assert!(!result.dry_run);
	assert_eq!(&*result.requested_by, ADMIN);
}

#[tokio::test]
async fn every_failure_yields_failed_but_still_a_result() {
	let engine = Arc::new(ScriptedEngine::new().fail("a", "connection reset").fail("b", "timeout"));
	let result =
		dispatcher(&["a", "b"], engine).dispatch(&admin(), request(&["a", "b"], false)).await;

	assert_eq!(result.status, SyncStatus::Failed);
	assert_eq!(result.failed().count(), 2);
	assert_eq!(result.succeeded().count(), 0);
}

#[tokio::test]
async fn dry_run_ignores_engine_availability() {
	let engine = Arc::new(
		ScriptedEngine::new().fail("kpi_jornadas", "sqlserver unreachable").fail_batches("down"),
	);
	let result = dispatcher(&["kpi_jornadas"], engine.clone())
		.dispatch(&admin(), request(&["kpi_jornadas", "users"], true))
		.await;

	assert_eq!(result.status, SyncStatus::Simulated);
	assert_eq!(result.outcome("kpi_jornadas"), Some(&ResourceOutcome::simulated()));
	assert_eq!(result.outcome("users"), Some(&ResourceOutcome::SkippedNotWhitelisted));
	assert!(engine.calls().is_empty());
	assert_eq!(engine.batch_count(), 0);
}

#[tokio::test]
async fn empty_whitelist_denies_everything() {
	let result = dispatcher(&[], Arc::new(MockEngine::default()))
		.dispatch(&admin(), request(&["kpi_jornadas", "kpi_turnos"], false))
		.await;

	assert_eq!(result.status, SyncStatus::AllDenied);
	assert_eq!(result.skipped().count(), 2);
	assert!(result.outcomes.values().all(ResourceOutcome::is_skipped));
}

#[tokio::test]
async fn slow_resources_time_out_without_blocking_the_rest() {
	let engine = Arc::new(ScriptedEngine::new().delay("slow", StdDuration::from_secs(5)));
	let options =
		DispatchOptions { max_concurrency: 2, resource_timeout: StdDuration::from_millis(50) };
	let result = dispatcher_with(&["fast", "slow"], engine, options)
		.dispatch(&admin(), request(&["fast", "slow"], false))
		.await;

	assert_eq!(result.status, SyncStatus::PartialFailure);
	assert_eq!(result.outcome("fast"), Some(&ResourceOutcome::succeeded()));
	assert_eq!(result.outcome("slow"), Some(&ResourceOutcome::failed("timeout")));
}

#[tokio::test]
async fn batched_engines_get_a_single_call() {
	let engine = Arc::new(ScriptedEngine::new().batched().fail("c", "lock wait timeout"));
	let result = dispatcher(&["a", "b", "c"], engine.clone())
		.dispatch(&admin(), request(&["a", "b", "c", "d"], false))
		.await;

	assert_eq!(engine.batch_count(), 1);
	assert_eq!(engine.call_count(), 3);
	assert_eq!(result.status, SyncStatus::PartialFailure);
	assert_eq!(result.outcome("c"), Some(&ResourceOutcome::failed("lock wait timeout")));
	assert_eq!(result.outcome("d"), Some(&ResourceOutcome::SkippedNotWhitelisted));
}

#[tokio::test]
async fn concurrency_bound_still_covers_every_resource() {
	let names = (0..12).map(|i| format!("table_{i}")).collect::<Vec<_>>();
	let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
	let engine = Arc::new(ScriptedEngine::new().delay("table_3", StdDuration::from_millis(20)));
	let options =
		DispatchOptions { max_concurrency: 3, resource_timeout: StdDuration::from_secs(5) };
	let result = dispatcher_with(&refs, engine.clone(), options)
		.dispatch(&admin(), request(&refs, false))
		.await;

	assert_eq!(result.status, SyncStatus::Completed);
	assert_eq!(result.succeeded().count(), 12);
	assert_eq!(engine.call_count(), 12);
}
