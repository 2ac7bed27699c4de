mod common;

// std
use std::{env, fs, path::PathBuf};
// self
use common::*;
use datasync_gateway::{
	auth::{Password, Role},
	store::{FileIdentityStore, IdentityStore, MemoryIdentityStore, PrincipalRecord, StoreError},
};

fn scratch_file(name: &str) -> PathBuf {
	let dir = env::temp_dir().join(format!("datasync-gateway-{}-{name}", std::process::id()));

	fs::create_dir_all(&dir).expect("Scratch directory should be creatable.");

	dir.join("principals.json")
}

#[tokio::test]
async fn memory_store_serves_bootstrapped_records() {
	let store = admin_store();
	let record = store
		.lookup(&principal_id(ADMIN))
		.await
		.expect("Lookup should succeed.")
		.expect("Bootstrapped principal should be present.");

	assert_eq!(record.role, Role::Admin);
	assert!(record.credential_hash.verify(&Password::new(ADMIN_PASSWORD)));
	assert!(
		store.lookup(&principal_id("ghost")).await.expect("Lookup should succeed.").is_none()
	);
}

#[test]
fn memory_store_rejects_duplicate_principals() {
	let record = PrincipalRecord::new(principal_id(ADMIN), hash(ADMIN_PASSWORD), Role::Admin);
	let err = MemoryIdentityStore::from_records([record.clone(), record])
		.expect_err("Duplicate principals must be rejected.");

	assert!(matches!(err, StoreError::DuplicatePrincipal { ref id } if id == ADMIN));
}

#[tokio::test]
async fn file_store_loads_records_once() {
	let path = scratch_file("load");
	let records = vec![
		PrincipalRecord::new(principal_id(ADMIN), hash(ADMIN_PASSWORD), Role::Admin),
		PrincipalRecord::new(principal_id("scheduler"), hash("cron-pass"), Role::Operator),
	];

	fs::write(&path, serde_json::to_vec(&records).expect("Records should serialize."))
		.expect("Principal file should be writable.");

	let store = FileIdentityStore::open(&path).expect("Principal file should load.");

	assert_eq!(store.len(), 2);
	assert_eq!(store.path(), path.as_path());

	// Later edits are not observed; the file is only read at startup.
	fs::write(&path, "[]").expect("Principal file should be writable.");

	let scheduler = store
		.lookup(&principal_id("scheduler"))
		.await
		.expect("Lookup should succeed.")
		.expect("Loaded principal should be present.");

	assert_eq!(scheduler.role, Role::Operator);
	assert!(scheduler.credential_hash.verify(&Password::new("cron-pass")));
}

#[test]
fn file_store_tolerates_missing_and_blank_files() {
	let path = scratch_file("blank");

	let _ = fs::remove_file(&path);

	assert!(FileIdentityStore::open(&path).expect("Missing file should load empty.").is_empty());

	fs::write(&path, "  \n").expect("Principal file should be writable.");

	assert!(FileIdentityStore::open(&path).expect("Blank file should load empty.").is_empty());
}

#[test]
fn file_store_reports_the_broken_field() {
	let path = scratch_file("broken");

	fs::write(&path, r#"[{"id":"admin","credential_hash":"plain-text"}]"#)
		.expect("Principal file should be writable.");

	let err = FileIdentityStore::open(&path).expect_err("Non-PHC hashes must be rejected.");
	let StoreError::Serialization { message } = err else {
		panic!("Parse failures should be reported as serialization errors.");
	};

	assert!(message.contains("[0].credential_hash"));
}
