//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// self
use datasync_gateway::{
	auth::{
		CredentialHash, HashCost, Password, Principal, PrincipalId, Role, SigningSecret,
		TokenService,
	},
	dispatch::{DispatchOptions, Dispatcher},
	engine::SyncEngine,
	gateway::Gateway,
	store::{MemoryIdentityStore, PrincipalRecord},
	whitelist::Whitelist,
};

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adminadmin";
pub const CLIENT: &str = "203.0.113.7";
pub const SECRET: &str = "test_secret_for_ci";

pub fn principal_id(value: &str) -> PrincipalId {
	PrincipalId::new(value).expect("Principal fixture should be valid.")
}

pub fn admin() -> Principal {
	Principal::new(principal_id(ADMIN), Role::Admin)
}

pub fn hash(password: &str) -> CredentialHash {
	CredentialHash::derive_with(&Password::new(password), HashCost::MINIMAL)
		.expect("Credential hash fixture should derive.")
}

pub fn admin_store() -> MemoryIdentityStore {
	MemoryIdentityStore::from_records([PrincipalRecord::new(
		principal_id(ADMIN),
		hash(ADMIN_PASSWORD),
		Role::Admin,
	)])
	.expect("Identity store fixture should build.")
}

pub fn token_service() -> TokenService {
	TokenService::new(&SigningSecret::new(SECRET), Arc::new(admin_store()))
		.expect("Token service fixture should build.")
}

pub fn whitelist(names: &[&str]) -> Arc<Whitelist> {
	Arc::new(Whitelist::parse(names).expect("Whitelist fixture should be valid."))
}

pub fn dispatcher(names: &[&str], engine: Arc<dyn SyncEngine>) -> Dispatcher {
	Dispatcher::new(whitelist(names), engine)
}

pub fn dispatcher_with(
	names: &[&str],
	engine: Arc<dyn SyncEngine>,
	options: DispatchOptions,
) -> Dispatcher {
	dispatcher(names, engine).with_options(options)
}

pub fn gateway(names: &[&str], engine: Arc<dyn SyncEngine>) -> Gateway {
	Gateway::new(token_service(), dispatcher(names, engine))
}
