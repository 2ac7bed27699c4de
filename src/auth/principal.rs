//! Authenticated principals and their roles.

// self
use crate::{_prelude::*, auth::PrincipalId};

/// Role granted to a principal at bootstrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full access to every gateway operation.
	#[default]
	Admin,
	/// Service account driving scheduled synchronizations.
	Operator,
}
impl Role {
	/// Returns a stable label suitable for claims and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::Operator => "operator",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Identity established by a verified token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
	/// Unique principal identifier.
	pub id: PrincipalId,
	/// Role recorded when the token was issued.
	pub role: Role,
}
impl Principal {
	/// Creates a principal with the provided role.
	pub fn new(id: PrincipalId, role: Role) -> Self {
		Self { id, role }
	}
}
