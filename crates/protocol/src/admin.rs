//! Administrator-only resources: user directory and activity log.

use serde::{Deserialize, Serialize};

/// Entry of the user directory (`GET users/list/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
	pub id: u64,
	pub username: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub is_staff: bool,
	#[serde(default)]
	pub is_superuser: bool,
}

/// Audit log entry (`GET logs/`).
///
/// `username` is absent for system events whose user was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
	pub id: u64,
	#[serde(default)]
	pub username: Option<String>,
	pub timestamp: String,
	pub action: ActivityAction,
	#[serde(default)]
	pub details: String,
}

/// Action recorded in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
	Login,
	Logout,
	Upload,
	View,
	Download,
	Delete,
	StatusChange,
	#[serde(other)]
	Other,
}
