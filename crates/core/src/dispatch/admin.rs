//! Administrator calls: user directory, staff flag and activity log.

use filedash_protocol::{ActivityLogEntry, UserSummary};
use serde::Serialize;
use tracing::info;

use super::FileDispatcher;
use crate::error::DispatchError;

/// Filters for the activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogQuery {
	/// Only entries of this username.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<String>,
	/// Backend sort field, e.g. `-timestamp` (the backend default) or `username`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sort: Option<String>,
}

impl LogQuery {
	fn query_pairs(&self) -> Vec<(&'static str, &str)> {
		let mut pairs = Vec::new();
		if let Some(user) = self.user.as_deref().filter(|u| !u.is_empty()) {
			pairs.push(("user", user));
		}
		if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
			pairs.push(("sort", sort));
		}
		pairs
	}
}

impl FileDispatcher {
	/// Lists every registered user.
	pub async fn list_users(&self) -> Result<Vec<UserSummary>, DispatchError> {
		self.require_admin()?;
		let url = self.session.client().endpoint(&self.session.client().endpoints().users)?;
		let result = async {
			let response = self.send(|http| http.get(url.clone())).await?;
			Ok::<_, DispatchError>(response.json::<Vec<UserSummary>>().await?)
		}
		.await;
		self.notify(result)
	}

	/// Flips the staff flag of `username`; returns the backend's reply.
	pub async fn toggle_staff(&self, username: &str) -> Result<serde_json::Value, DispatchError> {
		self.require_admin()?;
		let url = self
			.session
			.client()
			.resource(&self.session.client().endpoints().toggle_staff, &[username])?;
		let result = async {
			let response = self.send(|http| http.post(url.clone())).await?;
			let text = response.text().await?;
			if text.trim().is_empty() {
				return Ok::<_, DispatchError>(serde_json::Value::Null);
			}
			serde_json::from_str(&text).map_err(|e| DispatchError::Decode(e.to_string()))
		}
		.await;
		let reply = self.notify(result)?;
		info!(target = "filedash", username, "toggled staff status");
		Ok(reply)
	}

	/// Reads the activity log.
	pub async fn activity_logs(&self, query: &LogQuery) -> Result<Vec<ActivityLogEntry>, DispatchError> {
		self.require_admin()?;
		let url = self.session.client().endpoint(&self.session.client().endpoints().logs)?;
		let params = query.query_pairs();
		let result = async {
			let response = self.send(|http| http.get(url.clone()).query(&params)).await?;
			Ok::<_, DispatchError>(response.json::<Vec<ActivityLogEntry>>().await?)
		}
		.await;
		self.notify(result)
	}
}
