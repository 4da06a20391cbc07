//! File listing, locator and ordering types.

use serde::{Deserialize, Serialize};

/// Owner reference as serialized by the backend.
///
/// The file serializer emits the owner's primary key; some deployments
/// emit the username instead. Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Owner {
	Id(u64),
	Name(String),
}

impl std::fmt::Display for Owner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Owner::Id(id) => write!(f, "#{id}"),
			Owner::Name(name) => write!(f, "{name}"),
		}
	}
}

/// A stored file as listed by the backend.
///
/// The backend owns the lifecycle; clients only list, open and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
	pub id: u64,
	pub original_filename: String,
	/// Size in bytes.
	pub file_size: u64,
	pub owner: Owner,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uploaded_at: Option<String>,
	#[serde(default)]
	pub is_zip: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub file_url: Option<String>,
}

impl FileRecord {
	/// Human-facing owner label, preferring the username when present.
	pub fn owner_label(&self) -> String {
		match &self.owner_username {
			Some(name) => name.clone(),
			None => self.owner.to_string(),
		}
	}

	/// Size in KiB with two decimals, as shown in listings.
	pub fn size_kib(&self) -> String {
		format!("{:.2}", self.file_size as f64 / 1024.0)
	}
}

/// Time-limited URL returned by the view and download endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocator {
	#[serde(default)]
	pub url: Option<String>,
}

/// Sort order accepted by the `ordering` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileOrdering {
	#[default]
	#[serde(rename = "-uploaded_at")]
	NewestFirst,
	#[serde(rename = "uploaded_at")]
	OldestFirst,
	#[serde(rename = "original_filename")]
	NameAsc,
	#[serde(rename = "-original_filename")]
	NameDesc,
	#[serde(rename = "file_size")]
	SizeAsc,
	#[serde(rename = "-file_size")]
	SizeDesc,
}

impl FileOrdering {
	pub const ALL: [FileOrdering; 6] = [
		FileOrdering::NewestFirst,
		FileOrdering::OldestFirst,
		FileOrdering::NameAsc,
		FileOrdering::NameDesc,
		FileOrdering::SizeAsc,
		FileOrdering::SizeDesc,
	];

	/// Value sent in the `ordering` query parameter.
	pub fn as_query_value(self) -> &'static str {
		match self {
			FileOrdering::NewestFirst => "-uploaded_at",
			FileOrdering::OldestFirst => "uploaded_at",
			FileOrdering::NameAsc => "original_filename",
			FileOrdering::NameDesc => "-original_filename",
			FileOrdering::SizeAsc => "file_size",
			FileOrdering::SizeDesc => "-file_size",
		}
	}
}

impl std::fmt::Display for FileOrdering {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_query_value())
	}
}

impl std::str::FromStr for FileOrdering {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FileOrdering::ALL
			.into_iter()
			.find(|o| o.as_query_value() == s)
			.ok_or_else(|| format!("unknown ordering: {s}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn owner_accepts_id_or_name() {
		let by_id: Owner = serde_json::from_str("3").unwrap();
		assert_eq!(by_id, Owner::Id(3));
		let by_name: Owner = serde_json::from_str("\"alice\"").unwrap();
		assert_eq!(by_name, Owner::Name("alice".into()));
	}

	#[test]
	fn file_record_from_backend_json() {
		let json = r#"{
			"id": 5,
			"file": "user_uploads/1/report.pdf",
			"file_url": null,
			"original_filename": "report.pdf",
			"file_size": 2048,
			"uploaded_at": "2024-05-01T10:00:00Z",
			"is_zip": false,
			"owner": 1,
			"owner_username": "alice"
		}"#;
		let record: FileRecord = serde_json::from_str(json).unwrap();
		assert_eq!(record.id, 5);
		assert_eq!(record.owner_label(), "alice");
		assert_eq!(record.size_kib(), "2.00");
		assert!(record.file_url.is_none());
	}

	#[test]
	fn ordering_parses_query_values() {
		for ordering in FileOrdering::ALL {
			let parsed: FileOrdering = ordering.as_query_value().parse().unwrap();
			assert_eq!(parsed, ordering);
		}
		assert!("size".parse::<FileOrdering>().is_err());
		assert_eq!(FileOrdering::default().to_string(), "-uploaded_at");
	}
}
