use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
	Normalize,
	Embed,
	Sync,
}
impl JobKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Normalize => "normalize",
			Self::Embed => "embed",
			Self::Sync => "sync",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"normalize" => Some(Self::Normalize),
			"embed" => Some(Self::Embed),
			"sync" => Some(Self::Sync),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
	Queued,
	Running,
	Done,
	Error,
}
impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Queued => "queued",
			Self::Running => "running",
			Self::Done => "done",
			Self::Error => "error",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"queued" => Some(Self::Queued),
			"running" => Some(Self::Running),
			"done" => Some(Self::Done),
			"error" => Some(Self::Error),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	High,
	#[default]
	Medium,
	Low,
}
impl Priority {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::High => "high",
			Self::Medium => "medium",
			Self::Low => "low",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"high" => Some(Self::High),
			"medium" => Some(Self::Medium),
			"low" => Some(Self::Low),
			_ => None,
		}
	}

	/// Secondary sort key for claim ordering. Lower ranks claim first among
	/// jobs enqueued at the same instant.
	pub fn rank(&self) -> i16 {
		match self {
			Self::High => 0,
			Self::Medium => 1,
			Self::Low => 2,
		}
	}
}
