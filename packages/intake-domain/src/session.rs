use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
	Started,
	Importing,
	Processing,
	Completed,
	Failed,
}
impl SessionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Started => "started",
			Self::Importing => "importing",
			Self::Processing => "processing",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"started" => Some(Self::Started),
			"importing" => Some(Self::Importing),
			"processing" => Some(Self::Processing),
			"completed" => Some(Self::Completed),
			"failed" => Some(Self::Failed),
			_ => None,
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Failed)
	}

	/// Forward-only transitions. `Failed` is reachable from any non-terminal
	/// state; nothing leaves a terminal state.
	pub fn can_transition(self, next: Self) -> bool {
		if self.is_terminal() {
			return false;
		}
		if next == Self::Failed {
			return true;
		}

		next.phase_rank() > self.phase_rank()
	}

	fn phase_rank(&self) -> u8 {
		match self {
			Self::Started => 0,
			Self::Importing => 1,
			Self::Processing => 2,
			Self::Completed => 3,
			Self::Failed => 4,
		}
	}
}
