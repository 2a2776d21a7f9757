use std::fmt;

use serde::{Deserialize, Serialize};

/// One external search or retrieval system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
	/// arXiv Atom query API.
	Arxiv,
	/// FreePatentsOnline full-text search (scraped).
	FreePatentsOnline,
	/// Google Patents search (scraped).
	GooglePatents,
	/// General web search restricted to a patent domain (scraped).
	PatentWeb,
}
impl SurfaceKind {
	pub fn family(self) -> SurfaceFamily {
		match self {
			Self::Arxiv => SurfaceFamily::Academic,
			Self::FreePatentsOnline | Self::GooglePatents | Self::PatentWeb => SurfaceFamily::Patent,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Arxiv => "arxiv",
			Self::FreePatentsOnline => "fpo",
			Self::GooglePatents => "google",
			Self::PatentWeb => "web",
		}
	}

	/// Maps a configured patent surface name onto its kind.
	pub fn from_patent_surface(name: &str) -> Option<Self> {
		match name {
			"fpo" => Some(Self::FreePatentsOnline),
			"google" => Some(Self::GooglePatents),
			"web" => Some(Self::PatentWeb),
			_ => None,
		}
	}
}

impl fmt::Display for SurfaceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Surfaces that share a query dialect and a canonical identifier scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFamily {
	Academic,
	Patent,
}
impl SurfaceFamily {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Academic => "academic",
			Self::Patent => "patent",
		}
	}
}
