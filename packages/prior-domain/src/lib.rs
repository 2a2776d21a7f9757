//! Data model shared by every stage of the prior-art pipeline.
//!
//! Nothing in this crate performs I/O. Stages own the entity they produce:
//! search adapters create [`CandidateRef`]s, resolvers create [`ResolvedDocument`]s, and the
//! scorer creates [`ScoredResult`]s.

pub mod canonical;
pub mod document;
pub mod score;
pub mod surface;

pub use canonical::{canonical_arxiv_id, canonical_patent_id};
pub use document::{CandidateRef, ResolvedDocument, ScoredResult};
pub use score::{ScoreParseError, ScoreVerdict, clamp_score, parse_score};
pub use surface::{SurfaceFamily, SurfaceKind};
