//! Domain types and models

pub mod facility;
pub mod matching;
pub mod reference;
pub mod row;
pub mod upload;

pub use facility::{FacilityRecord, Sector};
pub use matching::{FacilityMatchRecord, MatchRef, MatchState};
pub use reference::{ClosureState, WorkersRange};
pub use row::Row;
pub use upload::{MatchCandidate, Submission, SubmissionMetadata, UploadResult, UploadStatus};
