//! Facility matching: upload interpretation and the match lifecycle

pub mod engine;
pub mod interpret;

pub use engine::FacilityMatchEngine;
pub use interpret::{interpret_submission, interpret_vote, parse_candidate, parse_match_record};
