//! Field extraction: declarative selector schema and fallback queries

pub mod fields;
pub mod schema;

pub use fields::{ExtractedFields, FieldExtractor};
pub use schema::{ExtractionSchema, HiringTeamSelectors};
