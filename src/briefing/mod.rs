//! Daily briefing export
//!
//! Turns a day's entries into a `BriefingDocument`: grouped, headed and
//! laid out, with entry bodies run through the content converter.

pub mod assemble;
pub mod dates;
pub mod grouping;
pub mod images;
pub mod models;

pub use assemble::BriefingAssembler;
pub use dates::{export_filename, format_date_long, format_exported_at, format_source_date};
pub use grouping::{CountryGroup, RegionGroup, group_entries};
pub use images::{resolve_entry_images, resolve_image_references, strip_images};
pub use models::*;
