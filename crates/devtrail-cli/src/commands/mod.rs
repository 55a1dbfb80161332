//! CLI command implementations for devtrail.

pub mod check;
pub mod list;
pub mod record;
