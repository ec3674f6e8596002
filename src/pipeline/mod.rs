//! Pipeline stages
//!
//! One module per CLI stage, in running order: bootstrap TextGrids,
//! token extraction, selection, profiling, subsetting. `layout` holds the
//! shared directory conventions.

pub mod extract;
pub mod layout;
pub mod profile;
pub mod select;
pub mod subset;
pub mod textgrids;
