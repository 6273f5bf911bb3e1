//! Query modules, one per table.

pub mod albums;
pub mod media_items;
