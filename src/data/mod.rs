//! Catalog data: space objects, element sets and lookup

mod catalog;
mod loader;
mod space_object;

pub use catalog::*;
pub use loader::*;
pub use space_object::*;
