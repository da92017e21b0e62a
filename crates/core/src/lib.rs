#![forbid(unsafe_code)]

//! Store-independent domain types for the revisioned node tree.

pub mod ids;
pub mod kinds;
pub mod names;
pub mod tree;

pub use ids::*;
pub use kinds::*;
pub use names::{NameError, validate_name};
pub use tree::{Item, ItemAttributes, Tree, TreeError};
