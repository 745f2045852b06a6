//! Page schemas: typed columns and their validation.

mod column;
mod page;
pub(crate) mod validation;

pub use column::{move_column, remove_column, Column, ColumnType, Direction};
pub use page::Page;
pub use validation::{validate_columns, validate_pages, RESERVED_KEY};
