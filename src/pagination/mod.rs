//! Generic paging, sorting, searching and filtering over one entity collection.

mod error;
mod fields;
mod memory;
mod postgres;
mod query;
mod service;

pub use error::PaginationError;
pub use fields::{FieldDef, FieldValue, Paginated};
pub use memory::MemoryRows;
pub use postgres::PgRows;
pub use query::{Page, PageRequest};
pub use service::get_rows;
