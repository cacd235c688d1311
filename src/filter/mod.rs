pub mod error;
pub mod filter_order;
pub mod page;

pub use error::FilterError;
pub use filter_order::{FilterOrder, SortDirection, SortSpec};
pub use page::{Page, PageParams, Pagination, TrashFilter};
