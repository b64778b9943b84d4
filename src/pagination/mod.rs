pub(crate) mod pagination_errors;
pub(crate) mod pagination_model;
pub(crate) mod pagination_service;

pub use pagination_errors::PaginationError;
pub use pagination_model::{PageCursor, TransactionPage};
pub use pagination_service::PaginationService;
