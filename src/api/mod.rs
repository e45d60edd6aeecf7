pub mod pagination;
pub mod response;

pub use pagination::{Paginated, PaginationParams};
pub use response::{DataResponse, MessageResponse};
