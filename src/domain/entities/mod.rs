pub mod field;
pub mod filter;
pub mod order;
pub mod pagination;
pub mod projection;
pub mod table_view;
