pub mod color_queries;
pub mod products_queries;
