pub mod cart_service;
pub mod filter;
pub mod session_cart;
