mod cart;
mod catalog;
mod color;
mod product;

pub use cart::*;
pub use catalog::*;
pub use color::*;
pub use product::*;
