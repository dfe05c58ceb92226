pub mod ingredient;
pub mod pagination;
pub mod recipe;
pub mod user;

pub use ingredient::*;
pub use pagination::*;
pub use recipe::*;
pub use user::*;
