pub mod token;
pub mod user;

pub use token::{TokenRecord, TokenType};
pub use user::{Role, User};
