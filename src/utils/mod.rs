pub mod duration;
pub mod errors;
pub mod image;
pub mod jwt;
pub mod pagination;
pub mod password;
