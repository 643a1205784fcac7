pub mod admin;
pub mod students;
