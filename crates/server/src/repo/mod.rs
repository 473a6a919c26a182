//! Data access layer. One module per domain entity; every function takes a
//! pool reference and returns domain types from `shared_types`.

pub mod class;
pub mod grade;
pub mod student;
pub mod teacher;
