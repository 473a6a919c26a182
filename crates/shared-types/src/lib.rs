pub mod error;

// Account / auth types
pub mod models;
pub mod requests;

// Scholaris domain modules (canonical locations for all school domain types)
pub mod class;
pub mod grade;
pub mod grading;
pub mod student;
pub mod teacher;

pub use error::*;
pub use models::*;
pub use requests::*;

// Re-export all domain types
pub use class::*;
pub use grade::*;
pub use grading::*;
pub use student::*;
pub use teacher::*;
