pub mod course;

pub use course::{CourseEntry, UNSPECIFIED, Weekday};
