//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the persistence operations for a specific entity.

pub mod book;
pub mod chapter;
pub mod class;
pub mod course;
pub mod lesson;
pub mod quiz;
pub mod student;
pub mod user;

pub use book::{BookRepository, SqlxBookRepository};
pub use chapter::{ChapterRepository, SqlxChapterRepository};
pub use class::{ClassRepository, SqlxClassRepository};
pub use course::{CourseRepository, SqlxCourseRepository};
pub use lesson::{LessonRepository, SqlxLessonRepository};
pub use quiz::{QuizRepository, SqlxQuizRepository};
pub use student::{SqlxStudentRepository, StudentRepository};
pub use user::{SqlxUserRepository, UserRepository};
