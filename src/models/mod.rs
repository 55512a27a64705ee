//! Domain models
//!
//! Plain entity structs persisted by the repositories, their status enums,
//! and the input/pagination types shared by list queries.

pub mod book;
pub mod chapter;
pub mod class;
pub mod course;
pub mod lesson;
pub mod paging;
pub mod quiz;
pub mod student;
pub mod user;

pub use book::Book;
pub use chapter::Chapter;
pub use class::{Class, ClassStatus, CreateClassInput, UpdateClassInput};
pub use course::{Course, CourseFilter, CourseStatus, CreateCourseInput, UpdateCourseInput};
pub use lesson::{CreateLessonInput, Lesson, LessonPage, SchedulingStatus, UpdateLessonInput};
pub use paging::{LessonCursor, ListParams, PagedResult};
pub use quiz::{Quiz, QuizKind};
pub use student::{CreateStudentInput, Student};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole, UserStatus};
