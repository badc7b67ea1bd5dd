use crate::resource::{Resource, WriteAccess};
use crate::validation::{field, FieldRule};

pub struct Course;

impl Resource for Course {
    const NAME: &'static str = "course";
    const LABEL: &'static str = "Course";
    const COLLECTION: &'static str = "courses";
    const FIELDS: &'static [&'static str] = &["courseCode", "courseName", "instructor", "semester"];
    const WRITE_ACCESS: WriteAccess = WriteAccess::Session;

    fn rules() -> Vec<FieldRule> {
        vec![
            field("courseCode")
                .truthy("Course code is required")
                .is_string("Course code must be a string"),
            field("courseName")
                .truthy("Course name is required")
                .is_string("Course name must be a string"),
            field("instructor")
                .truthy("Instructor is required")
                .is_string("Instructor must be a string"),
            field("semester")
                .truthy("Semester is required")
                .is_string("Semester must be a string"),
        ]
    }
}
