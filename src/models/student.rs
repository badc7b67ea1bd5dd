use crate::resource::{Resource, WriteAccess};
use crate::validation::{field, FieldRule};

pub struct Student;

impl Resource for Student {
    const NAME: &'static str = "student";
    const LABEL: &'static str = "Student";
    const COLLECTION: &'static str = "students";
    // `courses` is stored as given.
    const FIELDS: &'static [&'static str] = &[
        "name",
        "email",
        "age",
        "major",
        "graduationYear",
        "GPA",
        "attendanceMode",
        "courses",
    ];
    const WRITE_ACCESS: WriteAccess = WriteAccess::Session;

    fn rules() -> Vec<FieldRule> {
        vec![
            field("name")
                .truthy("Name is required")
                .is_string("Name must be a string"),
            field("email")
                .truthy("Email is required")
                .is_email("Invalid email format"),
            field("age").is_int(Some(0), Some(150), "Age must be a whole number between 0 and 150"),
            field("major").is_string("Major must be a string"),
            field("graduationYear").is_int(Some(1900), None, "Graduation year must be a valid year"),
            field("GPA").is_float(0.0, 4.0, "GPA must be a number between 0 and 4"),
            field("attendanceMode").is_string("Attendance mode must be a string"),
        ]
    }
}
