use crate::resource::Resource;
use crate::validation::{at_most_two_decimals, field, FieldRule};

pub const MOVIE_STATUSES: &[&str] = &["completed", "upcoming", "on-hold", "cancelled"];

pub struct Movie;

impl Resource for Movie {
    const NAME: &'static str = "movie";
    const LABEL: &'static str = "Movie";
    const COLLECTION: &'static str = "movies";
    const FIELDS: &'static [&'static str] = &[
        "title",
        "genre",
        "releaseYear",
        "duration",
        "description",
        "status",
        "rating",
    ];

    fn rules() -> Vec<FieldRule> {
        vec![
            field("title")
                .truthy("Title is required")
                .is_string("Title must be a string")
                .min_length(1, "Title cannot be empty"),
            field("genre")
                .truthy("Genre is required")
                .is_string("Genre must be a string")
                .min_length(1, "Genre cannot be empty"),
            field("releaseYear")
                .required("Release year is required")
                .is_int(Some(1800), None, "Release year must be a valid year"),
            field("duration")
                .required("Duration is required")
                .is_int(Some(1), None, "Duration must be a positive number"),
            field("description").is_string("Description must be a string"),
            field("status")
                .truthy("Status is required")
                .is_in(
                    MOVIE_STATUSES,
                    "Status must be one of \"completed\", \"upcoming\", \"on-hold\", or \"cancelled\"",
                ),
            field("rating")
                .required("Rating is required")
                .is_float(1.0, 10.0, "Rating must be a number between 1 and 10")
                .custom(at_most_two_decimals, "Rating can only have up to two decimal places"),
        ]
    }
}
