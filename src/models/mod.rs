pub mod course;
pub mod movie;
pub mod review;
pub mod student;
pub mod user;
pub mod watchlist;

pub use course::Course;
pub use movie::Movie;
pub use review::Review;
pub use student::Student;
pub use user::User;
pub use watchlist::{WatchStatus, Watchlist, WatchlistEntry};

/// Every collection the API serves.
pub const COLLECTIONS: &[&str] = &[
    <Movie as crate::resource::Resource>::COLLECTION,
    <User as crate::resource::Resource>::COLLECTION,
    <Review as crate::resource::Resource>::COLLECTION,
    <Watchlist as crate::resource::Resource>::COLLECTION,
    <Course as crate::resource::Resource>::COLLECTION,
    <Student as crate::resource::Resource>::COLLECTION,
];
