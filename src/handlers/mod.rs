// handlers/mod.rs - HTTP handlers
//
// crud       generic list/get/create/replace/patch/delete for every resource
// ownership  owner check for reviews and watchlists
// watchlist  single-movie add/remove on a watchlist
// service    root and health endpoints
pub mod crud;
pub mod extract;
pub mod ownership;
pub mod service;
pub mod watchlist;

pub use extract::JsonBody;
