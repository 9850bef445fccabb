pub mod auth;
pub mod error;
pub mod middleware;
pub mod predictions;
pub mod reports;
pub mod votes;
