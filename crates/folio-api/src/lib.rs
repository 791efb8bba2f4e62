pub mod comments;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod likes;
pub mod middleware;
pub mod projects;
pub mod router;
pub mod state;
pub mod token;
pub mod users;
