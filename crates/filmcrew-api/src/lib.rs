pub mod auth;
pub mod avatars;
pub mod companies;
pub mod connections;
pub mod conversations;
mod convert;
pub mod error;
pub mod invitations;
pub mod jobs;
pub mod middleware;
pub mod oauth;
pub mod productions;
pub mod profiles;
pub mod slug;
pub mod storage;
