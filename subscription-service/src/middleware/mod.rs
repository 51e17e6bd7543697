//! Request extractors for subscription-service.

pub mod user_context;

pub use user_context::{UserContext, USER_ID_HEADER};
