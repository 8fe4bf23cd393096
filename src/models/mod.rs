//! API record types
//!
//! Field names follow the API's camelCase JSON.

mod organization;
mod space;
mod user;

pub use organization::Organization;
pub use space::{Space, SpaceUrls, Visibility};
pub use user::User;
