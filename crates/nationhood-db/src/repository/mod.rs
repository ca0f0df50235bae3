//! SurrealDB repository implementations.

mod nation;
mod user;

pub use nation::SurrealNationRepository;
pub use user::SurrealUserRepository;
