pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod model;

pub use identity::{AuthError, FirebaseIdentity, IdentityProvider, StaticIdentity};
pub use jwt::*;
pub use middleware::*;
pub use model::*;
