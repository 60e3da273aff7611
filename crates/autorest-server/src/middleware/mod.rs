pub mod auth;

pub use auth::{Authenticator, Identity, StaticTokenAuthenticator, require_bearer};
