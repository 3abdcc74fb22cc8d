pub mod login;
pub mod provider;
pub mod rest;

pub use login::{LoginFlow, LoginState};
pub use provider::{AuthError, IdentityProvider, Session, SessionRegistry};
pub use rest::RestIdentityProvider;
