//! taskhub auth: password verification, signup, and EdDSA access
//! tokens shared by the API and the real-time channel.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginOutput, SignupInput};
pub use token::{AccessTokenClaims, ValidatedClaims};
