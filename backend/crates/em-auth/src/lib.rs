pub mod claims;
pub mod error;
pub mod identity;
pub mod jwt_validator;
pub mod token_verifier;

pub use claims::Claims;
pub use error::{AuthError, Result};
pub use identity::Identity;
pub use jwt_validator::JwtValidator;
pub use token_verifier::TokenVerifier;
