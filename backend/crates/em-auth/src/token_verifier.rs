use crate::Identity;

/// Resolves a bearer token to an identity.
///
/// Never fails: a missing, malformed or expired token resolves to `None`
/// and the caller treats the session as anonymous.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Identity>;
}
