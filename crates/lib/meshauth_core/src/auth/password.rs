//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor for production wiring (~250ms per hash).
pub const BCRYPT_COST: u32 = 12;

/// Plaintext used to build the dummy digest burned on absent users and
/// malformed stored hashes.
const DUMMY_PASSWORD: &str = "meshauth-timing-equalizer";

/// Salted, cost-parameterized password hasher.
///
/// Holds a dummy digest at the same cost so that every verification path
/// performs exactly one bcrypt comparison.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Hasher at the production cost.
    pub fn new() -> Result<Self, AuthError> {
        Self::with_cost(BCRYPT_COST)
    }

    /// Hasher at an explicit cost (tests use bcrypt's minimum).
    pub fn with_cost(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, cost)
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a stored digest.
    ///
    /// A malformed digest yields `false` after a dummy comparison.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matched) => matched,
            Err(_) => {
                self.verify_absent(password);
                false
            }
        }
    }

    /// Burn one comparison for a user that does not exist.
    pub fn verify_absent(&self, password: &str) {
        let _ = bcrypt::verify(password, &self.dummy_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4).unwrap()
    }

    #[test]
    fn verify_accepts_matching_password() {
        let h = hasher();
        let digest = h.hash("secret1").unwrap();
        assert!(h.verify("secret1", &digest));
    }

    #[test]
    fn verify_rejects_other_password() {
        let h = hasher();
        let digest = h.hash("secret1").unwrap();
        assert!(!h.verify("secret2", &digest));
    }

    #[test]
    fn same_plaintext_hashes_differ() {
        let h = hasher();
        assert_ne!(h.hash("secret1").unwrap(), h.hash("secret1").unwrap());
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        let h = hasher();
        assert!(!h.verify("secret1", "not-a-bcrypt-hash"));
        assert!(!h.verify("secret1", ""));
    }

    #[test]
    fn production_cost_is_fixed() {
        assert_eq!(BCRYPT_COST, 12);
        assert_eq!(hasher().cost(), 4);
    }
}
