use sha2::{Digest, Sha256};

/// Salted SHA-256 digest of a password.
pub struct PasswordDigest {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl PasswordDigest {
    pub fn new(password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        Self {
            salt,
            digest: hash(&salt, password),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = hash(&self.salt, password);
        // Compare every byte regardless of where the first mismatch is.
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn hash(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let digest = PasswordDigest::new("hunter22");
        assert!(digest.verify("hunter22"));
        assert!(!digest.verify("hunter23"));
        assert!(!digest.verify(""));
    }

    #[test]
    fn test_same_password_gets_different_salt() {
        let a = PasswordDigest::new("secret1");
        let b = PasswordDigest::new("secret1");
        assert_ne!(a.digest, b.digest);
    }
}
