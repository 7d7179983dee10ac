use thiserror::Error;

/// Errors raised while handling secret material.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_random_source() {
        let err = CryptoError::RandomSource("getrandom failed".into());
        assert_eq!(err.to_string(), "random source unavailable: getrandom failed");
    }

    #[test]
    fn display_invalid_key_length() {
        let err = CryptoError::InvalidKeyLength {
            expected: 64,
            actual: 31,
        };
        assert_eq!(
            err.to_string(),
            "invalid key length: expected 64 bytes, got 31"
        );
    }

    #[test]
    fn display_invalid_input() {
        let err = CryptoError::InvalidInput("not a keyfile".into());
        assert_eq!(err.to_string(), "invalid input: not a keyfile");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(CryptoError::RandomSource("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
