//! Key Derivation Module
//!
//! Turns a request fingerprint (prompt text plus generation parameters)
//! into a stable cache key: a SHA-256 digest over the length-prefixed
//! prompt and a canonical JSON serialization of the parameters.
//! Length-prefixing prevents separator collisions between prompt and
//! parameter bytes.

use serde::Serialize;
use sha2::{Digest, Sha256};

// == Generation Parameters ==
/// Parameters that distinguish two otherwise identical prompts.
///
/// Field order is fixed, so `serde_json` produces a canonical byte
/// sequence for hashing. Temperature is kept in hundredths (0..=200
/// maps to 0.0..=2.0) so the key never depends on float formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationParams {
    /// Model identifier sent upstream
    pub model: String,
    /// Sampling temperature in hundredths (70 = 0.7)
    pub temperature_pct: u32,
    /// Maximum completion length in tokens
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Sampling temperature as the float the upstream API expects.
    pub fn temperature(&self) -> f32 {
        self.temperature_pct as f32 / 100.0
    }
}

// == Derive ==
/// Derives a deterministic, collision-resistant cache key.
///
/// Two textually identical prompts with identical parameters always
/// produce the same key; any difference in either produces a different
/// key. Infallible and side-effect free.
pub fn derive_key(prompt: &str, params: &GenerationParams) -> String {
    // Canonical parameter bytes: struct fields serialize in declaration order.
    let param_bytes =
        serde_json::to_vec(params).expect("GenerationParams serialization cannot fail");

    let mut hasher = Sha256::new();
    hasher.update((prompt.len() as u64).to_le_bytes());
    hasher.update(prompt.as_bytes());
    hasher.update((param_bytes.len() as u64).to_le_bytes());
    hasher.update(&param_bytes);
    format!("{:x}", hasher.finalize())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            model: "gpt-4o-mini".to_string(),
            temperature_pct: 70,
            max_tokens: 512,
        }
    }

    #[test]
    fn test_derive_deterministic() {
        let k1 = derive_key("what is a monad?", &params());
        let k2 = derive_key("what is a monad?", &params());
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_derive_prompt_aware() {
        let k1 = derive_key("what is a monad?", &params());
        let k2 = derive_key("what is a functor?", &params());
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_derive_params_aware() {
        let mut other = params();
        other.temperature_pct = 0;
        let k1 = derive_key("what is a monad?", &params());
        let k2 = derive_key("what is a monad?", &other);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_derive_model_aware() {
        let mut other = params();
        other.model = "gpt-4o".to_string();
        assert_ne!(
            derive_key("hello", &params()),
            derive_key("hello", &other)
        );
    }

    #[test]
    fn test_derive_no_boundary_collision() {
        // Prompt bytes must not bleed into parameter bytes.
        let mut other = params();
        other.model = format!("x{}", other.model);
        let k1 = derive_key("promptx", &params());
        let k2 = derive_key("prompt", &other);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_derive_is_hex_sha256() {
        let key = derive_key("hello", &params());
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(params().temperature(), 0.7);
    }
}
