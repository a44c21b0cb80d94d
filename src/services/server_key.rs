use base64::{Engine as _, engine::general_purpose};

use crate::error::KeyError;

/// Decodes a VAPID public key published in URL-safe base64 without padding.
pub fn decode_server_key(key: &str) -> Result<Vec<u8>, KeyError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KeyError::Empty);
    }

    let padding = (4 - key.len() % 4) % 4;
    let standard: String = key
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .chain(std::iter::repeat('=').take(padding))
        .collect();

    general_purpose::STANDARD
        .decode(standard)
        .map_err(|e| KeyError::Malformed(e.to_string()))
}
