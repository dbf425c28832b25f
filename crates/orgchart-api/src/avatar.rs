//! Gravatar URLs for employee records.

use sha2::{Digest, Sha256};

/// Gravatar image URL for `email`, falling back to the "mystery person"
/// silhouette. The address is trimmed and lower-cased before hashing.
pub fn gravatar_url(email: &str) -> String {
  let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
  format!("https://www.gravatar.com/avatar/{}?d=mp", hex::encode(digest))
}
