use sha2::{Digest, Sha256};

/// Hex characters kept from the digest. Collisions past this prefix are not detected.
pub const DIGEST_PREFIX_LEN: usize = 16;

/// Extension appended to every filename, whatever the real image type is.
pub const IMAGE_EXTENSION: &str = "png";

pub struct ContentAddresser;

impl ContentAddresser {
    pub fn digest_prefix(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        let mut hex = hex::encode(hasher.finalize());
        hex.truncate(DIGEST_PREFIX_LEN);
        hex
    }

    pub fn filename_for(payload: &str) -> String {
        format!("{}.{}", Self::digest_prefix(payload), IMAGE_EXTENSION)
    }

    pub fn destination_for(image_folder: &str, payload: &str) -> String {
        let folder = image_folder.trim_end_matches('/');
        if folder.is_empty() {
            Self::filename_for(payload)
        } else {
            format!("{}/{}", folder, Self::filename_for(payload))
        }
    }
}
