//! Picking the right repo digest for an image

use tracing::debug;

use super::reference::{is_image_id, ImageReference};
use crate::digest::Fingerprint;
use crate::error::{FingerprintError, Result};

/// Separator between the name and the digest in a repo digest entry
const DIGEST_SEPARATOR: &str = "@sha256:";

/// Select the registry digest belonging to `image_id` from the image's repo
/// digests (`name@sha256:<hex>` entries).
///
/// An image pulled under several names carries one entry per repository, so
/// the entry is chosen by repository name. When nothing matches, the
/// result is an error rather than a guess.
pub fn resolve_repo_digest<S: AsRef<str>>(image_id: &str, repo_digests: &[S]) -> Result<Fingerprint> {
    if image_id.trim().is_empty() || repo_digests.is_empty() {
        return Err(FingerprintError::DigestUnavailable {
            image: image_id.to_string(),
        });
    }

    if let [only] = repo_digests {
        return digest_of(image_id, only.as_ref());
    }

    if is_image_id(image_id) {
        // An opaque ID carries no name to match against
        debug!("{} is an image ID, using the first repo digest", image_id);
        return digest_of(image_id, repo_digests[0].as_ref());
    }

    let wanted = ImageReference::parse(image_id).ok_or_else(|| FingerprintError::ImageNotFound {
        image: image_id.to_string(),
    })?;

    for entry in repo_digests {
        let entry = entry.as_ref();
        let Some((name, _)) = entry.split_once('@') else {
            continue;
        };
        let Some(candidate) = ImageReference::parse(name) else {
            continue;
        };
        if wanted.same_repository(&candidate) {
            debug!("repo digest {} matches image {}", entry, image_id);
            return digest_of(image_id, entry);
        }
    }

    Err(FingerprintError::AmbiguousImage {
        image: image_id.to_string(),
    })
}

fn digest_of(image_id: &str, entry: &str) -> Result<Fingerprint> {
    match entry.split_once(DIGEST_SEPARATOR) {
        Some((_, digest)) => Fingerprint::parse(digest),
        None => Err(FingerprintError::DigestUnavailable {
            image: image_id.to_string(),
        }),
    }
}
