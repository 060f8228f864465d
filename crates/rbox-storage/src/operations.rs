//! Ring-specific storage operations.

use rbox_models::{EncodedAsset, ProfileKind};

use crate::client::StorageClient;
use crate::error::StorageResult;

/// Object key for a ring asset.
///
/// Keys embed the submission id, so a retried submission writes fresh
/// objects instead of overwriting; orphans from aborted submissions are
/// accepted.
pub fn ring_asset_key(slug: &str, submission_id: &str, profile: ProfileKind) -> String {
    let extension = profile.profile().extension;
    format!("rings/{}/{}.{}", slug, submission_id, extension)
}

/// Content type for a profile's output.
pub fn content_type_for(profile: ProfileKind) -> &'static str {
    match profile {
        ProfileKind::Universal => "audio/mpeg",
        ProfileKind::Device => "audio/mp4",
    }
}

impl StorageClient {
    /// Upload one encoded ring asset and return its public URL.
    pub async fn upload_ring_asset(
        &self,
        slug: &str,
        submission_id: &str,
        asset: &EncodedAsset,
    ) -> StorageResult<String> {
        let key = ring_asset_key(slug, submission_id, asset.profile);
        let content_type = content_type_for(asset.profile);
        self.upload_bytes(asset.bytes.clone(), &key, content_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_asset_key() {
        assert_eq!(
            ring_asset_key("vaaranam-aayiram-ninaikatha-bgm", "sub-1", ProfileKind::Universal),
            "rings/vaaranam-aayiram-ninaikatha-bgm/sub-1.mp3"
        );
        assert_eq!(
            ring_asset_key("vaaranam-aayiram-ninaikatha-bgm", "sub-1", ProfileKind::Device),
            "rings/vaaranam-aayiram-ninaikatha-bgm/sub-1.m4r"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(ProfileKind::Universal), "audio/mpeg");
        assert_eq!(content_type_for(ProfileKind::Device), "audio/mp4");
    }
}
