//! Per-profile transcoding.

use metrics::counter;
use tracing::{debug, info};

use rbox_models::{EncodedAsset, Region, TranscodeProfile};

use crate::command::EngineCommand;
use crate::decode::SourceAudio;
use crate::engine::acquire;
use crate::error::{EngineError, EngineResult};
use crate::filter::build_fade_filter;

/// Transcode the region of a source into one profile's output.
///
/// The output scratch entry is released on every exit path; the staged
/// input belongs to the [`SourceAudio`] and lives until the editing session
/// ends. The coordinator issues one call per profile for a submission.
pub async fn transcode(
    source: &SourceAudio,
    region: &Region,
    profile: &'static TranscodeProfile,
) -> EngineResult<EncodedAsset> {
    let engine = acquire().await?;
    counter!("rbox_engine_transcodes_total", "profile" => profile.kind.as_str()).increment(1);

    let output = engine.scratch().claim(&format!("out.{}", profile.extension));

    let mut cmd = EngineCommand::new(source.path(), output.path())
        .seek(region.start)
        .duration(region.window_secs())
        .audio_codec(profile.codec)
        .audio_bitrate(profile.bitrate)
        .format(profile.container);
    if profile.strip_video {
        cmd = cmd.strip_video();
    }
    if let Some(filter) = build_fade_filter(region) {
        debug!(profile = %profile.kind, filter = %filter, "Applying fade filter");
        cmd = cmd.audio_filter(filter);
    }

    let result = match engine.run_encode(&cmd, profile.kind).await {
        Ok(()) => read_asset(&output, profile).await,
        Err(e) => {
            counter!("rbox_engine_transcode_failures_total", "profile" => profile.kind.as_str())
                .increment(1);
            Err(e)
        }
    };

    output.release().await;

    if let Ok(asset) = &result {
        info!(
            profile = %profile.kind,
            size_bytes = asset.size_bytes,
            window_secs = region.window_secs(),
            "Transcode complete"
        );
    }
    result
}

async fn read_asset(
    output: &crate::scratch::ScratchEntry,
    profile: &TranscodeProfile,
) -> EngineResult<EncodedAsset> {
    let bytes = tokio::fs::read(output.path()).await.map_err(|e| {
        EngineError::encode_failed(
            profile.kind,
            format!("engine produced no readable output: {}", e),
            None,
            None,
        )
    })?;
    Ok(EncodedAsset::new(profile.kind, bytes))
}
