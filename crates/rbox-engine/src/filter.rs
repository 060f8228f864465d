//! Audio fade filter construction.

use rbox_models::Region;

/// Build the fade filter chain for a region, if any fade flag is set.
///
/// Filter times are relative to the trimmed window: the seek happens before
/// the filter graph runs, so the fade-in anchors at 0 and the fade-out ends
/// at the window length.
pub fn build_fade_filter(region: &Region) -> Option<String> {
    if !region.fade_in && !region.fade_out {
        return None;
    }

    let fade = region.fade_secs();
    let mut parts = Vec::with_capacity(2);

    if region.fade_in {
        parts.push(format!("afade=t=in:st=0:d={:.3}", fade));
    }
    if region.fade_out {
        let st = region.window_secs() - fade;
        parts.push(format!("afade=t=out:st={:.3}:d={:.3}", st, fade));
    }

    Some(parts.join(","))
}
