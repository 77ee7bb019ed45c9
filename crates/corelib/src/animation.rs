//! Keyframed animation clips and local-space sampling.

use crate::error::{CoreError, CoreResult};
use crate::transform::Transform;
use crate::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    /// Seconds from clip start.
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Keyframes of one joint, one channel per transform component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JointTrack {
    pub translations: Vec<Keyframe<Vec3>>,
    pub rotations: Vec<Keyframe<Quat>>,
    pub scales: Vec<Keyframe<Vec3>>,
}

impl JointTrack {
    /// Track that holds `pose` for the whole clip.
    pub fn constant(pose: Transform) -> Self {
        Self {
            translations: vec![Keyframe::new(0.0, pose.translation)],
            rotations: vec![Keyframe::new(0.0, pose.rotation)],
            scales: vec![Keyframe::new(0.0, pose.scale)],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    tracks: Vec<JointTrack>,
}

impl AnimationClip {
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        tracks: Vec<JointTrack>,
    ) -> CoreResult<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(CoreError::InvalidDuration(duration));
        }
        for (track, t) in tracks.iter().enumerate() {
            validate_channel(track, "translation", &t.translations, duration)?;
            validate_channel(track, "rotation", &t.rotations, duration)?;
            validate_channel(track, "scale", &t.scales, duration)?;
        }
        Ok(Self {
            name: name.into(),
            duration,
            tracks,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clip length in seconds, always positive.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn tracks(&self) -> &[JointTrack] {
        &self.tracks
    }
}

fn validate_channel<T>(
    track: usize,
    channel: &'static str,
    keys: &[Keyframe<T>],
    duration: f32,
) -> CoreResult<()> {
    if keys.is_empty() {
        return Err(CoreError::EmptyChannel { track, channel });
    }
    let mut prev = 0.0f32;
    for (key, k) in keys.iter().enumerate() {
        // `!(a <= b)` also catches NaN.
        if !(prev <= k.time && k.time <= duration) {
            return Err(CoreError::BadKeyTime {
                track,
                channel,
                key,
                time: k.time,
            });
        }
        prev = k.time;
    }
    Ok(())
}

/// Per-track keyframe cursors reused between calls to [`sample_local`].
/// Must hold exactly one entry per animation track; resize it whenever the
/// skeleton or clip changes.
#[derive(Clone, Debug, Default)]
pub struct SamplingCache {
    // translation, rotation, scale
    cursors: Vec<[usize; 3]>,
    last_time: Option<f32>,
}

impl SamplingCache {
    pub fn new(num_tracks: usize) -> Self {
        Self {
            cursors: vec![[0; 3]; num_tracks],
            last_time: None,
        }
    }

    /// Resize and drop all cached cursors.
    pub fn resize(&mut self, num_tracks: usize) {
        self.cursors.clear();
        self.cursors.resize(num_tracks, [0; 3]);
        self.last_time = None;
    }

    pub fn invalidate(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = [0; 3]);
        self.last_time = None;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Sample every track of `clip` at `ratio` (clamped to [0,1]) into `output`.
pub fn sample_local(
    clip: &AnimationClip,
    ratio: f32,
    cache: &mut SamplingCache,
    output: &mut [Transform],
) -> CoreResult<()> {
    let tracks = clip.num_tracks();
    if cache.len() != tracks {
        return Err(CoreError::CacheSizeMismatch {
            cache: cache.len(),
            tracks,
        });
    }
    if output.len() != tracks {
        return Err(CoreError::OutputSizeMismatch {
            got: output.len(),
            expected: tracks,
        });
    }

    let time = ratio.clamp(0.0, 1.0) * clip.duration;
    if cache.last_time.is_some_and(|last| time < last) {
        // looped or scrubbed backwards
        cache.invalidate();
    }

    for ((track, cursor), out) in clip
        .tracks
        .iter()
        .zip(cache.cursors.iter_mut())
        .zip(output.iter_mut())
    {
        *out = Transform {
            translation: sample_channel(&track.translations, time, &mut cursor[0], Vec3::lerp),
            rotation: sample_channel(&track.rotations, time, &mut cursor[1], Quat::lerp),
            scale: sample_channel(&track.scales, time, &mut cursor[2], Vec3::lerp),
        };
    }
    cache.last_time = Some(time);
    Ok(())
}

fn sample_channel<T: Copy>(
    keys: &[Keyframe<T>],
    time: f32,
    cursor: &mut usize,
    lerp: impl Fn(T, T, f32) -> T,
) -> T {
    let mut c = (*cursor).min(keys.len() - 1);
    while c + 1 < keys.len() && keys[c + 1].time <= time {
        c += 1;
    }
    *cursor = c;

    let a = &keys[c];
    match keys.get(c + 1) {
        Some(b) if time > a.time => {
            let span = b.time - a.time;
            let t = if span > 0.0 { (time - a.time) / span } else { 0.0 };
            lerp(a.value, b.value, t)
        }
        _ => a.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide_clip() -> AnimationClip {
        let track = JointTrack {
            translations: vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, Vec3::new(2.0, 0.0, 0.0)),
                Keyframe::new(2.0, Vec3::new(2.0, 4.0, 0.0)),
            ],
            rotations: vec![
                Keyframe::new(0.0, Quat::IDENTITY),
                Keyframe::new(2.0, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
            ],
            scales: vec![Keyframe::new(0.0, Vec3::ONE)],
        };
        AnimationClip::new("slide", 2.0, vec![track]).unwrap()
    }

    #[test]
    fn rejects_bad_clips() {
        assert_eq!(
            AnimationClip::new("x", 0.0, vec![]).unwrap_err(),
            CoreError::InvalidDuration(0.0)
        );
        let mut track = JointTrack::constant(Transform::identity());
        track.scales.clear();
        assert!(matches!(
            AnimationClip::new("x", 1.0, vec![track]).unwrap_err(),
            CoreError::EmptyChannel { channel: "scale", .. }
        ));
        let mut track = JointTrack::constant(Transform::identity());
        track.translations.push(Keyframe::new(3.0, Vec3::ONE));
        assert!(matches!(
            AnimationClip::new("x", 1.0, vec![track]).unwrap_err(),
            CoreError::BadKeyTime { key: 1, .. }
        ));
    }

    #[test]
    fn samples_exact_keys_and_midpoints() {
        let clip = slide_clip();
        let mut cache = SamplingCache::new(1);
        let mut out = [Transform::identity()];

        sample_local(&clip, 0.5, &mut cache, &mut out).unwrap();
        assert_eq!(out[0].translation, Vec3::new(2.0, 0.0, 0.0));

        sample_local(&clip, 0.75, &mut cache, &mut out).unwrap();
        assert!((out[0].translation - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-5);
        assert_eq!(out[0].scale, Vec3::ONE);
        assert!(out[0].rotation.is_normalized());
    }

    #[test]
    fn backwards_ratio_rewinds_cursors() {
        let clip = slide_clip();
        let mut cache = SamplingCache::new(1);
        let mut out = [Transform::identity()];

        sample_local(&clip, 0.9, &mut cache, &mut out).unwrap();
        sample_local(&clip, 0.25, &mut cache, &mut out).unwrap();
        assert!((out[0].translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn cache_size_must_match_tracks() {
        let clip = slide_clip();
        let mut cache = SamplingCache::new(2);
        let mut out = [Transform::identity()];
        assert_eq!(
            sample_local(&clip, 0.0, &mut cache, &mut out).unwrap_err(),
            CoreError::CacheSizeMismatch { cache: 2, tracks: 1 }
        );
        cache.resize(1);
        assert!(sample_local(&clip, 0.0, &mut cache, &mut out).is_ok());
    }
}
