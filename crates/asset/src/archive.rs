//! Tagged little-endian binary archives for skeletons and animation clips.
//!
//! Layout: NUL-terminated tag, `u32` version, payload. Readers check the tag
//! before touching the payload, so a skeleton file handed to the animation
//! reader fails with [`ArchiveError::TagMismatch`].

use corelib::animation::{AnimationClip, JointTrack, Keyframe};
use corelib::skeleton::Skeleton;
use corelib::transform::Transform;
use corelib::{CoreError, Quat, Vec3};
use thiserror::Error;

pub const SKELETON_TAG: &str = "svarog-skeleton";
pub const ANIMATION_TAG: &str = "svarog-animation";
pub const VERSION: u32 = 1;

const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive truncated: {needed} bytes needed at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("archive tag mismatch: expected '{expected}', found '{found}'")]
    TagMismatch { expected: &'static str, found: String },

    #[error("unsupported {tag} archive version {version}")]
    UnsupportedVersion { tag: &'static str, version: u32 },

    #[error("invalid UTF-8 in name")]
    InvalidName(#[from] std::string::FromUtf8Error),

    #[error("name is {0} bytes, at most {max} fit", max = u16::MAX)]
    NameTooLong(usize),

    #[error("{0} trailing bytes after archive payload")]
    TrailingBytes(usize),

    #[error("archived data is invalid: {0}")]
    Invalid(#[from] CoreError),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Cursor over an in-memory archive.
pub struct ArchiveReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> ArchiveResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.bytes.len());
        match end {
            Some(end) => {
                let out = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(out)
            }
            None => Err(ArchiveError::UnexpectedEof {
                offset: self.pos,
                needed: n,
            }),
        }
    }

    fn array<const N: usize>(&mut self) -> ArchiveResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u16(&mut self) -> ArchiveResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn i16(&mut self) -> ArchiveResult<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> ArchiveResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> ArchiveResult<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub fn vec3(&mut self) -> ArchiveResult<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    pub fn quat(&mut self) -> ArchiveResult<Quat> {
        Ok(Quat::from_xyzw(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }

    pub fn string(&mut self) -> ArchiveResult<String> {
        let len = self.u16()? as usize;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }

    /// Read the NUL-terminated tag and fail unless it equals `expected`.
    pub fn expect_tag(&mut self, expected: &'static str) -> ArchiveResult<()> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        let window = &rest[..rest.len().min(MAX_TAG_LEN)];
        let Some(nul) = window.iter().position(|&b| b == 0) else {
            return Err(ArchiveError::TagMismatch {
                expected,
                found: String::from_utf8_lossy(window).into_owned(),
            });
        };
        let found = &window[..nul];
        if found != expected.as_bytes() {
            return Err(ArchiveError::TagMismatch {
                expected,
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        self.pos += nul + 1;
        Ok(())
    }

    /// Fail if unread bytes remain.
    pub fn finish(self) -> ArchiveResult<()> {
        match self.bytes.len() - self.pos {
            0 => Ok(()),
            n => Err(ArchiveError::TrailingBytes(n)),
        }
    }
}

/// Growable archive buffer.
#[derive(Default)]
pub struct ArchiveWriter {
    buf: Vec<u8>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&mut self, tag: &str) {
        self.buf.extend_from_slice(tag.as_bytes());
        self.buf.push(0);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn vec3(&mut self, v: Vec3) {
        v.to_array().into_iter().for_each(|c| self.f32(c));
    }

    pub fn quat(&mut self, q: Quat) {
        q.to_array().into_iter().for_each(|c| self.f32(c));
    }

    pub fn string(&mut self, s: &str) -> ArchiveResult<()> {
        let len = u16::try_from(s.len()).map_err(|_| ArchiveError::NameTooLong(s.len()))?;
        self.u16(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// True if `bytes` starts with the NUL-terminated `tag`.
pub fn test_tag(bytes: &[u8], tag: &'static str) -> bool {
    ArchiveReader::new(bytes).expect_tag(tag).is_ok()
}

fn expect_header(r: &mut ArchiveReader<'_>, tag: &'static str) -> ArchiveResult<()> {
    r.expect_tag(tag)?;
    match r.u32()? {
        VERSION => Ok(()),
        version => Err(ArchiveError::UnsupportedVersion { tag, version }),
    }
}

// Counts come from untrusted input, don't let them size allocations.
fn bounded_capacity(count: u32) -> usize {
    (count as usize).min(1024)
}

pub fn read_skeleton(bytes: &[u8]) -> ArchiveResult<Skeleton> {
    let mut r = ArchiveReader::new(bytes);
    expect_header(&mut r, SKELETON_TAG)?;

    let count = r.u32()?;
    let mut parents = Vec::with_capacity(bounded_capacity(count));
    let mut names = Vec::with_capacity(bounded_capacity(count));
    let mut rest_pose = Vec::with_capacity(bounded_capacity(count));
    for _ in 0..count {
        parents.push(r.i16()?);
        names.push(r.string()?);
        rest_pose.push(Transform::from_trs(r.vec3()?, r.quat()?, r.vec3()?));
    }
    r.finish()?;
    Ok(Skeleton::new(parents, names, rest_pose)?)
}

pub fn write_skeleton(skeleton: &Skeleton) -> ArchiveResult<Vec<u8>> {
    let mut w = ArchiveWriter::new();
    w.tag(SKELETON_TAG);
    w.u32(VERSION);
    w.u32(skeleton.num_joints() as u32);
    let joints = skeleton
        .joint_parents()
        .iter()
        .zip(skeleton.joint_names())
        .zip(skeleton.rest_pose());
    for ((&parent, name), rest) in joints {
        w.i16(parent);
        w.string(name)?;
        w.vec3(rest.translation);
        w.quat(rest.rotation);
        w.vec3(rest.scale);
    }
    Ok(w.into_bytes())
}

fn read_keys<'a, T>(
    r: &mut ArchiveReader<'a>,
    value: impl Fn(&mut ArchiveReader<'a>) -> ArchiveResult<T>,
) -> ArchiveResult<Vec<Keyframe<T>>> {
    let count = r.u32()?;
    let mut keys = Vec::with_capacity(bounded_capacity(count));
    for _ in 0..count {
        let time = r.f32()?;
        keys.push(Keyframe::new(time, value(r)?));
    }
    Ok(keys)
}

fn write_keys<T: Copy>(
    w: &mut ArchiveWriter,
    keys: &[Keyframe<T>],
    value: impl Fn(&mut ArchiveWriter, T),
) {
    w.u32(keys.len() as u32);
    for k in keys {
        w.f32(k.time);
        value(w, k.value);
    }
}

pub fn read_animation(bytes: &[u8]) -> ArchiveResult<AnimationClip> {
    let mut r = ArchiveReader::new(bytes);
    expect_header(&mut r, ANIMATION_TAG)?;

    let duration = r.f32()?;
    let name = r.string()?;
    let count = r.u32()?;
    let mut tracks = Vec::with_capacity(bounded_capacity(count));
    for _ in 0..count {
        tracks.push(JointTrack {
            translations: read_keys(&mut r, ArchiveReader::vec3)?,
            rotations: read_keys(&mut r, ArchiveReader::quat)?,
            scales: read_keys(&mut r, ArchiveReader::vec3)?,
        });
    }
    r.finish()?;
    Ok(AnimationClip::new(name, duration, tracks)?)
}

pub fn write_animation(clip: &AnimationClip) -> ArchiveResult<Vec<u8>> {
    let mut w = ArchiveWriter::new();
    w.tag(ANIMATION_TAG);
    w.u32(VERSION);
    w.f32(clip.duration());
    w.string(clip.name())?;
    w.u32(clip.num_tracks() as u32);
    for track in clip.tracks() {
        write_keys(&mut w, &track.translations, ArchiveWriter::vec3);
        write_keys(&mut w, &track.rotations, ArchiveWriter::quat);
        write_keys(&mut w, &track.scales, ArchiveWriter::vec3);
    }
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::NO_PARENT;

    fn skeleton() -> Skeleton {
        Skeleton::new(
            vec![NO_PARENT, 0, 1],
            vec!["hips".into(), "spine".into(), "head".into()],
            vec![
                Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)),
                Transform::from_translation(Vec3::new(0.0, 0.3, 0.0)),
                Transform::from_trs(
                    Vec3::new(0.0, 0.3, 0.0),
                    Quat::from_rotation_x(0.2),
                    Vec3::ONE,
                ),
            ],
        )
        .unwrap()
    }

    fn clip() -> AnimationClip {
        let wobble = JointTrack {
            rotations: vec![
                Keyframe::new(0.0, Quat::IDENTITY),
                Keyframe::new(0.5, Quat::from_rotation_z(0.4)),
                Keyframe::new(1.0, Quat::IDENTITY),
            ],
            ..JointTrack::constant(Transform::identity())
        };
        AnimationClip::new("wobble", 1.0, vec![wobble.clone(), wobble.clone(), wobble]).unwrap()
    }

    #[test]
    fn skeleton_survives_archive() {
        let s = skeleton();
        let bytes = write_skeleton(&s).unwrap();
        assert!(test_tag(&bytes, SKELETON_TAG));
        assert_eq!(read_skeleton(&bytes).unwrap(), s);
    }

    #[test]
    fn animation_survives_archive() {
        let c = clip();
        let bytes = write_animation(&c).unwrap();
        assert_eq!(read_animation(&bytes).unwrap(), c);
    }

    #[test]
    fn wrong_tag_is_an_error_not_a_crash() {
        let bytes = write_skeleton(&skeleton()).unwrap();
        assert!(!test_tag(&bytes, ANIMATION_TAG));
        match read_animation(&bytes) {
            Err(ArchiveError::TagMismatch { expected, found }) => {
                assert_eq!(expected, ANIMATION_TAG);
                assert_eq!(found, SKELETON_TAG);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(read_skeleton(b"garbage"), Err(ArchiveError::TagMismatch { .. })));
        assert!(matches!(read_skeleton(&[]), Err(ArchiveError::TagMismatch { .. })));
    }

    #[test]
    fn truncated_and_padded_archives_fail() {
        let bytes = write_skeleton(&skeleton()).unwrap();
        assert!(matches!(
            read_skeleton(&bytes[..bytes.len() - 3]),
            Err(ArchiveError::UnexpectedEof { .. })
        ));
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0, 0]);
        assert!(matches!(read_skeleton(&padded), Err(ArchiveError::TrailingBytes(2))));
    }

    #[test]
    fn bad_version_and_bad_hierarchy_are_rejected() {
        let mut w = ArchiveWriter::new();
        w.tag(SKELETON_TAG);
        w.u32(VERSION + 1);
        assert!(matches!(
            read_skeleton(&w.into_bytes()),
            Err(ArchiveError::UnsupportedVersion { version: 2, .. })
        ));

        let mut w = ArchiveWriter::new();
        w.tag(SKELETON_TAG);
        w.u32(VERSION);
        w.u32(1);
        w.i16(0); // a joint cannot be its own parent
        w.string("loop").unwrap();
        w.vec3(Vec3::ZERO);
        w.quat(Quat::IDENTITY);
        w.vec3(Vec3::ONE);
        assert!(matches!(
            read_skeleton(&w.into_bytes()),
            Err(ArchiveError::Invalid(CoreError::ParentOrder { joint: 0, parent: 0 }))
        ));
    }
}
