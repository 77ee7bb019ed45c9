//! Core errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("joint {joint} has parent {parent}, parents must precede their children")]
    ParentOrder { joint: usize, parent: i16 },

    #[error("skeleton has {0} joints, at most {max} are supported", max = i16::MAX)]
    TooManyJoints(usize),

    #[error("skeleton has {parents} parents but {names} names and {rest} rest transforms")]
    JointDataMismatch {
        parents: usize,
        names: usize,
        rest: usize,
    },

    #[error("animation duration must be positive and finite, got {0}")]
    InvalidDuration(f32),

    #[error("track {track}: {channel} channel has no keyframes")]
    EmptyChannel { track: usize, channel: &'static str },

    #[error("track {track}: {channel} key {key} at {time}s is out of order or past the clip end")]
    BadKeyTime {
        track: usize,
        channel: &'static str,
        key: usize,
        time: f32,
    },

    #[error("animation has {tracks} tracks but skeleton has {joints} joints")]
    TrackCountMismatch { tracks: usize, joints: usize },

    #[error("sampling cache holds {cache} tracks, animation has {tracks}")]
    CacheSizeMismatch { cache: usize, tracks: usize },

    #[error("output buffer holds {got} joints, expected {expected}")]
    OutputSizeMismatch { got: usize, expected: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
