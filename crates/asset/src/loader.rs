//! Loading a character (skeleton + clip) from two archive files.

use std::path::{Path, PathBuf};

use corelib::{AnimationClip, Skeleton};
use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::fetch::{
    ANIMATION_CAPACITY, FetchError, FetchId, FetchResponse, Fetcher, SKELETON_CAPACITY,
};

pub const SKELETON_FILE: &str = "skeleton.ozz";
pub const ANIMATION_FILE: &str = "animation.ozz";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to decode {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
}

/// Progress of the two loads. `load_failed` never resets once set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadState {
    pub skeleton_loaded: bool,
    pub animation_loaded: bool,
    pub load_failed: bool,
}

impl LoadState {
    /// Both halves loaded and nothing failed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.skeleton_loaded && self.animation_loaded && !self.load_failed
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.load_failed && !(self.skeleton_loaded && self.animation_loaded)
    }
}

/// Issues both fetches up front and decodes them as they complete.
pub struct CharacterLoader {
    fetcher: Fetcher,
    skeleton_req: FetchId,
    animation_req: FetchId,
    skeleton_path: PathBuf,
    animation_path: PathBuf,
    skeleton: Option<Skeleton>,
    animation: Option<AnimationClip>,
    state: LoadState,
}

impl CharacterLoader {
    /// Request `skeleton.ozz` and `animation.ozz` from `dir`.
    pub fn start(dir: &Path) -> Self {
        let skeleton_path = dir.join(SKELETON_FILE);
        let animation_path = dir.join(ANIMATION_FILE);
        let mut fetcher = Fetcher::new();
        let skeleton_req = fetcher.send(&skeleton_path, SKELETON_CAPACITY);
        let animation_req = fetcher.send(&animation_path, ANIMATION_CAPACITY);
        Self {
            fetcher,
            skeleton_req,
            animation_req,
            skeleton_path,
            animation_path,
            skeleton: None,
            animation: None,
            state: LoadState::default(),
        }
    }

    /// Handle completions that arrived since the last call. Returns the
    /// errors of loads that failed during this call.
    pub fn poll(&mut self) -> Vec<LoadError> {
        let mut errors = Vec::new();
        for FetchResponse { id, result } in self.fetcher.poll() {
            if id == self.skeleton_req {
                match decode(result, &self.skeleton_path, archive::read_skeleton) {
                    Ok(skeleton) => {
                        log::info!(
                            "Loaded skeleton with {} joints from {:?}",
                            skeleton.num_joints(),
                            self.skeleton_path
                        );
                        self.skeleton = Some(skeleton);
                        self.state.skeleton_loaded = true;
                    }
                    Err(e) => errors.push(e),
                }
            } else if id == self.animation_req {
                match decode(result, &self.animation_path, archive::read_animation) {
                    Ok(clip) => {
                        log::info!(
                            "Loaded animation '{}' ({:.2}s, {} tracks) from {:?}",
                            clip.name(),
                            clip.duration(),
                            clip.num_tracks(),
                            self.animation_path
                        );
                        self.animation = Some(clip);
                        self.state.animation_loaded = true;
                    }
                    Err(e) => errors.push(e),
                }
            }
        }
        if !errors.is_empty() {
            self.state.load_failed = true;
        }
        errors
    }

    #[inline]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Hand over both halves once the load succeeded; `None` before that
    /// and after the first successful call.
    pub fn take_ready(&mut self) -> Option<(Skeleton, AnimationClip)> {
        if !self.state.is_ready() {
            return None;
        }
        match (self.skeleton.take(), self.animation.take()) {
            (Some(s), Some(a)) => Some((s, a)),
            (s, a) => {
                self.skeleton = s;
                self.animation = a;
                None
            }
        }
    }

    /// Record a failure found after loading (e.g. skeleton and clip disagree).
    pub fn mark_failed(&mut self) {
        self.state.load_failed = true;
    }
}

fn decode<T>(
    result: Result<Vec<u8>, FetchError>,
    path: &Path,
    read: fn(&[u8]) -> Result<T, ArchiveError>,
) -> Result<T, LoadError> {
    let bytes = result?;
    read(&bytes).map_err(|source| LoadError::Archive {
        path: path.to_path_buf(),
        source,
    })
}
