//! Core types: math re-exports, Transform, Camera, skeletal animation.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod animation;
pub mod camera;
pub mod debug_draw;
pub mod error;
pub mod playback;
pub mod pose;
pub mod skeleton;
pub mod transform;

pub use animation::{AnimationClip, JointTrack, Keyframe, SamplingCache, sample_local};
pub use error::{CoreError, CoreResult};
pub use pose::{Character, Pose, propagate_to_model};
pub use skeleton::{NO_PARENT, Skeleton};
pub use transform::Transform;
