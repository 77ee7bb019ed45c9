//! Pose evaluation: sample local transforms, then walk the hierarchy.

use crate::Mat4;
use crate::animation::{AnimationClip, SamplingCache, sample_local};
use crate::error::{CoreError, CoreResult};
use crate::skeleton::Skeleton;
use crate::transform::Transform;

/// Local-space transforms and model-space matrices, one of each per joint.
#[derive(Clone, Debug)]
pub struct Pose {
    pub locals: Vec<Transform>,
    pub models: Vec<Mat4>,
}

impl Pose {
    pub fn new(num_joints: usize) -> Self {
        Self {
            locals: vec![Transform::identity(); num_joints],
            models: vec![Mat4::IDENTITY; num_joints],
        }
    }

    #[inline]
    pub fn num_joints(&self) -> usize {
        self.locals.len()
    }
}

/// `models[i] = models[parent(i)] * locals[i]`, visiting joints in index order.
pub fn propagate_to_model(
    skeleton: &Skeleton,
    locals: &[Transform],
    models: &mut [Mat4],
) -> CoreResult<()> {
    let n = skeleton.num_joints();
    if locals.len() != n {
        return Err(CoreError::OutputSizeMismatch {
            got: locals.len(),
            expected: n,
        });
    }
    if models.len() != n {
        return Err(CoreError::OutputSizeMismatch {
            got: models.len(),
            expected: n,
        });
    }

    for (i, local) in locals.iter().enumerate() {
        let local = local.matrix();
        models[i] = match skeleton.parent(i) {
            Some(p) => models[p] * local,
            None => local,
        };
    }
    Ok(())
}

/// Skeleton, clip and the buffers needed to evaluate them, owned together.
pub struct Character {
    skeleton: Skeleton,
    animation: AnimationClip,
    cache: SamplingCache,
    pose: Pose,
}

impl Character {
    pub fn new(skeleton: Skeleton, animation: AnimationClip) -> CoreResult<Self> {
        let joints = skeleton.num_joints();
        if animation.num_tracks() != joints {
            return Err(CoreError::TrackCountMismatch {
                tracks: animation.num_tracks(),
                joints,
            });
        }
        Ok(Self {
            skeleton,
            animation,
            cache: SamplingCache::new(joints),
            pose: Pose::new(joints),
        })
    }

    /// Overwrite the pose with the clip evaluated at `ratio`.
    pub fn evaluate(&mut self, ratio: f32) -> CoreResult<&Pose> {
        sample_local(&self.animation, ratio, &mut self.cache, &mut self.pose.locals)?;
        propagate_to_model(&self.skeleton, &self.pose.locals, &mut self.pose.models)?;
        Ok(&self.pose)
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn animation(&self) -> &AnimationClip {
        &self.animation
    }

    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{JointTrack, Keyframe};
    use crate::skeleton::NO_PARENT;
    use crate::{Quat, Vec3, vec3};

    #[test]
    fn single_root_model_equals_local() {
        let skeleton = Skeleton::from_parents(vec![NO_PARENT]).unwrap();
        let local = Transform::from_trs(
            vec3(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.3),
            vec3(2.0, 2.0, 2.0),
        );
        let mut models = [Mat4::ZERO];
        propagate_to_model(&skeleton, &[local], &mut models).unwrap();
        assert_eq!(models[0], local.matrix());
    }

    #[test]
    fn chain_accumulates_parent_transforms() {
        let skeleton = Skeleton::from_parents(vec![NO_PARENT, 0, 1]).unwrap();
        let locals = [
            Transform::from_trs(
                Vec3::ZERO,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::ONE,
            ),
            Transform::from_translation(vec3(1.0, 0.0, 0.0)),
            Transform::from_translation(vec3(1.0, 0.0, 0.0)),
        ];
        let mut models = [Mat4::IDENTITY; 3];
        propagate_to_model(&skeleton, &locals, &mut models).unwrap();
        let tip = models[2].w_axis.truncate();
        assert!((tip - vec3(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn character_requires_one_track_per_joint() {
        let skeleton = Skeleton::from_parents(vec![NO_PARENT, 0]).unwrap();
        let clip = AnimationClip::new("one", 1.0, vec![rest_track()]).unwrap();
        assert!(matches!(
            Character::new(skeleton, clip),
            Err(CoreError::TrackCountMismatch { tracks: 1, joints: 2 })
        ));
    }

    #[test]
    fn character_evaluates_into_owned_pose() {
        let skeleton = Skeleton::from_parents(vec![NO_PARENT, 0]).unwrap();
        let moving = JointTrack {
            translations: vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, vec3(0.0, 4.0, 0.0)),
            ],
            ..rest_track()
        };
        let clip = AnimationClip::new("up", 1.0, vec![rest_track(), moving]).unwrap();
        let mut character = Character::new(skeleton, clip).unwrap();
        let pose = character.evaluate(0.5).unwrap();
        assert!((pose.models[1].w_axis.truncate() - vec3(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    fn rest_track() -> JointTrack {
        JointTrack::constant(Transform::identity())
    }
}
