//! Procedural humanoid rig and a looping walk cycle, used by `bake-rig` to
//! produce the archives the playback sample loads.

use std::f32::consts::TAU;

use corelib::{
    AnimationClip, CoreResult, JointTrack, Keyframe, NO_PARENT, Quat, Skeleton, Transform, Vec3,
};

pub const WALK_DURATION: f32 = 1.0;
const WALK_SEGMENTS: usize = 8;

/// (name, parent, rest translation)
const JOINTS: [(&str, i16, [f32; 3]); 19] = [
    ("hips", NO_PARENT, [0.0, 1.0, 0.0]),
    ("spine", 0, [0.0, 0.15, 0.0]),
    ("chest", 1, [0.0, 0.2, 0.0]),
    ("neck", 2, [0.0, 0.2, 0.0]),
    ("head", 3, [0.0, 0.1, 0.0]),
    ("upperarm.L", 2, [0.18, 0.15, 0.0]),
    ("forearm.L", 5, [0.0, -0.28, 0.0]),
    ("hand.L", 6, [0.0, -0.25, 0.0]),
    ("upperarm.R", 2, [-0.18, 0.15, 0.0]),
    ("forearm.R", 8, [0.0, -0.28, 0.0]),
    ("hand.R", 9, [0.0, -0.25, 0.0]),
    ("thigh.L", 0, [0.1, -0.05, 0.0]),
    ("shin.L", 11, [0.0, -0.45, 0.0]),
    ("foot.L", 12, [0.0, -0.45, 0.0]),
    ("toe.L", 13, [0.0, -0.05, 0.12]),
    ("thigh.R", 0, [-0.1, -0.05, 0.0]),
    ("shin.R", 15, [0.0, -0.45, 0.0]),
    ("foot.R", 16, [0.0, -0.45, 0.0]),
    ("toe.R", 17, [0.0, -0.05, 0.12]),
];

pub fn demo_skeleton() -> CoreResult<Skeleton> {
    let parents = JOINTS.iter().map(|j| j.1).collect();
    let names = JOINTS.iter().map(|j| j.0.to_string()).collect();
    let rest = JOINTS
        .iter()
        .map(|j| Transform::from_translation(Vec3::from_array(j.2)))
        .collect();
    Skeleton::new(parents, names, rest)
}

/// Rotation of an animated joint at walk phase `phase` (radians).
fn swing(name: &str, phase: f32) -> Option<Quat> {
    let s = phase.sin();
    let c = phase.cos();
    let angle_x = match name {
        "thigh.L" => 0.5 * s,
        "thigh.R" => -0.5 * s,
        "shin.L" => 0.3 * (1.0 - c),
        "shin.R" => 0.3 * (1.0 + c),
        "upperarm.L" => -0.4 * s,
        "upperarm.R" => 0.4 * s,
        "forearm.L" | "forearm.R" => -0.2,
        "spine" => return Some(Quat::from_rotation_y(0.1 * s)),
        _ => return None,
    };
    Some(Quat::from_rotation_x(angle_x))
}

fn walk_track(name: &str, rest: &Transform) -> JointTrack {
    let mut track = JointTrack::constant(*rest);
    let keys = (0..=WALK_SEGMENTS).map(|k| {
        let t = k as f32 / WALK_SEGMENTS as f32;
        (t * WALK_DURATION, t * TAU)
    });

    if swing(name, 0.0).is_some() {
        track.rotations = keys
            .clone()
            .filter_map(|(time, phase)| {
                swing(name, phase).map(|q| Keyframe::new(time, rest.rotation * q))
            })
            .collect();
    }
    // root bobs twice per stride
    if name == "hips" {
        track.translations = keys
            .map(|(time, phase)| {
                let bob = Vec3::new(0.0, 0.03 * (2.0 * phase).cos(), 0.0);
                Keyframe::new(time, rest.translation + bob)
            })
            .collect();
    }
    track
}

/// One looping stride over the joints of `skeleton`, keyed by joint name.
pub fn walk_cycle(skeleton: &Skeleton) -> CoreResult<AnimationClip> {
    let tracks = skeleton
        .joint_names()
        .iter()
        .zip(skeleton.rest_pose())
        .map(|(name, rest)| walk_track(name, rest))
        .collect();
    AnimationClip::new("walk", WALK_DURATION, tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::archive::{read_animation, read_skeleton, write_animation, write_skeleton};
    use asset::fetch::{ANIMATION_CAPACITY, SKELETON_CAPACITY};
    use corelib::Character;

    #[test]
    fn rig_is_valid_and_named() {
        let skeleton = demo_skeleton().unwrap();
        assert_eq!(skeleton.num_joints(), JOINTS.len());
        assert_eq!(skeleton.find_joint("head"), Some(4));
        assert_eq!(skeleton.parent(0), None);
        assert_eq!(skeleton.parent(14), Some(13));
    }

    #[test]
    fn walk_loops_seamlessly() {
        let skeleton = demo_skeleton().unwrap();
        let clip = walk_cycle(&skeleton).unwrap();
        assert_eq!(clip.num_tracks(), skeleton.num_joints());

        let mut character = Character::new(skeleton, clip).unwrap();
        let start = character.evaluate(0.0).unwrap().models.clone();
        let end = character.evaluate(1.0).unwrap().models.clone();
        for (a, b) in start.iter().zip(&end) {
            assert!(a.abs_diff_eq(*b, 1e-4));
        }
        let mid = character.evaluate(0.25).unwrap();
        assert!(!mid.models[11].abs_diff_eq(start[11], 1e-3));
    }

    #[test]
    fn archives_fit_loader_capacities() {
        let skeleton = demo_skeleton().unwrap();
        let clip = walk_cycle(&skeleton).unwrap();
        let s = write_skeleton(&skeleton).unwrap();
        let a = write_animation(&clip).unwrap();
        assert!(s.len() <= SKELETON_CAPACITY);
        assert!(a.len() <= ANIMATION_CAPACITY);
        assert_eq!(read_skeleton(&s).unwrap(), skeleton);
        assert_eq!(read_animation(&a).unwrap(), clip);
    }
}
