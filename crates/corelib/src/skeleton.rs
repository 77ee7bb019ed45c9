//! Joint hierarchy stored in topological order.

use crate::error::{CoreError, CoreResult};
use crate::transform::Transform;

/// Parent index of a root joint.
pub const NO_PARENT: i16 = -1;

/// Ordered joints with parent indices. Every parent precedes its children,
/// so a single forward pass over the joints visits parents first.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    parents: Vec<i16>,
    names: Vec<String>,
    rest_pose: Vec<Transform>,
}

impl Skeleton {
    /// Validates parent order and that all per-joint arrays line up.
    pub fn new(
        parents: Vec<i16>,
        names: Vec<String>,
        rest_pose: Vec<Transform>,
    ) -> CoreResult<Self> {
        if parents.len() != names.len() || parents.len() != rest_pose.len() {
            return Err(CoreError::JointDataMismatch {
                parents: parents.len(),
                names: names.len(),
                rest: rest_pose.len(),
            });
        }
        if parents.len() > i16::MAX as usize {
            return Err(CoreError::TooManyJoints(parents.len()));
        }
        validate_parents(&parents)?;
        Ok(Self {
            parents,
            names,
            rest_pose,
        })
    }

    /// Skeleton with generated names and identity rest pose.
    pub fn from_parents(parents: Vec<i16>) -> CoreResult<Self> {
        let names = (0..parents.len()).map(|i| format!("joint{i}")).collect();
        let rest_pose = vec![Transform::identity(); parents.len()];
        Self::new(parents, names, rest_pose)
    }

    #[inline]
    pub fn num_joints(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    pub fn joint_parents(&self) -> &[i16] {
        &self.parents
    }

    /// Parent of joint `index`, `None` for roots.
    #[inline]
    pub fn parent(&self, index: usize) -> Option<usize> {
        match self.parents.get(index) {
            Some(&p) if p >= 0 => Some(p as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn joint_names(&self) -> &[String] {
        &self.names
    }

    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[inline]
    pub fn rest_pose(&self) -> &[Transform] {
        &self.rest_pose
    }
}

/// Reject any parent that is not the sentinel or an earlier joint.
pub fn validate_parents(parents: &[i16]) -> CoreResult<()> {
    for (joint, &parent) in parents.iter().enumerate() {
        let ok = parent == NO_PARENT || (parent >= 0 && (parent as usize) < joint);
        if !ok {
            return Err(CoreError::ParentOrder { joint, parent });
        }
    }
    Ok(())
}
