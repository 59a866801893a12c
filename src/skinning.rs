use glam::Mat4;

use crate::{
    asset::{accessor::AccessorReader, schema},
    error::LoadError,
    scene_graph::SceneGraph,
};

/// Joint list plus one inverse bind matrix per joint slot.
#[derive(Debug, Clone)]
pub struct Skin {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
    pub skeleton: Option<usize>,
}

impl Skin {
    pub fn load(index: usize, skin: &schema::Skin, reader: &AccessorReader, node_count: usize) -> Result<Self, LoadError> {
        for &joint in &skin.joints {
            if joint >= node_count {
                return Err(LoadError::missing("nodes", joint, node_count, format!("joints of skin {}", index)));
            }
        }
        if let Some(root) = skin.skeleton {
            if root >= node_count {
                return Err(LoadError::missing("nodes", root, node_count, format!("skeleton of skin {}", index)));
            }
        }

        let inverse_bind_matrices = match skin.inverse_bind_matrices {
            Some(accessor) => {
                let mut matrices = reader.read_mat4s(accessor)?;
                if matrices.len() < skin.joints.len() {
                    return Err(LoadError::SkinMatrixCount {
                        skin: index,
                        matrices: matrices.len(),
                        joints: skin.joints.len(),
                    });
                }
                matrices.truncate(skin.joints.len());
                matrices
            }
            None => vec![Mat4::IDENTITY; skin.joints.len()],
        };

        Ok(Self {
            name: skin.name.clone(),
            joints: skin.joints.clone(),
            inverse_bind_matrices,
            skeleton: skin.skeleton,
        })
    }
}

/// Per-instance joint matrices of one skin, in joint order.
#[derive(Debug, Clone)]
pub struct JointPalette {
    pub skin: usize,
    pub matrices: Vec<Mat4>,
    /// scene graph generation the matrices were computed against
    computed_at: Option<u64>,
}
impl JointPalette {
    pub fn new(skin: usize, joints: usize) -> Self {
        Self { skin, matrices: vec![Mat4::IDENTITY; joints], computed_at: None }
    }
}

pub struct SkinningEngine;

impl SkinningEngine {
    /// `joint_matrix[i] = world(joints[i]) * inverse_bind_matrices[i]`
    pub fn compute(skin: &Skin, graph: &SceneGraph, out: &mut Vec<Mat4>) {
        out.clear();
        out.extend(
            skin.joints
                .iter()
                .zip(&skin.inverse_bind_matrices)
                .map(|(&joint, ibm)| graph.world_matrix(joint) * *ibm),
        );
    }

    /// Recomputes the palette only if a joint's world matrix changed since it
    /// was last computed. Returns whether it did.
    pub fn refresh(palette: &mut JointPalette, skin: &Skin, graph: &SceneGraph) -> bool {
        let stale = match palette.computed_at {
            None => true,
            Some(at) => skin
                .joints
                .iter()
                .any(|&joint| graph.node(joint).is_some_and(|n| n.world_generation() > at)),
        };
        if stale {
            Self::compute(skin, graph, &mut palette.matrices);
            palette.computed_at = Some(graph.generation());
        }
        stale
    }
}
