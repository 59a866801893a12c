//! Node hierarchy with cached world matrices.
//!
//! Nodes live in a flat arena indexed the same way as the document's `nodes`
//! table. Ownership flows root to leaf through `children`, the `parent` link is
//! a plain index back up.

use glam::{Mat4, Quat, Vec3};

use crate::{asset::schema, error::LoadError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}
impl Default for Trs {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}
impl Trs {
    /// translate(T) * rotate(R) * scale(S)
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_mat4(m: &Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self { translation, rotation, scale }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub index: usize,
    pub name: Option<String>,
    pub trs: Trs,
    /// explicit local matrix, dropped as soon as any TRS component is written
    pub matrix: Option<Mat4>,
    pub bind_trs: Trs,
    pub bind_matrix: Option<Mat4>,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
    pub mesh: Option<usize>,
    pub camera: Option<usize>,
    pub skin: Option<usize>,
    world: Mat4,
    /// pass in which `world` last changed
    world_generation: u64,
    dirty: bool,
    updated: bool,
}
impl Node {
    fn from_schema(index: usize, node: &schema::Node) -> Result<Self, LoadError> {
        let has_trs = node.translation.is_some() || node.rotation.is_some() || node.scale.is_some();
        let (trs, matrix) = match node.matrix {
            Some(_) if has_trs => return Err(LoadError::MatrixAndTrs { node: index }),
            Some(cols) => {
                let m = Mat4::from_cols_array(&cols);
                (Trs::from_mat4(&m), Some(m))
            }
            None => {
                let trs = Trs {
                    translation: node.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO),
                    rotation: node.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY),
                    scale: node.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE),
                };
                (trs, None)
            }
        };
        Ok(Self {
            index,
            name: node.name.clone(),
            trs,
            matrix,
            bind_trs: trs,
            bind_matrix: matrix,
            children: node.children.clone(),
            parent: None,
            mesh: node.mesh,
            camera: node.camera,
            skin: node.skin,
            world: Mat4::IDENTITY,
            world_generation: 0,
            dirty: true,
            updated: false,
        })
    }

    pub fn compose_local(&self) -> Mat4 {
        self.matrix.unwrap_or_else(|| self.trs.to_mat4())
    }

    /// Cached world matrix as of the last update pass.
    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn world_generation(&self) -> u64 {
        self.world_generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    generation: u64,
}

impl SceneGraph {
    /// Builds the arena, resolves parent links from the children lists and
    /// computes every world matrix once.
    pub fn from_nodes(nodes: &[schema::Node]) -> Result<Self, LoadError> {
        let mut arena = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| Node::from_schema(index, node))
            .collect::<Result<Vec<_>, _>>()?;

        let n = arena.len();
        for parent in 0..n {
            for i in 0..arena[parent].children.len() {
                let child = arena[parent].children[i];
                if child >= n {
                    return Err(LoadError::missing("nodes", child, n, format!("children of node {}", parent)));
                }
                if child == parent {
                    return Err(LoadError::SelfParent { node: parent });
                }
                if let Some(first) = arena[child].parent {
                    return Err(LoadError::MultipleParents { child, first, second: parent });
                }
                arena[child].parent = Some(parent);
            }
        }

        let roots: Vec<usize> = (0..n).filter(|&i| arena[i].parent.is_none()).collect();

        // with single parents, anything unreachable from a root sits on a cycle
        let mut reached = vec![false; n];
        let mut stack = roots.clone();
        while let Some(i) = stack.pop() {
            reached[i] = true;
            stack.extend(arena[i].children.iter().copied());
        }
        if let Some(node) = reached.iter().position(|r| !r) {
            return Err(LoadError::Cycle { node });
        }

        let mut graph = Self { nodes: arena, roots, generation: 0 };
        graph.update_world_matrices();
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Number of update passes that changed at least one world matrix.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn compose_local(&self, index: usize) -> Mat4 {
        self.nodes[index].compose_local()
    }

    /// Cached world matrix. Current once `update_world_matrices` has run after
    /// the last local change.
    pub fn world_matrix(&self, index: usize) -> Mat4 {
        self.nodes[index].world
    }

    /// Walks the parent chain without touching the cache.
    pub fn compute_world_matrix(&self, index: usize) -> Mat4 {
        let node = &self.nodes[index];
        match node.parent {
            Some(parent) => self.compute_world_matrix(parent) * node.compose_local(),
            None => node.compose_local(),
        }
    }

    /// Marks the node and its whole subtree for recomputation.
    pub fn mark_dirty(&mut self, index: usize) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            let node = &mut self.nodes[i];
            // a dirty node's subtree is dirty already
            if node.dirty && i != index {
                continue;
            }
            node.dirty = true;
            stack.extend(node.children.iter().copied());
        }
    }

    fn write_trs(&mut self, index: usize, f: impl FnOnce(&mut Trs)) {
        let node = &mut self.nodes[index];
        f(&mut node.trs);
        node.matrix = None;
        self.mark_dirty(index);
    }

    pub fn set_translation(&mut self, index: usize, translation: Vec3) {
        self.write_trs(index, |trs| trs.translation = translation);
    }

    pub fn set_rotation(&mut self, index: usize, rotation: Quat) {
        self.write_trs(index, |trs| trs.rotation = rotation);
    }

    pub fn set_scale(&mut self, index: usize, scale: Vec3) {
        self.write_trs(index, |trs| trs.scale = scale);
    }

    pub fn set_trs(&mut self, index: usize, trs: Trs) {
        self.write_trs(index, |t| *t = trs);
    }

    pub fn reset_to_bind_pose(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        node.trs = node.bind_trs;
        node.matrix = node.bind_matrix;
        self.mark_dirty(index);
    }

    pub fn reset_all_to_bind_pose(&mut self) {
        for node in &mut self.nodes {
            node.trs = node.bind_trs;
            node.matrix = node.bind_matrix;
            node.dirty = true;
        }
    }

    /// Recomputes world matrices of dirty nodes, parents strictly before
    /// children, each node at most once. Returns how many were recomputed.
    pub fn update_world_matrices(&mut self) -> usize {
        let mut recomputed = Vec::new();
        let mut chain = Vec::new();
        let generation = self.generation + 1;

        for start in 0..self.nodes.len() {
            let mut cursor = Some(start);
            while let Some(i) = cursor {
                let node = &self.nodes[i];
                if !node.dirty || node.updated {
                    break;
                }
                chain.push(i);
                cursor = node.parent;
            }

            while let Some(i) = chain.pop() {
                let parent_world = self.nodes[i].parent.map(|p| self.nodes[p].world);
                let node = &mut self.nodes[i];
                let local = node.compose_local();
                node.world = match parent_world {
                    Some(parent_world) => parent_world * local,
                    None => local,
                };
                node.world_generation = generation;
                node.updated = true;
                recomputed.push(i);
            }
        }

        for &i in &recomputed {
            let node = &mut self.nodes[i];
            node.dirty = false;
            node.updated = false;
        }
        if !recomputed.is_empty() {
            self.generation = generation;
            tracing::trace!("recomputed {} world matrices", recomputed.len());
        }
        recomputed.len()
    }
}
