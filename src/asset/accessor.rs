use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::{
    buffer::ByteBufferStore,
    schema::{Accessor, AccessorType, BufferView, ComponentType},
};
use crate::error::LoadError;

fn layout_error(accessor: usize, reason: impl Into<String>) -> LoadError {
    LoadError::AccessorLayout { accessor, reason: reason.into() }
}

fn component_to_f32(ty: ComponentType, normalized: bool, bytes: &[u8]) -> f32 {
    match ty {
        ComponentType::Float => bytemuck::cast::<[u8; 4], f32>([bytes[0], bytes[1], bytes[2], bytes[3]]),
        ComponentType::SignedByte => {
            let v = bytes[0] as i8 as f32;
            if normalized { (v / 127.0).max(-1.0) } else { v }
        }
        ComponentType::UnsignedByte => {
            let v = bytes[0] as f32;
            if normalized { v / 255.0 } else { v }
        }
        ComponentType::SignedShort => {
            let v = bytemuck::cast::<[u8; 2], i16>([bytes[0], bytes[1]]) as f32;
            if normalized { (v / 32767.0).max(-1.0) } else { v }
        }
        ComponentType::UnsignedShort => {
            let v = bytemuck::cast::<[u8; 2], u16>([bytes[0], bytes[1]]) as f32;
            if normalized { v / 65535.0 } else { v }
        }
        ComponentType::UnsignedInt => bytemuck::cast::<[u8; 4], u32>([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
    }
}

fn component_to_u32(ty: ComponentType, bytes: &[u8]) -> Option<u32> {
    match ty {
        ComponentType::UnsignedByte => Some(bytes[0] as u32),
        ComponentType::UnsignedShort => Some(bytemuck::cast::<[u8; 2], u16>([bytes[0], bytes[1]]) as u32),
        ComponentType::UnsignedInt => Some(bytemuck::cast::<[u8; 4], u32>([bytes[0], bytes[1], bytes[2], bytes[3]])),
        _ => None,
    }
}

/// `offset + stride * (count - 1) + element_size`, or `None` on overflow
fn required_bytes(offset: usize, stride: usize, count: usize, element_size: usize) -> Option<usize> {
    if count == 0 {
        return Some(offset);
    }
    stride.checked_mul(count - 1)?.checked_add(element_size)?.checked_add(offset)
}

/// Reads typed element arrays out of the binary tables of one asset.
///
/// Accessor ranges are validated on every read rather than at load time, so a
/// truncated region only fails once something actually asks for it.
#[derive(Clone, Copy)]
pub struct AccessorReader<'a> {
    pub buffer_views: &'a [BufferView],
    pub accessors: &'a [Accessor],
    pub buffers: &'a ByteBufferStore,
}

impl<'a> AccessorReader<'a> {
    pub fn accessor(&self, index: usize) -> Result<&'a Accessor, LoadError> {
        self.accessors
            .get(index)
            .ok_or_else(|| LoadError::missing("accessors", index, self.accessors.len(), "accessor read"))
    }

    fn view_bytes(&self, view_index: usize, accessor: usize) -> Result<(&'a BufferView, &'a [u8]), LoadError> {
        let view = self.buffer_views.get(view_index).ok_or_else(|| {
            LoadError::missing("bufferViews", view_index, self.buffer_views.len(), format!("accessor {}", accessor))
        })?;
        let buffer = self.buffers.get(view.buffer).ok_or_else(|| {
            LoadError::missing("buffers", view.buffer, self.buffers.len(), format!("bufferView {}", view_index))
        })?;
        let bytes = view
            .byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| buffer.get(view.byte_offset..end))
            .ok_or(LoadError::BufferViewRange {
                view: view_index,
                offset: view.byte_offset,
                length: view.byte_length,
                buffer_len: buffer.len(),
            })?;
        Ok((view, bytes))
    }

    /// Copies the accessor's elements into a tightly packed byte array,
    /// applying sparse substitution.
    pub fn read_accessor_data(&self, index: usize) -> Result<(&'a Accessor, Vec<u8>), LoadError> {
        let accessor = self.accessor(index)?;
        let count = accessor.count;
        let elem_size = accessor.element_size();
        let total = count
            .checked_mul(elem_size)
            .ok_or_else(|| layout_error(index, format!("{} elements overflow", count)))?;
        let mut data = vec![0u8; total];

        if let Some(view_index) = accessor.buffer_view {
            let (view, bytes) = self.view_bytes(view_index, index)?;
            let stride = view.byte_stride.unwrap_or(elem_size);
            if stride < elem_size {
                return Err(layout_error(index, format!("stride {} is smaller than element size {}", stride, elem_size)));
            }
            let required = required_bytes(accessor.byte_offset, stride, count, elem_size).unwrap_or(usize::MAX);
            if required > bytes.len() {
                return Err(LoadError::AccessorRange { accessor: index, required, available: bytes.len() });
            }
            for i in 0..count {
                let src = accessor.byte_offset + i * stride;
                let dst = i * elem_size;
                data[dst..dst + elem_size].copy_from_slice(&bytes[src..src + elem_size]);
            }
        }

        if let Some(sparse) = &accessor.sparse {
            let index_size = sparse.indices.component_type.size();
            let (_, index_bytes) = self.view_bytes(sparse.indices.buffer_view, index)?;
            let (_, value_bytes) = self.view_bytes(sparse.values.buffer_view, index)?;

            let indices_required = required_bytes(sparse.indices.byte_offset, index_size, sparse.count, index_size).unwrap_or(usize::MAX);
            if indices_required > index_bytes.len() {
                return Err(LoadError::AccessorRange { accessor: index, required: indices_required, available: index_bytes.len() });
            }
            let values_required = required_bytes(sparse.values.byte_offset, elem_size, sparse.count, elem_size).unwrap_or(usize::MAX);
            if values_required > value_bytes.len() {
                return Err(LoadError::AccessorRange { accessor: index, required: values_required, available: value_bytes.len() });
            }

            for i in 0..sparse.count {
                let at = sparse.indices.byte_offset + i * index_size;
                let target = component_to_u32(sparse.indices.component_type, &index_bytes[at..at + index_size])
                    .ok_or_else(|| layout_error(index, "sparse indices must be unsigned"))? as usize;
                if target >= count {
                    return Err(layout_error(index, format!("sparse index {} outside {} elements", target, count)));
                }
                let src = sparse.values.byte_offset + i * elem_size;
                let dst = target * elem_size;
                data[dst..dst + elem_size].copy_from_slice(&value_bytes[src..src + elem_size]);
            }
        }

        Ok((accessor, data))
    }

    /// Flattened components of every element, converted to f32, with matrix
    /// column padding dropped. Returns the component count per element
    /// alongside.
    pub fn read_floats(&self, index: usize) -> Result<(Vec<f32>, usize), LoadError> {
        let (accessor, data) = self.read_accessor_data(index)?;
        let size = accessor.component_type.size();
        let components = accessor.accessor_type.component_count();
        let column_stride = accessor.column_stride();
        let column_bytes = size * components / accessor.accessor_type.columns();

        let mut floats = Vec::with_capacity(accessor.count * components);
        for column in data.chunks_exact(column_stride) {
            floats.extend(
                column[..column_bytes]
                    .chunks_exact(size)
                    .map(|c| component_to_f32(accessor.component_type, accessor.normalized, c)),
            );
        }
        Ok((floats, components))
    }

    fn read_typed(&self, index: usize, expected: AccessorType) -> Result<Vec<f32>, LoadError> {
        let accessor = self.accessor(index)?;
        if accessor.accessor_type != expected {
            return Err(layout_error(
                index,
                format!("expected {:?} elements, found {:?}", expected, accessor.accessor_type),
            ));
        }
        Ok(self.read_floats(index)?.0)
    }

    pub fn read_f32s(&self, index: usize) -> Result<Vec<f32>, LoadError> {
        self.read_typed(index, AccessorType::Scalar)
    }

    pub fn read_vec2s(&self, index: usize) -> Result<Vec<Vec2>, LoadError> {
        Ok(self.read_typed(index, AccessorType::Vec2)?.chunks_exact(2).map(Vec2::from_slice).collect())
    }

    pub fn read_vec3s(&self, index: usize) -> Result<Vec<Vec3>, LoadError> {
        Ok(self.read_typed(index, AccessorType::Vec3)?.chunks_exact(3).map(Vec3::from_slice).collect())
    }

    pub fn read_vec4s(&self, index: usize) -> Result<Vec<Vec4>, LoadError> {
        Ok(self.read_typed(index, AccessorType::Vec4)?.chunks_exact(4).map(Vec4::from_slice).collect())
    }

    /// xyzw order
    pub fn read_quats(&self, index: usize) -> Result<Vec<Quat>, LoadError> {
        Ok(self.read_vec4s(index)?.into_iter().map(Quat::from_vec4).collect())
    }

    pub fn read_mat4s(&self, index: usize) -> Result<Vec<Mat4>, LoadError> {
        let accessor = self.accessor(index)?;
        if accessor.component_type != ComponentType::Float {
            return Err(layout_error(index, "matrices must be float"));
        }
        Ok(self.read_typed(index, AccessorType::Mat4)?.chunks_exact(16).map(Mat4::from_cols_slice).collect())
    }

    /// Widens u8/u16/u32 scalars to u32.
    pub fn read_indices(&self, index: usize) -> Result<Vec<u32>, LoadError> {
        let (accessor, data) = self.read_accessor_data(index)?;
        if accessor.accessor_type != AccessorType::Scalar {
            return Err(layout_error(index, "indices must be scalar"));
        }
        let size = accessor.component_type.size();
        data.chunks_exact(size)
            .map(|c| component_to_u32(accessor.component_type, c))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| layout_error(index, format!("{:?} is not an index type", accessor.component_type)))
    }

    /// JOINTS_n style data: VEC4 of u8 or u16.
    pub fn read_joint_indices(&self, index: usize) -> Result<Vec<[u16; 4]>, LoadError> {
        let (accessor, data) = self.read_accessor_data(index)?;
        if accessor.accessor_type != AccessorType::Vec4 {
            return Err(layout_error(index, "joint indices must be VEC4"));
        }
        let size = accessor.component_type.size();
        if !matches!(accessor.component_type, ComponentType::UnsignedByte | ComponentType::UnsignedShort) {
            return Err(layout_error(index, "joint indices must be u8 or u16"));
        }
        Ok(data
            .chunks_exact(size * 4)
            .map(|e| {
                let mut joints = [0u16; 4];
                for (j, c) in e.chunks_exact(size).enumerate() {
                    joints[j] = component_to_u32(accessor.component_type, c).unwrap_or(0) as u16;
                }
                joints
            })
            .collect())
    }
}
