//! Binary buffer packing with 4-byte alignment and accessor bookkeeping

use gltf_json as json;
use gltf_json::validation::Checked::Valid;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Buffer view index for data without an accessor (embedded images)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewIndex(pub u32);

impl ViewIndex {
    pub fn as_json_index(&self) -> json::Index<json::buffer::View> {
        json::Index::new(self.0)
    }
}

/// Packs vertex and image data into a single glTF buffer
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Pack Vec3 positions with min/max bounds on the accessor
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let offset = self.buffer.len();
        for pos in positions {
            self.buffer.extend_from_slice(bytemuck::cast_slice(pos));
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (positions.len() * 12).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ArrayBuffer)),
        });

        let (min, max) = bounds(positions);
        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: positions.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Vec3),
            min: Some(json::Value::Array(
                min.into_iter().map(json::Value::from).collect(),
            )),
            max: Some(json::Value::Array(
                max.into_iter().map(json::Value::from).collect(),
            )),
            name: None,
            normalized: false,
            sparse: None,
        });

        align(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack Vec3 data (normals)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        let offset = self.buffer.len();
        for item in data {
            self.buffer.extend_from_slice(bytemuck::cast_slice(item));
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (data.len() * 12).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ArrayBuffer)),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: data.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Vec3),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        });

        align(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack Vec2 data (texture coordinates)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        let offset = self.buffer.len();
        for item in data {
            self.buffer.extend_from_slice(bytemuck::cast_slice(item));
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (data.len() * 8).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ArrayBuffer)),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: data.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Vec2),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        });

        align(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack u32 triangle indices
    pub fn pack_indices_u32(&mut self, indices: &[u32]) -> AccessorIndex {
        let offset = self.buffer.len();
        for idx in indices {
            self.buffer.extend_from_slice(&idx.to_le_bytes());
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (indices.len() * 4).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ElementArrayBuffer)),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: indices.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::U32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Scalar),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        });

        align(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack raw bytes (encoded image data) as a view without an accessor
    pub fn pack_bytes(&mut self, data: &[u8]) -> ViewIndex {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(data);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: data.len().into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: None,
        });

        align(&mut self.buffer);
        ViewIndex(self.views.len() as u32 - 1)
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounding box over positions for the POSITION accessor
fn bounds(positions: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    (min.to_vec(), max.to_vec())
}

/// Pad to a 4-byte boundary
fn align(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_pack_with_bounds() {
        let mut builder = BufferBuilder::new();
        let idx = builder.pack_positions(&[[0.0, -1.0, 0.5], [2.0, 1.0, -0.5]]);

        assert_eq!(idx, AccessorIndex(0));
        assert_eq!(builder.data().len(), 24);

        let accessor = &builder.accessors()[0];
        assert!(accessor.min.is_some());
        assert!(accessor.max.is_some());
    }

    #[test]
    fn u32_indices_keep_alignment() {
        let mut builder = BufferBuilder::new();
        builder.pack_indices_u32(&[0, 1, 2]);
        assert_eq!(builder.data().len() % 4, 0);
        assert_eq!(builder.data().len(), 12);
    }

    #[test]
    fn image_bytes_get_a_view_and_padding() {
        let mut builder = BufferBuilder::new();
        let view = builder.pack_bytes(&[1, 2, 3, 4, 5]);
        assert_eq!(view, ViewIndex(0));
        assert_eq!(builder.data().len(), 8);
        assert_eq!(builder.accessors().len(), 0);
    }
}
