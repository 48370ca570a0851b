/// GPU buffer factory for vertex and index data
///
/// Every buffer is written in one lock-copy-unlock step whose range is the
/// whole allocation, so a buffer is never left partially written.

use std::sync::Arc;
use glam::Vec4;

use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, BufferType, BufferUsage, IndexType,
};
use crate::resource::TexturedVertex;

/// Stateless buffer factory
pub struct ResourceFactory;

impl ResourceFactory {
    /// Create a volatile vertex buffer holding `vertices` in order
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` if `vertices` is empty
    /// - `Error::OutOfMemory` if the device cannot satisfy the allocation
    pub fn create_vertex_buffer(
        device: &mut dyn GraphicsDevice,
        vertices: &[Vec4],
    ) -> Result<Arc<dyn Buffer>> {
        if vertices.is_empty() {
            return Err(Self::rejected("create_vertex_buffer: empty vertex input"));
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        Self::create_and_fill(device, bytes, BufferType::Vertex, BufferUsage::Volatile)
    }

    /// Create a static vertex buffer of position+UV records
    ///
    /// Contents are supplied at creation, no lock is taken afterwards.
    pub fn create_textured_vertex_buffer(
        device: &mut dyn GraphicsDevice,
        vertices: &[TexturedVertex],
    ) -> Result<Arc<dyn Buffer>> {
        if vertices.is_empty() {
            return Err(Self::rejected("create_textured_vertex_buffer: empty vertex input"));
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        device.create_buffer(BufferDesc {
            size: bytes.len() as u64,
            buffer_type: BufferType::Vertex,
            usage: BufferUsage::Static,
            initial_data: Some(bytes.to_vec()),
        })
    }

    /// Create a 16-bit index buffer for a triangle list
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` unless the count is a non-zero multiple of 3
    ///   (nothing is allocated in that case)
    /// - `Error::OutOfMemory` if the device cannot satisfy the allocation
    pub fn create_index_buffer(
        device: &mut dyn GraphicsDevice,
        indices: &[u16],
        usage: BufferUsage,
    ) -> Result<Arc<dyn Buffer>> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(Self::rejected(&format!(
                "create_index_buffer: index count {} is not a non-zero multiple of 3",
                indices.len()
            )));
        }
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer_type = BufferType::Index(IndexType::U16);
        match usage {
            BufferUsage::Volatile => Self::create_and_fill(device, bytes, buffer_type, usage),
            BufferUsage::Static => device.create_buffer(BufferDesc {
                size: bytes.len() as u64,
                buffer_type,
                usage,
                initial_data: Some(bytes.to_vec()),
            }),
        }
    }

    fn create_and_fill(
        device: &mut dyn GraphicsDevice,
        bytes: &[u8],
        buffer_type: BufferType,
        usage: BufferUsage,
    ) -> Result<Arc<dyn Buffer>> {
        let buffer = device
            .create_buffer(BufferDesc {
                size: bytes.len() as u64,
                buffer_type,
                usage,
                initial_data: None,
            })
            .map_err(|e| {
                crate::engine_error!("rtp::ResourceFactory",
                    "{:?} buffer allocation of {} bytes failed: {}", buffer_type, bytes.len(), e);
                e
            })?;

        debug_assert_eq!(buffer.size(), bytes.len() as u64);
        buffer.update(0, bytes)?;
        Ok(buffer)
    }

    fn rejected(message: &str) -> Error {
        crate::engine_error!("rtp::ResourceFactory", "{}", message);
        Error::InvalidResource(message.to_string())
    }
}

#[cfg(test)]
#[path = "resource_factory_tests.rs"]
mod tests;
