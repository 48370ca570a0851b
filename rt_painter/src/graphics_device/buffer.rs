/// Buffer trait and buffer descriptor

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::IndexType;

/// What the buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Vertex stream source
    Vertex,
    /// Index buffer with its element type
    Index(IndexType),
    /// Uniform/constant buffer
    Uniform,
}

/// Buffer lifetime class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Valid for one submission only, CPU-writable (lock-copy-unlock)
    Volatile,
    /// Contents supplied at creation, immutable afterwards
    Static,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Binding type
    pub buffer_type: BufferType,
    /// Lifetime class
    pub usage: BufferUsage,
    /// Contents written at creation; required for `Static`, length must equal `size`
    pub initial_data: Option<Vec<u8>>,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types.
/// The buffer is released when the last reference is dropped.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    fn buffer_type(&self) -> BufferType;

    fn usage(&self) -> BufferUsage;

    /// Lock the range, copy `data` in, unlock
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` for `Static` buffers or out-of-range writes.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Copy `len` bytes starting at `offset` back to the CPU
    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;
}
