/// Buffer - CPU implementation of the Buffer trait

use rt_painter::rtp::{
    Result,
    Error,
    render::{Buffer, BufferDesc, BufferType, BufferUsage},
};
use std::any::Any;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// CPU buffer
///
/// The byte size is charged to the owning device budget until drop.
pub struct SoftBuffer {
    size: u64,
    buffer_type: BufferType,
    usage: BufferUsage,
    data: Mutex<Vec<u8>>,
    /// Volatile buffers are retired once a submission referenced them
    retired: AtomicBool,
    budget: Arc<AtomicU64>,
}

impl SoftBuffer {
    /// Allocate `desc.size` bytes, already charged to `budget` by the caller
    pub(crate) fn new(desc: BufferDesc, budget: Arc<AtomicU64>) -> Self {
        let data = desc.initial_data.unwrap_or_else(|| vec![0; desc.size as usize]);
        Self {
            size: desc.size,
            buffer_type: desc.buffer_type,
            usage: desc.usage,
            data: Mutex::new(data),
            retired: AtomicBool::new(false),
            budget,
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub(crate) fn retire(&self) {
        if self.usage == BufferUsage::Volatile {
            self.retired.store(true, Ordering::SeqCst);
        }
    }

    fn check_range(&self, offset: u64, len: u64, operation: &str) -> Result<()> {
        let end = offset.checked_add(len).unwrap_or(u64::MAX);
        if end > self.size {
            return Err(Error::InvalidResource(format!(
                "SoftBuffer::{}: range {}..{} exceeds size {}",
                operation, offset, end, self.size
            )));
        }
        Ok(())
    }

    /// Run `f` over the whole contents
    pub(crate) fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let data = self.data.lock()
            .map_err(|_| Error::BackendError("SoftBuffer data lock poisoned".to_string()))?;
        Ok(f(&data))
    }
}

impl Buffer for SoftBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.usage == BufferUsage::Static {
            return Err(Error::InvalidResource("SoftBuffer::update: static buffer is immutable".to_string()));
        }
        if self.is_retired() {
            return Err(Error::BackendError("SoftBuffer::update: volatile buffer already submitted".to_string()));
        }
        self.check_range(offset, data.len() as u64, "update")?;

        let mut bytes = self.data.lock()
            .map_err(|_| Error::BackendError("SoftBuffer data lock poisoned".to_string()))?;
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        self.check_range(offset, len, "read")?;
        let start = offset as usize;
        self.with_bytes(|bytes| bytes[start..start + len as usize].to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for SoftBuffer {
    fn drop(&mut self) {
        self.budget.fetch_sub(self.size, Ordering::SeqCst);
    }
}
