/// Texture - CPU implementation of the Texture trait

use rt_painter::rtp::{
    Result,
    Error,
    render::{Texture, TextureDesc, TextureFormat, TextureInfo, ResourceAccess},
};
use std::any::Any;
use std::sync::Mutex;

/// RGBA texel in linear f32
pub type Texel = [f32; 4];

/// CPU texture, stored as linear RGBA f32 whatever the format
///
/// The format only matters on readback.
pub struct SoftTexture {
    info: TextureInfo,
    texels: Mutex<Vec<Texel>>,
    access: Mutex<ResourceAccess>,
}

impl SoftTexture {
    pub(crate) fn new(desc: &TextureDesc) -> Self {
        let count = desc.width as usize * desc.height as usize;
        Self {
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
            texels: Mutex::new(vec![[0.0; 4]; count]),
            access: Mutex::new(desc.initial_access),
        }
    }

    pub fn texel_count(&self) -> usize {
        self.info.width as usize * self.info.height as usize
    }

    /// Access state the device last transitioned this texture to
    pub fn access(&self) -> ResourceAccess {
        match self.access.lock() {
            Ok(access) => *access,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub(crate) fn set_access(&self, access: ResourceAccess) {
        match self.access.lock() {
            Ok(mut guard) => *guard = access,
            Err(poisoned) => *poisoned.into_inner() = access,
        }
    }

    /// Copy of every texel, row-major from the top-left corner
    pub fn texels(&self) -> Result<Vec<Texel>> {
        let texels = self.texels.lock()
            .map_err(|_| Error::BackendError("SoftTexture texel lock poisoned".to_string()))?;
        Ok(texels.clone())
    }

    pub(crate) fn store(&self, texels: Vec<Texel>) -> Result<()> {
        if texels.len() != self.texel_count() {
            return Err(Error::InvalidResource(format!(
                "SoftTexture::store: {} texels for a {}x{} texture",
                texels.len(), self.info.width, self.info.height
            )));
        }
        let mut guard = self.texels.lock()
            .map_err(|_| Error::BackendError("SoftTexture texel lock poisoned".to_string()))?;
        *guard = texels;
        Ok(())
    }

    /// Texels encoded in the texture format
    pub fn encode(&self) -> Result<Vec<u8>> {
        let texels = self.texels()?;
        Ok(encode_texels(&texels, self.info.format))
    }
}

impl Texture for SoftTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Encode linear texels as `format` bytes
pub fn encode_texels(texels: &[Texel], format: TextureFormat) -> Vec<u8> {
    match format {
        TextureFormat::R8G8B8A8_UNORM => texels
            .iter()
            .flat_map(|[r, g, b, a]| [unorm8(*r), unorm8(*g), unorm8(*b), unorm8(*a)])
            .collect(),
        TextureFormat::B8G8R8A8_UNORM => texels
            .iter()
            .flat_map(|[r, g, b, a]| [unorm8(*b), unorm8(*g), unorm8(*r), unorm8(*a)])
            .collect(),
        TextureFormat::R32G32B32A32_SFLOAT => bytemuck::cast_slice(texels).to_vec(),
    }
}
