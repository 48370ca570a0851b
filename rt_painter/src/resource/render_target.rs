/// Externally owned render target texture

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{Texture, TextureFormat, ResourceAccess, RenderTargetsInfo};

/// Texture the pipeline draws into, plus the access state the core tracks for it
///
/// The core never creates or destroys the underlying texture. The tracked
/// access is only changed on the render thread, by recorded transitions.
pub struct RenderTargetResource {
    name: String,
    texture: Arc<dyn Texture>,
    access: Mutex<ResourceAccess>,
}

impl RenderTargetResource {
    /// Wrap `texture`, whose current access state is `access`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the texture cannot be bound as a render target.
    pub fn new(name: &str, texture: Arc<dyn Texture>, access: ResourceAccess) -> Result<Self> {
        if !texture.info().usage.is_render_target() {
            return Err(Error::InvalidResource(format!(
                "RenderTarget '{}': texture usage {:?} is not render-target capable",
                name,
                texture.info().usage
            )));
        }
        Ok(Self {
            name: name.to_string(),
            texture,
            access: Mutex::new(access),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn size_x(&self) -> u32 {
        self.texture.info().width
    }

    pub fn size_y(&self) -> u32 {
        self.texture.info().height
    }

    pub fn format(&self) -> TextureFormat {
        self.texture.info().format
    }

    /// Attachment configuration of this target
    pub fn render_targets_info(&self) -> RenderTargetsInfo {
        RenderTargetsInfo::single(self.format())
    }

    /// Access state after the last recorded transition
    pub fn current_access(&self) -> ResourceAccess {
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
}

impl std::fmt::Debug for RenderTargetResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTargetResource")
            .field("name", &self.name)
            .field("info", self.texture.info())
            .field("access", &self.current_access())
            .finish()
    }
}
