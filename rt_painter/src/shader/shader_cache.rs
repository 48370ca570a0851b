/// Read-only lookup of compiled shader stages keyed by capability tier

use std::sync::Arc;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{Shader, ShaderStage};

/// Coarse classifier of GPU feature support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityTier {
    /// Mobile / ES 3.1 class
    Es31,
    /// Shader model 5 class
    Sm5,
    /// Shader model 6 class
    Sm6,
}

/// Vertex + fragment stages bound together by one draw
#[derive(Clone)]
pub struct ShaderStagePair {
    pub vertex: Arc<dyn Shader>,
    pub fragment: Arc<dyn Shader>,
}

impl ShaderStagePair {
    /// Pair two stages, checking each sits in its own slot
    pub fn new(vertex: Arc<dyn Shader>, fragment: Arc<dyn Shader>) -> Result<Self> {
        if vertex.stage() != ShaderStage::Vertex {
            return Err(Error::InvalidResource(format!(
                "ShaderStagePair: '{}' bound as vertex stage is a {:?} shader",
                vertex.source_name(),
                vertex.stage()
            )));
        }
        if fragment.stage() != ShaderStage::Fragment {
            return Err(Error::InvalidResource(format!(
                "ShaderStagePair: '{}' bound as fragment stage is a {:?} shader",
                fragment.source_name(),
                fragment.stage()
            )));
        }
        Ok(Self { vertex, fragment })
    }
}

impl std::fmt::Debug for ShaderStagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderStagePair")
            .field("vertex", &self.vertex.source_name())
            .field("fragment", &self.fragment.source_name())
            .finish()
    }
}

/// Shader stage pairs per capability tier
///
/// Filled once at startup, then shared behind an `Arc` and never mutated.
#[derive(Default)]
pub struct ShaderCache {
    stages: FxHashMap<CapabilityTier, ShaderStagePair>,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self { stages: FxHashMap::default() }
    }

    /// Register the stages compiled for `tier`
    ///
    /// # Errors
    ///
    /// Returns an error if the tier is already registered.
    pub fn insert(&mut self, tier: CapabilityTier, stages: ShaderStagePair) -> Result<()> {
        if self.stages.contains_key(&tier) {
            return Err(Error::InitializationFailed(format!(
                "ShaderCache: tier {:?} already registered",
                tier
            )));
        }
        self.stages.insert(tier, stages);
        Ok(())
    }

    /// Resolve the stages for `tier`
    pub fn get(&self, tier: CapabilityTier) -> Result<&ShaderStagePair> {
        self.stages.get(&tier).ok_or_else(|| {
            Error::InvalidResource(format!("ShaderCache: no shaders compiled for tier {:?}", tier))
        })
    }

    pub fn contains(&self, tier: CapabilityTier) -> bool {
        self.stages.contains_key(&tier)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Registered tiers, ascending
    pub fn tiers(&self) -> Vec<CapabilityTier> {
        let mut tiers: Vec<CapabilityTier> = self.stages.keys().copied().collect();
        tiers.sort();
        tiers
    }
}

#[cfg(test)]
#[path = "shader_cache_tests.rs"]
mod tests;
