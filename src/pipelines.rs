// ============================================================================
// PIPELINES — named effect chains and the registry that resolves them
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::effects::EffectDescriptor;
use crate::effects::catalog::*;
use crate::error::{PipelineError, Result};

/// Identity of a built-in pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineId {
    AnisotropicKuwahara,
    LensSwirl,
    Ryuukishi,
    Dreamy,
    Painterly,
}

impl PipelineId {
    pub const ALL: [PipelineId; 5] = [
        PipelineId::AnisotropicKuwahara,
        PipelineId::LensSwirl,
        PipelineId::Ryuukishi,
        PipelineId::Dreamy,
        PipelineId::Painterly,
    ];

    /// Pipeline shown when the application starts.
    pub const DEFAULT: PipelineId = PipelineId::AnisotropicKuwahara;

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineId::AnisotropicKuwahara => "anisotropicKuwahara",
            PipelineId::LensSwirl => "lensSwirl",
            PipelineId::Ryuukishi => "ryuukishi",
            PipelineId::Dreamy => "dreamy",
            PipelineId::Painterly => "painterly",
        }
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        PipelineId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownPipeline(s.to_string()))
    }
}

/// Ordered list of effects plus identity and label.  Effects run in list
/// order; the same effect may appear more than once.
#[derive(Debug)]
pub struct PipelineDescriptor {
    pub id: PipelineId,
    pub label: &'static str,
    pub effects: &'static [&'static EffectDescriptor],
}

pub static ANISOTROPIC_KUWAHARA_PIPELINE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::AnisotropicKuwahara,
    label: "Anisotropic Kuwahara",
    effects: &[
        &STRUCTURE_TENSOR,
        &GAUSSIAN_BLUR_X,
        &GAUSSIAN_BLUR_Y,
        &ANISOTROPIC_KUWAHARA,
        &GAMMA,
    ],
};

pub static LENS_SWIRL_PIPELINE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::LensSwirl,
    label: "Lens Swirl",
    effects: &[&RADIAL_CHROMATIC_ABERRATION, &GAMMA],
};

pub static RYUUKISHI_PIPELINE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Ryuukishi,
    label: "Ryuukishi",
    effects: &[&LEVELS, &SHARPEN],
};

pub static DREAMY_PIPELINE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Dreamy,
    label: "Dreamy",
    effects: &[&ZOOM_BLUR, &RADIAL_BLUR, &VIGNETTE, &GAMMA],
};

pub static PAINTERLY_PIPELINE: PipelineDescriptor = PipelineDescriptor {
    id: PipelineId::Painterly,
    label: "Painterly",
    effects: &[&MOTION_BLUR, &POSTERIZE, &EDGE_BOOST],
};

/// Closed mapping from pipeline identity to descriptor.
///
/// Built once at startup and read-only afterwards.  Entries are keyed by the
/// descriptor's own identity, so a key can never disagree with its value.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<&'static PipelineDescriptor>,
}

impl Registry {
    /// Registry holding every built-in pipeline, in `PipelineId::ALL` order.
    pub fn builtin() -> Self {
        Self::from_descriptors([
            &ANISOTROPIC_KUWAHARA_PIPELINE,
            &LENS_SWIRL_PIPELINE,
            &RYUUKISHI_PIPELINE,
            &DREAMY_PIPELINE,
            &PAINTERLY_PIPELINE,
        ])
    }

    /// Build a registry from descriptors, keeping registration order.
    ///
    /// # Panics
    /// If two descriptors share an identity.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = &'static PipelineDescriptor>) -> Self {
        let mut entries: Vec<&'static PipelineDescriptor> = Vec::new();
        for d in descriptors {
            assert!(
                !entries.iter().any(|e| e.id == d.id),
                "pipeline '{}' registered twice",
                d.id
            );
            entries.push(d);
        }
        Self { entries }
    }

    pub fn get(&self, id: PipelineId) -> Result<&'static PipelineDescriptor> {
        self.entries
            .iter()
            .copied()
            .find(|d| d.id == id)
            .ok_or_else(|| PipelineError::UnknownPipeline(id.as_str().to_string()))
    }

    /// Resolve a string key (e.g. from the command line).
    pub fn get_by_key(&self, key: &str) -> Result<&'static PipelineDescriptor> {
        self.get(key.parse()?)
    }

    /// Every descriptor in registration order.
    pub fn list(&self) -> &[&'static PipelineDescriptor] {
        &self.entries
    }

    pub fn contains(&self, id: PipelineId) -> bool {
        self.entries.iter().any(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
