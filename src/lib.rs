//! ShaderFX: image-effect pipelines on the GPU.
//!
//! A [`PipelineController`](controller::PipelineController) builds a chain of
//! full-screen effect passes from a [`Registry`](pipelines::Registry) of
//! pipeline descriptors, keeps each pass's parameters in sync with the
//! viewport size and input image, and exposes the tunables through a
//! retained [`ControlPanel`](panel::ControlPanel).  Rendering goes through
//! the [`Compositor`](compositor::Compositor) trait; the wgpu implementation
//! lives in [`gpu`].
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

#[macro_use]
pub mod logger;

pub mod app;
pub mod cli;
pub mod components;
pub mod compositor;
pub mod controller;
pub mod effects;
pub mod error;
pub mod export;
pub mod gpu;
pub mod io;
pub mod panel;
pub mod pipelines;
pub mod scheduler;
pub mod settings;

pub use controller::{LivePass, PipelineController};
pub use error::{PipelineError, Result};
