// ============================================================================
// GPU COMPOSITOR — wgpu implementation of the effect chain
// ============================================================================
//
// Frame layout:
//
//   scene pass  -> target A          (source image letterboxed over background)
//   effect 1    -> A read, B written
//   effect 2    -> B read, A written
//   ...
//   blit        -> output (Rgba8Unorm, readable)
//
// The two ping-pong targets are float textures recycled through the pool
// when the viewport size changes.  Every effect pass owns its render pipeline
// and uniform buffer; bind groups are rebuilt per frame because the chain
// input alternates between the two targets.
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use uuid::Uuid;

use super::context::GpuContext;
use super::pool::TexturePool;
use super::shaders;
use super::texture::{CHAIN_FORMAT, OUTPUT_FORMAT, RenderTarget, SourceTexture};
use crate::compositor::{Compositor, Scene};
use crate::effects::{EffectDescriptor, ImageHandle, ParamRole, ParamSet};
use crate::error::{PipelineError, Result};
use crate::{log_info, log_warn};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniforms {
    rect: [f32; 4],
    background: [f32; 4],
    flags: [f32; 4],
}

/// Compiled state of one effect pass.
pub struct EffectPipeline {
    pub effect: &'static EffectDescriptor,
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    slots: usize,
}

/// Handle to one step of the GPU chain.
#[derive(Clone)]
pub enum GpuPass {
    Scene,
    Effect(Arc<EffectPipeline>),
}

impl std::fmt::Debug for GpuPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuPass::Scene => f.write_str("Scene"),
            GpuPass::Effect(p) => write!(f, "Effect({})", p.effect.id),
        }
    }
}

pub struct GpuCompositor {
    ctx: GpuContext,
    effect_bgl: wgpu::BindGroupLayout,
    effect_layout: wgpu::PipelineLayout,
    scene_bgl: wgpu::BindGroupLayout,
    scene_pipeline: wgpu::RenderPipeline,
    scene_uniforms: wgpu::Buffer,
    blit_bgl: wgpu::BindGroupLayout,
    blit_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,

    chain: Vec<GpuPass>,
    /// Size requested by the controller.
    requested: (u32, u32),
    targets: Option<[RenderTarget; 2]>,
    output: Option<RenderTarget>,
    pool: TexturePool<RenderTarget>,

    /// Uploaded images by handle id.  Entries not referenced by the current
    /// frame are dropped, which frees the previous image's texture.
    sources: HashMap<Uuid, SourceTexture>,
    placeholder: SourceTexture,
    staging: Option<(wgpu::Buffer, u64)>,
    rendered: bool,
}

impl GpuCompositor {
    /// Create a headless compositor on a fresh device.
    pub fn headless(preferred_gpu: &str) -> Result<Self> {
        Ok(Self::new(GpuContext::new(preferred_gpu)?))
    }

    pub fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        // ---- Effect passes: chain input, sampler, params, input image ----
        let effect_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("effect_bgl"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2), texture_entry(3)],
        });
        let effect_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("effect_pipeline_layout"),
            bind_group_layouts: &[&effect_bgl],
            push_constant_ranges: &[],
        });

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fullscreen_vertex"),
            source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_VERTEX.into()),
        });

        // ---- Scene pass ----
        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });
        let scene_fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_fragment"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_FRAGMENT.into()),
        });
        let scene_pipeline = fullscreen_pipeline(device, "scene_pipeline", &scene_bgl, &vertex, &scene_fragment, CHAIN_FORMAT);
        let scene_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ---- Final blit ----
        let blit_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let blit_fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_fragment"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_FRAGMENT.into()),
        });
        let blit_pipeline = fullscreen_pipeline(device, "blit_pipeline", &blit_bgl, &vertex, &blit_fragment, OUTPUT_FORMAT);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler_linear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let placeholder = SourceTexture::solid(device, &ctx.queue, [0, 0, 0, 255]);

        Self {
            effect_bgl,
            effect_layout,
            scene_bgl,
            scene_pipeline,
            scene_uniforms,
            blit_bgl,
            blit_pipeline,
            sampler,
            chain: Vec::new(),
            requested: (1, 1),
            targets: None,
            output: None,
            pool: TexturePool::default(),
            sources: HashMap::new(),
            placeholder,
            staging: None,
            rendered: false,
            ctx,
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    /// Size the chain actually renders at (the requested size clamped to the
    /// device limits).
    pub fn render_size(&self) -> (u32, u32) {
        self.ctx.clamp_size(self.requested.0, self.requested.1)
    }

    fn ensure_targets(&mut self) {
        let (w, h) = self.render_size();
        if let Some([a, _]) = &self.targets
            && a.width == w
            && a.height == h
        {
            return;
        }
        if let Some([a, b]) = self.targets.take() {
            let (ow, oh) = (a.width, a.height);
            self.pool.release(a, ow, oh);
            self.pool.release(b, ow, oh);
        }
        let device = &self.ctx.device;
        let mut take = |label: &str| {
            self.pool
                .acquire(w, h)
                .unwrap_or_else(|| RenderTarget::new(device, w, h, CHAIN_FORMAT, label))
        };
        let a = take("chain_target_a");
        let b = take("chain_target_b");
        self.targets = Some([a, b]);
        self.output = Some(RenderTarget::new(device, w, h, OUTPUT_FORMAT, "chain_output"));
        self.rendered = false;
    }

    /// Upload every image the frame needs and drop the ones it no longer does.
    fn sync_sources(&mut self, scene: &Scene, params: &[&ParamSet]) {
        let wanted: Vec<&ImageHandle> = scene.image.iter().chain(params.iter().filter_map(|p| p.input_image())).collect();

        self.sources.retain(|id, _| wanted.iter().any(|h| h.id() == *id));
        for handle in wanted {
            if self.sources.contains_key(&handle.id()) {
                continue;
            }
            let max = self.ctx.max_texture_dim;
            let texture = if handle.width() > max || handle.height() > max {
                log_warn!("GPU: input {}x{} exceeds device limit {}, downscaling", handle.width(), handle.height(), max);
                let (w, h) = fit_within(handle.width(), handle.height(), max);
                let scaled = image::imageops::resize(handle.pixels(), w, h, image::imageops::FilterType::Triangle);
                SourceTexture::upload(&self.ctx.device, &self.ctx.queue, &scaled)
            } else {
                SourceTexture::upload(&self.ctx.device, &self.ctx.queue, handle.pixels())
            };
            self.sources.insert(handle.id(), texture);
        }
    }

    fn source_view(&self, handle: Option<&ImageHandle>) -> &wgpu::TextureView {
        handle
            .and_then(|h| self.sources.get(&h.id()))
            .map(|t| &t.view)
            .unwrap_or(&self.placeholder.view)
    }

    /// Copy the output target into CPU memory as tightly packed RGBA rows.
    fn readback(&mut self) -> Result<RgbaImage> {
        let Some(output) = &self.output else {
            return Err(PipelineError::Readback("no output target".into()));
        };
        let (width, height) = (output.width, output.height);
        let device = &self.ctx.device;

        let bytes_per_row = aligned_bytes_per_row(width);
        let buffer_size = (bytes_per_row * height) as u64;

        let need_new = !matches!(&self.staging, Some((_, sz)) if *sz >= buffer_size);
        if need_new {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback_staging"),
                size: buffer_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.staging = Some((buffer, buffer_size));
        }
        let Some((staging, _)) = &self.staging else {
            return Err(PipelineError::Readback("staging buffer missing".into()));
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.ctx.submit_one(encoder);

        let slice = staging.slice(..buffer_size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PipelineError::Readback(format!("map failed: {:?}", e))),
            Err(e) => return Err(PipelineError::Readback(format!("map callback dropped: {}", e))),
        }

        let pixels = {
            let mapped = slice.get_mapped_range();
            unpad_rows(&mapped, width, height, bytes_per_row)
        };
        staging.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| PipelineError::Readback("readback size mismatch".into()))
    }
}

impl Compositor for GpuCompositor {
    type Pass = GpuPass;

    fn scene_pass(&mut self) -> GpuPass {
        GpuPass::Scene
    }

    fn effect_pass(&mut self, effect: &'static EffectDescriptor) -> Result<GpuPass> {
        let device = &self.ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(effect.label),
            source: wgpu::ShaderSource::Wgsl(effect.vertex.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(effect.label),
            source: wgpu::ShaderSource::Wgsl(effect.fragment.into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(effect.label),
            layout: Some(&self.effect_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: CHAIN_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PipelineError::ShaderCompile { effect: effect.id.as_str(), message: err.to_string() });
        }

        let slots = uniform_slot_count(effect);
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(effect.label),
            size: (slots * std::mem::size_of::<[f32; 4]>()) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log_info!("GPU: compiled '{}' ({} uniform slot(s))", effect.id, slots);
        Ok(GpuPass::Effect(Arc::new(EffectPipeline { effect, pipeline, uniforms, slots })))
    }

    fn set_passes(&mut self, passes: Vec<GpuPass>) {
        self.chain = passes;
        self.rendered = false;
    }

    fn pass_count(&self) -> usize {
        self.chain.len()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.requested = (width, height);
    }

    fn execute(&mut self, scene: &Scene, params: &[&ParamSet]) {
        self.ensure_targets();
        self.sync_sources(scene, params);

        let effects: Vec<Arc<EffectPipeline>> = self
            .chain
            .iter()
            .filter_map(|p| match p {
                GpuPass::Effect(e) => Some(e.clone()),
                GpuPass::Scene => None,
            })
            .collect();
        if effects.len() != params.len() {
            log_warn!("GPU: {} effect passes but {} parameter sets", effects.len(), params.len());
        }

        let Some(targets) = &self.targets else { return };
        let Some(output) = &self.output else { return };
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let image_size = scene.image.as_ref().map(|i| (i.width(), i.height()));
        let uniforms = SceneUniforms {
            rect: image_size.map_or([0.0, 0.0, 1.0, 1.0], |img| letterbox(img, (targets[0].width, targets[0].height))),
            background: scene.background_rgba(),
            flags: [if image_size.is_some() { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.scene_uniforms, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("chain_encoder"),
        });

        // ---- Scene ----
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &self.scene_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(self.source_view(scene.image.as_ref())) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: self.scene_uniforms.as_entire_binding() },
            ],
        });
        draw_fullscreen(&mut encoder, "scene_pass", &targets[0].view, &self.scene_pipeline, &scene_bg);

        // ---- Effects ----
        let mut current = 0;
        for (effect, set) in effects.iter().zip(params.iter()) {
            let mut slots = set.uniform_slots();
            slots.resize(effect.slots, [0.0; 4]);
            queue.write_buffer(&effect.uniforms, 0, bytemuck::cast_slice(&slots));

            let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(effect.effect.label),
                layout: &self.effect_bgl,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&targets[current].view) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                    wgpu::BindGroupEntry { binding: 2, resource: effect.uniforms.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(self.source_view(set.input_image())) },
                ],
            });
            draw_fullscreen(&mut encoder, effect.effect.label, &targets[1 - current].view, &effect.pipeline, &bg);
            current = 1 - current;
        }

        // ---- Blit to the readable output ----
        let blit_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bg"),
            layout: &self.blit_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&targets[current].view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
            ],
        });
        draw_fullscreen(&mut encoder, "blit_pass", &output.view, &self.blit_pipeline, &blit_bg);

        queue.submit(std::iter::once(encoder.finish()));
        self.rendered = true;
    }

    fn read_frame(&mut self) -> Result<RgbaImage> {
        if !self.rendered {
            return Err(PipelineError::Readback("no frame rendered yet".into()));
        }
        self.readback()
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    bgl: &wgpu::BindGroupLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: "vs_main",
            buffers: &[],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState { format, blend: None, write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        multiview: None,
    })
}

fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

/// Uniform slots an effect needs: one per numeric parameter, at least one.
fn uniform_slot_count(effect: &EffectDescriptor) -> usize {
    effect
        .params
        .iter()
        .filter(|p| matches!(p.role, ParamRole::Tunable | ParamRole::ViewportSize))
        .count()
        .max(1)
}

/// Image area inside the viewport, in uv space `(x0, y0, x1, y1)`: the image
/// is scaled to fit entirely and centred.
pub fn letterbox(image: (u32, u32), viewport: (u32, u32)) -> [f32; 4] {
    let (iw, ih) = (image.0.max(1) as f32, image.1.max(1) as f32);
    let (vw, vh) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
    let scale = (vw / iw).min(vh / ih);
    let (w, h) = (iw * scale / vw, ih * scale / vh);
    let (x0, y0) = ((1.0 - w) * 0.5, (1.0 - h) * 0.5);
    [x0, y0, x0 + w, y0 + h]
}

/// Largest size with the same aspect whose sides are at most `max`.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = max as f64 / width.max(height) as f64;
    (
        ((width as f64 * scale).round() as u32).clamp(1, max),
        ((height as f64 * scale).round() as u32).clamp(1, max),
    )
}

pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Strip the per-row padding wgpu requires for buffer copies.
fn unpad_rows(padded: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let actual_row = width as usize * 4;
    let mut out = Vec::with_capacity(actual_row * height as usize);
    for y in 0..height as usize {
        let start = y * bytes_per_row as usize;
        out.extend_from_slice(&padded[start..start + actual_row]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::catalog::{ANISOTROPIC_KUWAHARA, GAMMA, STRUCTURE_TENSOR};

    #[test]
    fn letterbox_contains_and_centres() {
        // Wide image in a square viewport: full width, centred band.
        let r = letterbox((200, 100), (100, 100));
        assert_eq!(r, [0.0, 0.25, 1.0, 0.75]);
        // Same aspect: fills the viewport.
        assert_eq!(letterbox((640, 480), (320, 240)), [0.0, 0.0, 1.0, 1.0]);
        // Tall image.
        let r = letterbox((100, 400), (200, 200));
        assert!((r[0] - 0.375).abs() < 1e-6 && (r[2] - 0.625).abs() < 1e-6);
    }

    #[test]
    fn rows_are_aligned_to_256_bytes() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
    }

    #[test]
    fn unpad_drops_row_padding() {
        let mut padded = vec![0u8; 512];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(unpad_rows(&padded, 2, 2, 256), (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn slot_counts_follow_numeric_parameters() {
        assert_eq!(uniform_slot_count(&GAMMA), 1);
        assert_eq!(uniform_slot_count(&STRUCTURE_TENSOR), 1);
        assert_eq!(uniform_slot_count(&ANISOTROPIC_KUWAHARA), 5);
    }

    #[test]
    fn oversized_inputs_keep_their_aspect() {
        assert_eq!(fit_within(100, 50, 200), (100, 50));
        assert_eq!(fit_within(8000, 4000, 2048), (2048, 1024));
        assert_eq!(fit_within(10, 10000, 100), (1, 100));
    }
}
