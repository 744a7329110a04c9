// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================
//
// Every effect fragment shares one bind group (group 0):
//   binding 0  t_diffuse  previous pass output
//   binding 1  samp       linear clamp sampler
//   binding 2  params     uniform `Params`, one vec4 per numeric parameter
//   binding 3  input_tex  untouched input image (1x1 placeholder when absent)
//
// `Params` fields follow the parameter order in `effects::catalog`; scalars
// live in `.x`, sizes in `.xy`.  All sampling uses `textureSampleLevel` so it
// is legal inside loops and branches.
// ============================================================================

/// Wraps an effect body with the shared bindings and sampling helpers.
macro_rules! effect_fragment {
    ($params:literal, $body:literal) => {
        concat!(
            "struct Params {\n",
            $params,
            "};\n",
            r#"
@group(0) @binding(0) var t_diffuse: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;
@group(0) @binding(2) var<uniform> params: Params;
@group(0) @binding(3) var input_tex: texture_2d<f32>;

struct FragmentInput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

fn sample_chain(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(t_diffuse, samp, uv, 0.0);
}

fn sample_input(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(input_tex, samp, uv, 0.0);
}

fn chain_texel() -> vec2<f32> {
    return 1.0 / vec2<f32>(textureDimensions(t_diffuse));
}

fn luma(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.299, 0.587, 0.114));
}
"#,
            $body
        )
    };
}

// ============================================================================
// FULL-SCREEN VERTEX — one oversized triangle, uv (0,0) at the top left
// ============================================================================
pub const FULLSCREEN_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOutput {
    let x = f32((vi << 1u) & 2u);
    let y = f32(vi & 2u);
    var out: VertexOutput;
    out.position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}
"#;

// ============================================================================
// SCENE — source image letterboxed into the viewport over the background
// ============================================================================
//
// `rect` is the image area in uv space (x0, y0, x1, y1).  `flags.x` is 1.0
// when an image is bound.
pub const SCENE_FRAGMENT: &str = r#"
struct SceneUniforms {
    rect: vec4<f32>,
    background: vec4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0) var image_tex: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;
@group(0) @binding(2) var<uniform> scene: SceneUniforms;

struct FragmentInput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let lo = scene.rect.xy;
    let hi = scene.rect.zw;
    let inside = all(in.uv >= lo) && all(in.uv <= hi);
    if (scene.flags.x < 0.5 || !inside) {
        return scene.background;
    }
    let local = (in.uv - lo) / max(hi - lo, vec2<f32>(1e-6));
    let c = textureSampleLevel(image_tex, samp, local, 0.0);
    // Composite straight alpha over the background.
    return vec4<f32>(mix(scene.background.rgb, c.rgb, c.a), 1.0);
}
"#;

// ============================================================================
// BLIT — float chain output to the 8-bit readback target
// ============================================================================
pub const BLIT_FRAGMENT: &str = r#"
@group(0) @binding(0) var src: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

struct FragmentInput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let c = textureSampleLevel(src, samp, in.uv, 0.0);
    return vec4<f32>(clamp(c.rgb, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

// ============================================================================
// COLOUR
// ============================================================================

pub const GAMMA_FRAGMENT: &str = effect_fragment!(
    "    gamma: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let c = sample_chain(in.uv);
    let g = max(params.gamma.x, 0.001);
    return vec4<f32>(pow(max(c.rgb, vec3<f32>(0.0)), vec3<f32>(1.0 / g)), c.a);
}
"#
);

pub const LEVELS_FRAGMENT: &str = effect_fragment!(
    "    levelBlack: vec4<f32>,\n    levelWhite: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let c = sample_chain(in.uv);
    let black = params.levelBlack.x;
    let range = max(params.levelWhite.x - black, 1e-4);
    return vec4<f32>(clamp((c.rgb - vec3<f32>(black)) / range, vec3<f32>(0.0), vec3<f32>(1.0)), c.a);
}
"#
);

pub const POSTERIZE_FRAGMENT: &str = effect_fragment!(
    "    levels: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let c = sample_chain(in.uv);
    let steps = max(floor(params.levels.x), 2.0) - 1.0;
    return vec4<f32>(floor(clamp(c.rgb, vec3<f32>(0.0), vec3<f32>(1.0)) * steps + 0.5) / steps, c.a);
}
"#
);

pub const VIGNETTE_FRAGMENT: &str = effect_fragment!(
    "    vignetteStrength: vec4<f32>,\n    vignetteSize: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let c = sample_chain(in.uv);
    // 0 at the centre, 1 in the corners.
    let d = distance(in.uv, vec2<f32>(0.5)) * 1.41421356;
    let inner = 0.5 - params.vignetteSize.x;
    let t = smoothstep(inner, 1.0, d);
    let shade = 1.0 - clamp(params.vignetteStrength.x * t, 0.0, 1.0);
    return vec4<f32>(c.rgb * shade, c.a);
}
"#
);

// ============================================================================
// ANISOTROPIC KUWAHARA
// ============================================================================
//
// structure tensor -> separable gaussian (x, y) -> kuwahara.  The tensor
// passes write (E, F, G) into rgb; values can be negative, so the chain runs
// on float targets.

pub const STRUCTURE_TENSOR_FRAGMENT: &str = effect_fragment!(
    "    resolution: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let d = 1.0 / max(params.resolution.xy, vec2<f32>(1.0));
    let uv = in.uv;

    let tl = sample_chain(uv + vec2<f32>(-d.x, -d.y)).rgb;
    let tc = sample_chain(uv + vec2<f32>(0.0, -d.y)).rgb;
    let tr = sample_chain(uv + vec2<f32>(d.x, -d.y)).rgb;
    let ml = sample_chain(uv + vec2<f32>(-d.x, 0.0)).rgb;
    let mr = sample_chain(uv + vec2<f32>(d.x, 0.0)).rgb;
    let bl = sample_chain(uv + vec2<f32>(-d.x, d.y)).rgb;
    let bc = sample_chain(uv + vec2<f32>(0.0, d.y)).rgb;
    let br = sample_chain(uv + vec2<f32>(d.x, d.y)).rgb;

    let sx = (tr + 2.0 * mr + br - tl - 2.0 * ml - bl) / 4.0;
    let sy = (bl + 2.0 * bc + br - tl - 2.0 * tc - tr) / 4.0;

    return vec4<f32>(dot(sx, sx), dot(sy, sy), dot(sx, sy), 1.0);
}
"#
);

pub const GAUSSIAN_BLUR_X_FRAGMENT: &str = effect_fragment!(
    "    resolution: vec4<f32>,\n",
    r#"
const SIGMA: f32 = 2.0;
const RADIUS: i32 = 6;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let dir = vec2<f32>(1.0 / max(params.resolution.x, 1.0), 0.0);
    var sum = vec4<f32>(0.0);
    var total = 0.0;
    for (var i: i32 = -RADIUS; i <= RADIUS; i = i + 1) {
        let x = f32(i);
        let w = exp(-(x * x) / (2.0 * SIGMA * SIGMA));
        sum += sample_chain(in.uv + dir * x) * w;
        total += w;
    }
    return sum / total;
}
"#
);

pub const GAUSSIAN_BLUR_Y_FRAGMENT: &str = effect_fragment!(
    "    resolution: vec4<f32>,\n",
    r#"
const SIGMA: f32 = 2.0;
const RADIUS: i32 = 6;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let dir = vec2<f32>(0.0, 1.0 / max(params.resolution.y, 1.0));
    var sum = vec4<f32>(0.0);
    var total = 0.0;
    for (var i: i32 = -RADIUS; i <= RADIUS; i = i + 1) {
        let y = f32(i);
        let w = exp(-(y * y) / (2.0 * SIGMA * SIGMA));
        sum += sample_chain(in.uv + dir * y) * w;
        total += w;
    }
    return sum / total;
}
"#
);

pub const ANISOTROPIC_KUWAHARA_FRAGMENT: &str = effect_fragment!(
    "    resolution: vec4<f32>,\n    kernelRadius: vec4<f32>,\n    zetaModifier: vec4<f32>,\n    zeroCrossing: vec4<f32>,\n    sharpness: vec4<f32>,\n",
    r#"
const SECTORS: i32 = 8;
const ALPHA: f32 = 1.0;
const HARDNESS: f32 = 8.0;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let texel = 1.0 / max(params.resolution.xy, vec2<f32>(1.0));

    // Orientation and anisotropy from the smoothed tensor.
    let g = sample_chain(in.uv).rgb;
    let root = sqrt(max(g.y * g.y - 2.0 * g.x * g.y + g.x * g.x + 4.0 * g.z * g.z, 0.0));
    let lambda1 = 0.5 * (g.y + g.x + root);
    let lambda2 = 0.5 * (g.y + g.x - root);
    var t = vec2<f32>(lambda1 - g.x, -g.z);
    if (length(t) > 0.0) {
        t = normalize(t);
    } else {
        t = vec2<f32>(0.0, 1.0);
    }
    let phi = -atan2(t.y, t.x);
    var anisotropy = 0.0;
    if (lambda1 + lambda2 > 0.0) {
        anisotropy = (lambda1 - lambda2) / (lambda1 + lambda2);
    }

    let radius = max(params.kernelRadius.x, 1.0);
    let a = radius * clamp((ALPHA + anisotropy) / ALPHA, 0.1, 2.0);
    let b = radius * clamp(ALPHA / (ALPHA + anisotropy), 0.1, 2.0);
    let cos_phi = cos(phi);
    let sin_phi = sin(phi);
    let sr = mat2x2<f32>(
        vec2<f32>(0.5 / a * cos_phi, 0.5 / b * sin_phi),
        vec2<f32>(-0.5 / a * sin_phi, 0.5 / b * cos_phi),
    );
    let max_x = i32(sqrt(a * a * cos_phi * cos_phi + b * b * sin_phi * sin_phi));
    let max_y = i32(sqrt(a * a * sin_phi * sin_phi + b * b * cos_phi * cos_phi));

    let zeta = params.zetaModifier.x;
    let zero_cross = params.zeroCrossing.x;
    let sin_zero = sin(zero_cross);
    let eta = (zeta + cos(zero_cross)) / max(sin_zero * sin_zero, 1e-4);

    var m: array<vec4<f32>, 8>;
    var s: array<vec3<f32>, 8>;

    for (var y: i32 = -max_y; y <= max_y; y = y + 1) {
        for (var x: i32 = -max_x; x <= max_x; x = x + 1) {
            var v = sr * vec2<f32>(f32(x), f32(y));
            if (dot(v, v) > 0.25) {
                continue;
            }
            let c = clamp(sample_input(in.uv + vec2<f32>(f32(x), f32(y)) * texel).rgb, vec3<f32>(0.0), vec3<f32>(1.0));

            var w: array<f32, 8>;
            var sum = 0.0;
            var vxx = zeta - eta * v.x * v.x;
            var vyy = zeta - eta * v.y * v.y;
            var z = max(0.0, v.y + vxx);  w[0] = z * z; sum += w[0];
            z = max(0.0, -v.x + vyy);     w[2] = z * z; sum += w[2];
            z = max(0.0, -v.y + vxx);     w[4] = z * z; sum += w[4];
            z = max(0.0, v.x + vyy);      w[6] = z * z; sum += w[6];
            v = 0.70710678 * vec2<f32>(v.x - v.y, v.x + v.y);
            vxx = zeta - eta * v.x * v.x;
            vyy = zeta - eta * v.y * v.y;
            z = max(0.0, v.y + vxx);      w[1] = z * z; sum += w[1];
            z = max(0.0, -v.x + vyy);     w[3] = z * z; sum += w[3];
            z = max(0.0, -v.y + vxx);     w[5] = z * z; sum += w[5];
            z = max(0.0, v.x + vyy);      w[7] = z * z; sum += w[7];

            let gauss = exp(-3.125 * dot(v, v)) / max(sum, 1e-6);
            for (var k: i32 = 0; k < SECTORS; k = k + 1) {
                let wk = w[k] * gauss;
                m[k] += vec4<f32>(c * wk, wk);
                s[k] += c * c * wk;
            }
        }
    }

    var out = vec4<f32>(0.0);
    for (var k: i32 = 0; k < SECTORS; k = k + 1) {
        let weight = max(m[k].w, 1e-6);
        let mean = m[k].rgb / weight;
        let variance = abs(s[k] / weight - mean * mean);
        let sigma2 = variance.r + variance.g + variance.b;
        let w = 1.0 / (1.0 + pow(HARDNESS * 1000.0 * sigma2, 0.5 * params.sharpness.x));
        out += vec4<f32>(mean * w, w);
    }
    return vec4<f32>(clamp(out.rgb / max(out.w, 1e-6), vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#
);

// ============================================================================
// LENS
// ============================================================================

pub const RADIAL_CHROMATIC_ABERRATION_FRAGMENT: &str = effect_fragment!(
    "    resolution: vec4<f32>,\n    redScale: vec4<f32>,\n    blueScale: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let dir = in.uv - vec2<f32>(0.5);
    let aspect = params.resolution.x / max(params.resolution.y, 1.0);
    let falloff = dot(dir * vec2<f32>(aspect, 1.0), dir * vec2<f32>(aspect, 1.0));
    let base = sample_chain(in.uv);
    let r = sample_chain(in.uv - dir * params.redScale.x * falloff * 0.2).r;
    let b = sample_chain(in.uv - dir * params.blueScale.x * falloff * 0.2).b;
    return vec4<f32>(r, base.g, b, base.a);
}
"#
);

pub const RADIAL_BLUR_FRAGMENT: &str = effect_fragment!(
    "    radialBlurStrength: vec4<f32>,\n    radialBlurSize: vec4<f32>,\n",
    r#"
const TAPS: i32 = 16;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let centre = vec2<f32>(0.5);
    let offset = in.uv - centre;
    let dist = length(offset);
    // Spin blur; the inner `radialBlurSize` disc stays sharp.
    let amount = params.radialBlurStrength.x * 0.1 * smoothstep(params.radialBlurSize.x * 0.5, params.radialBlurSize.x * 0.5 + 0.25, dist);
    if (amount <= 0.0) {
        return sample_chain(in.uv);
    }
    var sum = vec4<f32>(0.0);
    for (var i: i32 = 0; i < TAPS; i = i + 1) {
        let a = (f32(i) / f32(TAPS - 1) - 0.5) * amount;
        let rot = mat2x2<f32>(vec2<f32>(cos(a), sin(a)), vec2<f32>(-sin(a), cos(a)));
        sum += sample_chain(centre + rot * offset);
    }
    return sum / f32(TAPS);
}
"#
);

pub const ZOOM_BLUR_FRAGMENT: &str = effect_fragment!(
    "    zoomBlurStrength: vec4<f32>,\n    zoomBlurSize: vec4<f32>,\n",
    r#"
const TAPS: i32 = 16;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let centre = vec2<f32>(0.5);
    let offset = in.uv - centre;
    let dist = length(offset);
    let amount = params.zoomBlurStrength.x * 0.15 * smoothstep(params.zoomBlurSize.x * 0.5, params.zoomBlurSize.x * 0.5 + 0.25, dist);
    if (amount <= 0.0) {
        return sample_chain(in.uv);
    }
    var sum = vec4<f32>(0.0);
    for (var i: i32 = 0; i < TAPS; i = i + 1) {
        let scale = 1.0 - amount * f32(i) / f32(TAPS - 1);
        sum += sample_chain(centre + offset * scale);
    }
    return sum / f32(TAPS);
}
"#
);

pub const MOTION_BLUR_FRAGMENT: &str = effect_fragment!(
    "    sigma: vec4<f32>,\n    angle: vec4<f32>,\n    blendStrength: vec4<f32>,\n",
    r#"
const TAPS: i32 = 16;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let base = sample_chain(in.uv);
    let sigma = params.sigma.x;
    if (sigma < 0.01) {
        return base;
    }
    let theta = radians(params.angle.x);
    let dir = vec2<f32>(cos(theta), sin(theta)) * chain_texel();
    // Taps cover +-2 sigma pixels along the direction.
    let spacing = 2.0 * sigma / f32(TAPS);
    var sum = vec4<f32>(0.0);
    var total = 0.0;
    for (var i: i32 = -TAPS; i <= TAPS; i = i + 1) {
        let d = f32(i) * spacing;
        let w = exp(-(d * d) / (2.0 * sigma * sigma));
        sum += sample_chain(in.uv + dir * d) * w;
        total += w;
    }
    return mix(base, sum / total, clamp(params.blendStrength.x, 0.0, 1.0));
}
"#
);

// ============================================================================
// DETAIL
// ============================================================================

pub const SHARPEN_FRAGMENT: &str = effect_fragment!(
    "    kernelSize: vec4<f32>,\n    strength: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let d = chain_texel() * params.kernelSize.x;
    let c = sample_chain(in.uv);
    let blur = (sample_chain(in.uv + vec2<f32>(d.x, 0.0))
        + sample_chain(in.uv - vec2<f32>(d.x, 0.0))
        + sample_chain(in.uv + vec2<f32>(0.0, d.y))
        + sample_chain(in.uv - vec2<f32>(0.0, d.y))) * 0.25;
    let sharp = c.rgb + (c.rgb - blur.rgb) * params.strength.x;
    return vec4<f32>(clamp(sharp, vec3<f32>(0.0), vec3<f32>(1.0)), c.a);
}
"#
);

pub const EDGE_BOOST_FRAGMENT: &str = effect_fragment!(
    "    threshold: vec4<f32>,\n    opacity: vec4<f32>,\n",
    r#"
@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let base = sample_chain(in.uv);
    let d = 1.0 / vec2<f32>(textureDimensions(input_tex));

    let tl = luma(sample_input(in.uv + vec2<f32>(-d.x, -d.y)).rgb);
    let tc = luma(sample_input(in.uv + vec2<f32>(0.0, -d.y)).rgb);
    let tr = luma(sample_input(in.uv + vec2<f32>(d.x, -d.y)).rgb);
    let ml = luma(sample_input(in.uv + vec2<f32>(-d.x, 0.0)).rgb);
    let mr = luma(sample_input(in.uv + vec2<f32>(d.x, 0.0)).rgb);
    let bl = luma(sample_input(in.uv + vec2<f32>(-d.x, d.y)).rgb);
    let bc = luma(sample_input(in.uv + vec2<f32>(0.0, d.y)).rgb);
    let br = luma(sample_input(in.uv + vec2<f32>(d.x, d.y)).rgb);

    let gx = tr + 2.0 * mr + br - tl - 2.0 * ml - bl;
    let gy = bl + 2.0 * bc + br - tl - 2.0 * tc - tr;
    let magnitude = length(vec2<f32>(gx, gy));

    // Higher sensitivity lowers the edge cut-off.
    let cutoff = 1.0 - clamp(params.threshold.x, 0.0, 1.0);
    let edge = smoothstep(cutoff * 0.8, cutoff * 0.8 + 0.2, magnitude);
    return vec4<f32>(base.rgb * (1.0 - clamp(params.opacity.x, 0.0, 1.0) * edge), base.a);
}
"#
);

#[cfg(test)]
mod tests {
    use crate::effects::catalog::ALL_EFFECTS;
    use crate::effects::ParamRole;

    /// Field names of the `Params` struct, in order.
    fn params_fields(source: &str) -> Vec<&str> {
        let start = source.find("struct Params {").expect("Params struct") + "struct Params {".len();
        let end = start + source[start..].find("};").expect("Params end");
        source[start..end]
            .split(',')
            .filter_map(|f| f.split(':').next())
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }

    #[test]
    fn params_struct_mirrors_numeric_parameters() {
        for effect in ALL_EFFECTS {
            let expected: Vec<&str> = effect
                .params
                .iter()
                .filter(|p| matches!(p.role, ParamRole::Tunable | ParamRole::ViewportSize))
                .map(|p| p.name)
                .collect();
            assert_eq!(params_fields(effect.fragment), expected, "{}", effect.id);
        }
    }

    #[test]
    fn input_image_is_only_read_by_effects_that_declare_it() {
        for effect in ALL_EFFECTS {
            let body = effect.fragment.split("fn fs_main").nth(1).unwrap_or_default();
            let reads = body.contains("sample_input(") || body.contains("input_tex");
            let declares = effect.params.iter().any(|p| p.role == ParamRole::InputImage);
            assert_eq!(reads, declares, "{}", effect.id);
        }
    }

    #[test]
    fn auxiliary_shaders_have_entry_points() {
        assert!(super::SCENE_FRAGMENT.contains("fn fs_main"));
        assert!(super::BLIT_FRAGMENT.contains("fn fs_main"));
        assert!(super::FULLSCREEN_VERTEX.contains("@location(0) uv"));
    }
}
