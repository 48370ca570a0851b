/// Triangle rasterization into a texel array
///
/// Pixel (x, y) is covered when its center (x + 0.5, y + 0.5) lies inside
/// the triangle or on one of its edges. Both windings are filled.

use glam::{Vec2, Vec4};
use rt_painter::rtp::render::{ColorWriteMask, Viewport};

use crate::soft_texture::Texel;

/// Color attachment being rendered
pub struct RasterTarget<'t> {
    pub texels: &'t mut [Texel],
    pub width: u32,
    pub height: u32,
}

/// Map a clip-space position to window coordinates (y down)
///
/// Returns `None` for vertices behind the eye (`w <= 0`).
pub fn viewport_transform(clip: Vec4, viewport: &Viewport) -> Option<Vec2> {
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        viewport.x + (ndc.x + 1.0) * 0.5 * viewport.width,
        viewport.y + (1.0 - ndc.y) * 0.5 * viewport.height,
    ))
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Fill one triangle with a constant color, clipped to the viewport and target
///
/// Returns the number of texels written.
pub fn rasterize_triangle(
    target: &mut RasterTarget<'_>,
    vertices: [Vec2; 3],
    color: Vec4,
    write_mask: ColorWriteMask,
    viewport: &Viewport,
) -> u32 {
    let [v0, v1, v2] = vertices;
    let area = edge(v0, v1, v2);
    if area == 0.0 || !area.is_finite() {
        return 0;
    }
    let sign = area.signum();

    let min = v0.min(v1).min(v2);
    let max = v0.max(v1).max(v2);
    let clip_min_x = viewport.x.max(0.0);
    let clip_min_y = viewport.y.max(0.0);
    let clip_max_x = (viewport.x + viewport.width).min(target.width as f32);
    let clip_max_y = (viewport.y + viewport.height).min(target.height as f32);

    let x_start = min.x.max(clip_min_x).floor().max(0.0) as u32;
    let y_start = min.y.max(clip_min_y).floor().max(0.0) as u32;
    let x_end = max.x.min(clip_max_x).ceil().max(0.0) as u32;
    let y_end = max.y.min(clip_max_y).ceil().max(0.0) as u32;

    let mut written = 0;
    for y in y_start..y_end.min(target.height) {
        for x in x_start..x_end.min(target.width) {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if p.x >= clip_max_x || p.y >= clip_max_y || p.x < clip_min_x || p.y < clip_min_y {
                continue;
            }
            let w0 = edge(v1, v2, p) * sign;
            let w1 = edge(v2, v0, p) * sign;
            let w2 = edge(v0, v1, p) * sign;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let texel = &mut target.texels[(y * target.width + x) as usize];
            if write_mask.r { texel[0] = color.x; }
            if write_mask.g { texel[1] = color.y; }
            if write_mask.b { texel[2] = color.z; }
            if write_mask.a { texel[3] = color.w; }
            written += 1;
        }
    }
    written
}

#[cfg(test)]
#[path = "soft_rasterizer_tests.rs"]
mod tests;
