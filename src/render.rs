use crate::canvas::{Canvas, SUB_H, SUB_W};
use crate::model::Sphere;
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use std::io::{self, Write};

pub(crate) const EDGE_MIN_ALPHA: f32 = 0.01;
const EDGE_BASE_ALPHA: f32 = 0.15;
const NODE_MIN_ALPHA: f32 = 0.05;
const EDGE_CORE_WIDTH: f32 = 0.7;
const EDGE_GLOW_WIDTH: f32 = 1.9;
const EDGE_GLOW_ALPHA: f32 = 0.45; // glow pass runs fainter than the core pass
const HALO_RADIUS_FACTOR: f32 = 2.0;

// Cell pass tuning
const PEAK_FLOOR: f32 = 0.02;
const DOT_THRESHOLD: f32 = 0.5; // of the cell peak
const SHADE_GAIN: f32 = 0.9;
const SHADE_FLOOR: f32 = 0.2;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

#[derive(Clone, Copy)]
pub(crate) struct Palette {
    pub(crate) name: &'static str,
    pub(crate) spheres: [Rgb; 2],
    pub(crate) hud: Color,
}

pub(crate) const PALETTES: [Palette; 5] = [
    Palette {
        name: "amber",
        spheres: [
            Rgb { r: 255, g: 150, b: 40 },
            Rgb { r: 90, g: 170, b: 255 },
        ],
        hud: Color::DarkGrey,
    },
    Palette {
        name: "ice",
        spheres: [
            Rgb { r: 120, g: 200, b: 255 },
            Rgb { r: 210, g: 130, b: 255 },
        ],
        hud: Color::DarkGrey,
    },
    Palette {
        name: "emerald",
        spheres: [
            Rgb { r: 90, g: 230, b: 140 },
            Rgb { r: 255, g: 210, b: 90 },
        ],
        hud: Color::DarkGrey,
    },
    Palette {
        name: "magma",
        spheres: [
            Rgb { r: 255, g: 90, b: 60 },
            Rgb { r: 255, g: 200, b: 120 },
        ],
        hud: Color::DarkGrey,
    },
    Palette {
        name: "mono",
        spheres: [
            Rgb { r: 230, g: 230, b: 230 },
            Rgb { r: 150, g: 150, b: 150 },
        ],
        hud: Color::DarkGrey,
    },
];

#[inline]
fn project(x: f32, y: f32, z: f32, sin_r: f32, cos_r: f32) -> (f32, f32) {
    // rigid spin about the vertical axis, flat projection
    (x * cos_r + z * sin_r, y)
}

pub(crate) fn edge_alpha(
    opacity_a: f32,
    opacity_b: f32,
    strength_a: f32,
    strength_b: f32,
    link_strength: f32,
    dist: f32,
    threshold: f32,
) -> f32 {
    let falloff = 1.0 - dist / threshold;
    opacity_a.min(opacity_b) * EDGE_BASE_ALPHA * falloff * (strength_a * strength_b * link_strength)
}

pub(crate) fn draw_scene(canvas: &mut Canvas, spheres: &[Sphere]) {
    if canvas.is_degenerate() {
        return;
    }
    for s in spheres {
        draw_sphere(canvas, s);
    }
}

fn draw_sphere(canvas: &mut Canvas, s: &Sphere) {
    let (sin_r, cos_r) = s.rotation.sin_cos();

    // edges first so nodes draw on top of them
    for p in &s.points {
        for l in &p.links {
            let q = &s.points[l.to];

            // eligibility re-checked against live positions each frame
            let dx = p.x - q.x;
            let dy = p.y - q.y;
            let dz = p.z - q.z;
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            if dist >= s.threshold {
                continue;
            }

            let alpha = edge_alpha(
                p.opacity, q.opacity, p.strength, q.strength, l.strength, dist, s.threshold,
            );
            if alpha < EDGE_MIN_ALPHA {
                continue;
            }

            let (ax, ay) = project(p.x, p.y, p.z, sin_r, cos_r);
            let (bx, by) = project(q.x, q.y, q.z, sin_r, cos_r);
            let (ax, ay) = (s.cx + ax, s.cy + ay);
            let (bx, by) = (s.cx + bx, s.cy + by);

            // core stroke plus a wider faint pass for a cheap bloom
            canvas.line(s.layer, ax, ay, bx, by, EDGE_CORE_WIDTH, alpha);
            canvas.line(s.layer, ax, ay, bx, by, EDGE_GLOW_WIDTH, alpha * EDGE_GLOW_ALPHA);
        }
    }

    for p in &s.points {
        if p.opacity <= NODE_MIN_ALPHA {
            continue;
        }
        let (x, y) = project(p.x, p.y, p.z, sin_r, cos_r);
        let (x, y) = (s.cx + x, s.cy + y);
        canvas.halo(s.layer, x, y, p.size * HALO_RADIUS_FACTOR, p.opacity);
        canvas.disc(s.layer, x, y, p.size, p.opacity);
    }
}

// Braille dot layout per cell:
// (0,0)=1 (0,1)=2 (0,2)=3 (0,3)=7
// (1,0)=4 (1,1)=5 (1,2)=6 (1,3)=8
fn dot_bit(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

fn braille_char(mask: u8) -> char {
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

fn shade(c: Rgb, k: f32) -> Rgb {
    let k = k.clamp(0.0, 1.0);
    Rgb {
        r: (c.r as f32 * k) as u8,
        g: (c.g as f32 * k) as u8,
        b: (c.b as f32 * k) as u8,
    }
}

fn dominant_layer(sums: &[f32; 2]) -> usize {
    if sums[1] > sums[0] {
        1
    } else {
        0
    }
}

pub(crate) struct Screen {
    w_cells: usize,
    h_cells: usize,
    prev_mask: Vec<u8>,
    prev_color: Vec<Rgb>,
}

impl Screen {
    pub(crate) fn new(w_cells: usize, h_cells: usize) -> Self {
        Self {
            w_cells,
            h_cells,
            prev_mask: vec![u8::MAX; w_cells * h_cells],
            prev_color: vec![Rgb { r: 0, g: 0, b: 0 }; w_cells * h_cells],
        }
    }

    pub(crate) fn present(
        &mut self,
        out: &mut impl Write,
        canvas: &Canvas,
        palette: &Palette,
        hud: Option<&str>,
    ) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate)?;

        for cy in 0..self.h_cells {
            for cx in 0..self.w_cells {
                let cell_i = cy * self.w_cells + cx;
                let sx0 = cx * SUB_W;
                let sy0 = cy * SUB_H;

                // first pass: peak and per-layer sums for this cell
                let mut peak = 0.0f32;
                let mut sums = [0.0f32; 2];
                for dy in 0..SUB_H {
                    for dx in 0..SUB_W {
                        let sx = sx0 + dx;
                        let sy = sy0 + dy;
                        if sx >= canvas.w || sy >= canvas.h {
                            continue;
                        }
                        let i = sy * canvas.w + sx;
                        let v0 = canvas.layers[0][i];
                        let v1 = canvas.layers[1][i];
                        sums[0] += v0;
                        sums[1] += v1;
                        peak = peak.max(v0 + v1);
                    }
                }

                let mut mask = 0u8;
                let mut color = Rgb { r: 0, g: 0, b: 0 };
                if peak > PEAK_FLOOR {
                    let thr = peak * DOT_THRESHOLD;
                    for dy in 0..SUB_H {
                        for dx in 0..SUB_W {
                            let sx = sx0 + dx;
                            let sy = sy0 + dy;
                            if sx >= canvas.w || sy >= canvas.h {
                                continue;
                            }
                            let i = sy * canvas.w + sx;
                            if canvas.layers[0][i] + canvas.layers[1][i] >= thr {
                                mask |= dot_bit(dx, dy);
                            }
                        }
                    }
                    let total = sums[0] + sums[1];
                    let k = (SHADE_FLOOR + total * SHADE_GAIN).min(1.0);
                    color = shade(palette.spheres[dominant_layer(&sums)], k);
                }

                if self.prev_mask[cell_i] == mask && self.prev_color[cell_i] == color {
                    continue;
                }
                self.prev_mask[cell_i] = mask;
                self.prev_color[cell_i] = color;

                let ch = if mask == 0 { ' ' } else { braille_char(mask) };
                queue!(
                    out,
                    cursor::MoveTo(cx as u16, cy as u16),
                    SetForegroundColor(Color::Rgb {
                        r: color.r,
                        g: color.g,
                        b: color.b
                    }),
                    Print(ch)
                )?;
            }
        }

        let hud_y = self.h_cells as u16;
        match hud {
            Some(line) => queue!(
                out,
                cursor::MoveTo(0, hud_y),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(palette.hud),
                Print(line),
                ResetColor
            )?,
            None => queue!(out, cursor::MoveTo(0, hud_y), Clear(ClearType::CurrentLine))?,
        }

        queue!(out, EndSynchronizedUpdate)?;
        out.flush()
    }
}
