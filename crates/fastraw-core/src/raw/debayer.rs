use ndarray::{Array2, Zip};

/// Demosaicing algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebayerMethod {
    /// Simple bilinear interpolation — fast, soft.
    Bilinear,
    /// Malvar-He-Cutler gradient-corrected — best quality this decoder offers.
    #[default]
    MalvarHeCutler,
}

impl std::fmt::Display for DebayerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bilinear => write!(f, "Bilinear"),
            Self::MalvarHeCutler => write!(f, "Malvar-He-Cutler"),
        }
    }
}

pub const RED: u8 = 0;
pub const GREEN: u8 = 1;
pub const BLUE: u8 = 2;

/// Repeating colour filter array layout, one colour index per sensor site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cfa {
    width: usize,
    height: usize,
    colors: Vec<u8>,
}

impl Cfa {
    /// Build a `width`x`height` tile from a colour lookup. Indices other than
    /// red and blue (second green, emerald) are treated as green.
    pub fn from_fn(width: usize, height: usize, color_at: impl Fn(usize, usize) -> usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let colors = (0..height)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| match color_at(row, col) {
                0 => RED,
                2 => BLUE,
                _ => GREEN,
            })
            .collect();
        Self {
            width,
            height,
            colors,
        }
    }

    /// Parse a 2x2 Bayer name such as `"RGGB"`.
    pub fn bayer(name: &str) -> Option<Self> {
        let colors = name
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'R' => Some(RED),
                'G' => Some(GREEN),
                'B' => Some(BLUE),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()?;
        if colors.len() != 4 {
            return None;
        }
        let cfa = Self {
            width: 2,
            height: 2,
            colors,
        };
        cfa.bayer_phase().map(|_| cfa)
    }

    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> u8 {
        self.colors[(row % self.height) * self.width + (col % self.width)]
    }

    pub fn is_bayer(&self) -> bool {
        self.bayer_phase().is_some()
    }

    /// `(row_parity, col_parity)` of the red site, if the tile repeats every
    /// 2x2 with one red and one blue on one diagonal and greens on the other.
    fn bayer_phase(&self) -> Option<(usize, usize)> {
        let repeats = (0..self.height).all(|r| {
            (0..self.width).all(|c| self.color_at(r, c) == self.color_at(r % 2, c % 2))
        });
        if !repeats {
            return None;
        }
        let cell = [
            self.color_at(0, 0),
            self.color_at(0, 1),
            self.color_at(1, 0),
            self.color_at(1, 1),
        ];
        let green_diagonal = match cell {
            [GREEN, a, b, GREEN] | [a, GREEN, GREEN, b] => [a, b],
            _ => return None,
        };
        if !matches!(green_diagonal, [RED, BLUE] | [BLUE, RED]) {
            return None;
        }
        let idx = cell.iter().position(|&x| x == RED)?;
        Some((idx / 2, idx % 2))
    }
}

/// Demosaiced image as three planes of linear values in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct RgbPlanes {
    pub red: Array2<f32>,
    pub green: Array2<f32>,
    pub blue: Array2<f32>,
}

impl RgbPlanes {
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            red: Array2::zeros((height, width)),
            green: Array2::zeros((height, width)),
            blue: Array2::zeros((height, width)),
        }
    }

    /// `(height, width)`.
    pub fn dim(&self) -> (usize, usize) {
        self.red.dim()
    }

    /// Apply `f` to every sample of every plane, in parallel.
    pub fn map_inplace(&mut self, f: impl Fn(f32) -> f32 + Sync + Send) {
        for plane in [&mut self.red, &mut self.green, &mut self.blue] {
            plane.par_mapv_inplace(&f);
        }
    }

    fn from_pixel_fn(height: usize, width: usize, pixel: impl Fn(usize, usize) -> [f32; 3] + Sync) -> Self {
        let mut planes = Self::zeros(height, width);
        Zip::indexed(&mut planes.red)
            .and(&mut planes.green)
            .and(&mut planes.blue)
            .par_for_each(|(row, col), r, g, b| {
                let [pr, pg, pb] = pixel(row, col);
                *r = pr;
                *g = pg;
                *b = pb;
            });
        planes
    }
}

/// Demosaic a normalised sensor mosaic.
///
/// 2x2 Bayer layouts use `method`; any other layout (X-Trans and friends)
/// falls back to a same-colour neighbourhood average.
pub fn debayer(raw: &Array2<f32>, cfa: &Cfa, method: DebayerMethod) -> RgbPlanes {
    let (h, w) = raw.dim();
    match cfa.bayer_phase() {
        Some(phase) => match method {
            DebayerMethod::Bilinear => {
                RgbPlanes::from_pixel_fn(h, w, |row, col| bilinear_pixel(raw, phase, row, col))
            }
            DebayerMethod::MalvarHeCutler => {
                RgbPlanes::from_pixel_fn(h, w, |row, col| mhc_pixel(raw, phase, row, col))
            }
        },
        None => RgbPlanes::from_pixel_fn(h, w, |row, col| neighbourhood_pixel(raw, cfa, row, col)),
    }
}

/// Half-size demosaic: every 2x2 block of sensor sites becomes one pixel
/// holding the mean of each colour found in it. No interpolation.
pub fn superpixel(raw: &Array2<f32>, cfa: &Cfa) -> RgbPlanes {
    let (h, w) = raw.dim();
    let (out_h, out_w) = ((h / 2).max(1), (w / 2).max(1));
    RgbPlanes::from_pixel_fn(out_h, out_w, |row, col| {
        let r0 = (row * 2) as isize;
        let c0 = (col * 2) as isize;
        let block = average_by_color(raw, cfa, r0..r0 + 2, c0..c0 + 2);
        if block.iter().all(Option::is_some) {
            return block.map(|v| v.unwrap_or(0.0));
        }
        // Non-Bayer tiles can miss a colour in a 2x2 block; widen to 4x4.
        let wide = average_by_color(raw, cfa, r0 - 1..r0 + 3, c0 - 1..c0 + 3);
        [0, 1, 2].map(|i| block[i].or(wide[i]).unwrap_or(0.0))
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Clamped indexing into the raw mosaic.
#[inline]
fn px(raw: &Array2<f32>, row: isize, col: isize) -> f32 {
    let (h, w) = raw.dim();
    let r = row.clamp(0, h as isize - 1) as usize;
    let c = col.clamp(0, w as isize - 1) as usize;
    raw[[r, c]]
}

/// Mean of each colour's in-bounds samples over a window.
fn average_by_color(
    raw: &Array2<f32>,
    cfa: &Cfa,
    rows: std::ops::Range<isize>,
    cols: std::ops::Range<isize>,
) -> [Option<f32>; 3] {
    let (h, w) = raw.dim();
    let mut sum = [0.0_f32; 3];
    let mut count = [0_u32; 3];
    for r in rows {
        if r < 0 || r >= h as isize {
            continue;
        }
        for c in cols.clone() {
            if c < 0 || c >= w as isize {
                continue;
            }
            let color = cfa.color_at(r as usize, c as usize) as usize;
            sum[color] += raw[[r as usize, c as usize]];
            count[color] += 1;
        }
    }
    [0, 1, 2].map(|i| (count[i] > 0).then(|| sum[i] / count[i] as f32))
}

fn neighbourhood_pixel(raw: &Array2<f32>, cfa: &Cfa, row: usize, col: usize) -> [f32; 3] {
    let native = cfa.color_at(row, col) as usize;
    let (r, c) = (row as isize, col as isize);
    let near = average_by_color(raw, cfa, r - 1..r + 2, c - 1..c + 2);
    let mut out = [0.0; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = if i == native {
            raw[[row, col]]
        } else {
            near[i]
                .or_else(|| average_by_color(raw, cfa, r - 2..r + 3, c - 2..c + 3)[i])
                .unwrap_or(0.0)
        };
    }
    out
}

// ---------------------------------------------------------------------------
// Bilinear demosaicing
// ---------------------------------------------------------------------------

fn bilinear_pixel(raw: &Array2<f32>, (r_row, r_col): (usize, usize), row: usize, col: usize) -> [f32; 3] {
    let (ri, ci) = (row as isize, col as isize);
    let is_red_row = (row % 2) == r_row;
    let is_red_col = (col % 2) == r_col;
    let v = raw[[row, col]];

    match (is_red_row, is_red_col) {
        // Red pixel position
        (true, true) => [v, avg_cross(raw, ri, ci), avg_diagonal(raw, ri, ci)],
        // Green on red row
        (true, false) => [avg_horizontal(raw, ri, ci), v, avg_vertical(raw, ri, ci)],
        // Green on blue row
        (false, true) => [avg_vertical(raw, ri, ci), v, avg_horizontal(raw, ri, ci)],
        // Blue pixel position
        (false, false) => [avg_diagonal(raw, ri, ci), avg_cross(raw, ri, ci), v],
    }
}

/// Average of 4 cross (cardinal) neighbours.
#[inline]
fn avg_cross(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c) + px(raw, r + 1, c) + px(raw, r, c - 1) + px(raw, r, c + 1)) * 0.25
}

/// Average of 4 diagonal neighbours.
#[inline]
fn avg_diagonal(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c - 1)
        + px(raw, r - 1, c + 1)
        + px(raw, r + 1, c - 1)
        + px(raw, r + 1, c + 1))
        * 0.25
}

/// Average of left and right neighbours.
#[inline]
fn avg_horizontal(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r, c - 1) + px(raw, r, c + 1)) * 0.5
}

/// Average of top and bottom neighbours.
#[inline]
fn avg_vertical(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c) + px(raw, r + 1, c)) * 0.5
}

// ---------------------------------------------------------------------------
// Malvar-He-Cutler (MHC) demosaicing
// ---------------------------------------------------------------------------
//
// Reference: "High-quality linear interpolation for demosaicing of
// Bayer-patterned color images" — Malvar, He, Cutler (2004).
//
// All kernels below are scaled by 2 from the paper values and divided by 16.

/// Green at a red or blue location.
const MHC_G_AT_RB: [[i32; 5]; 5] = [
    [0, 0, -2, 0, 0],
    [0, 0, 4, 0, 0],
    [-2, 4, 8, 4, -2],
    [0, 0, 4, 0, 0],
    [0, 0, -2, 0, 0],
];

/// Red at green in a red row / Blue at green in a blue row.
const MHC_RB_AT_G_SAME_ROW: [[i32; 5]; 5] = [
    [0, 0, 1, 0, 0],
    [0, -2, 0, -2, 0],
    [-2, 8, 10, 8, -2],
    [0, -2, 0, -2, 0],
    [0, 0, 1, 0, 0],
];

/// Red at green in a blue row / Blue at green in a red row.
const MHC_RB_AT_G_DIFF_ROW: [[i32; 5]; 5] = [
    [0, 0, -2, 0, 0],
    [0, -2, 8, -2, 0],
    [1, 0, 10, 0, 1],
    [0, -2, 8, -2, 0],
    [0, 0, -2, 0, 0],
];

/// Red at blue / Blue at red — diagonal.
const MHC_RB_AT_BR: [[i32; 5]; 5] = [
    [0, 0, -3, 0, 0],
    [0, 4, 0, 4, 0],
    [-3, 0, 12, 0, -3],
    [0, 4, 0, 4, 0],
    [0, 0, -3, 0, 0],
];

const MHC_DIVISOR: f32 = 16.0;

/// Apply a 5x5 kernel centred at (r,c), divide by `MHC_DIVISOR` and clamp.
#[inline]
fn apply_kernel(raw: &Array2<f32>, r: isize, c: isize, kernel: &[[i32; 5]; 5]) -> f32 {
    let mut sum = 0.0_f32;
    for (kr, krow) in kernel.iter().enumerate() {
        for (kc, &kval) in krow.iter().enumerate() {
            if kval != 0 {
                sum += kval as f32 * px(raw, r + kr as isize - 2, c + kc as isize - 2);
            }
        }
    }
    (sum / MHC_DIVISOR).clamp(0.0, 1.0)
}

fn mhc_pixel(raw: &Array2<f32>, (r_row, r_col): (usize, usize), row: usize, col: usize) -> [f32; 3] {
    let (ri, ci) = (row as isize, col as isize);
    let is_red_row = (row % 2) == r_row;
    let is_red_col = (col % 2) == r_col;
    let v = raw[[row, col]];

    match (is_red_row, is_red_col) {
        (true, true) => [
            v,
            apply_kernel(raw, ri, ci, &MHC_G_AT_RB),
            apply_kernel(raw, ri, ci, &MHC_RB_AT_BR),
        ],
        // Green on red row (red neighbours are left/right)
        (true, false) => [
            apply_kernel(raw, ri, ci, &MHC_RB_AT_G_SAME_ROW),
            v,
            apply_kernel(raw, ri, ci, &MHC_RB_AT_G_DIFF_ROW),
        ],
        // Green on blue row (blue neighbours are left/right)
        (false, true) => [
            apply_kernel(raw, ri, ci, &MHC_RB_AT_G_DIFF_ROW),
            v,
            apply_kernel(raw, ri, ci, &MHC_RB_AT_G_SAME_ROW),
        ],
        (false, false) => [
            apply_kernel(raw, ri, ci, &MHC_RB_AT_BR),
            apply_kernel(raw, ri, ci, &MHC_G_AT_RB),
            v,
        ],
    }
}
