//! Layout engine: turns a layout kind and canvas size into slot rectangles.
//!
//! Every layout is a partition of the canvas. Edges are computed from
//! cumulative fractions and rounded once, so neighbouring rects share an
//! edge exactly and the last rect in each row/column absorbs the rounding
//! remainder.

use serde::{Deserialize, Serialize};
use tinydash_types::layout::{
    footer_slots, DEFAULT_HERO_RATIO, DEFAULT_SPLIT_RATIO, HERO_RATIO_MAX, HERO_RATIO_MIN,
    SPLIT_RATIO_MAX, SPLIT_RATIO_MIN,
};
use tinydash_types::{LayoutType, Options, Resolution, SplitOrientation};

use crate::constants::FALLBACK_LAYOUT;
use crate::error::ConfigError;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True if the two rects share interior pixels
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Tolerance when deciding whether ratios already sum to one
const RATIO_SUM_TOLERANCE: f64 = 0.01;

/// Cut `total` pixels into pieces proportional to `fractions`.
///
/// Returns `fractions.len() + 1` edges starting at 0 and ending at `total`.
fn edges(total: i32, fractions: &[f64]) -> Vec<i32> {
    let mut out = Vec::with_capacity(fractions.len() + 1);
    out.push(0);
    let mut cumulative = 0.0;
    for (i, fraction) in fractions.iter().enumerate() {
        cumulative += fraction;
        let edge = if i + 1 == fractions.len() {
            total
        } else {
            ((total as f64) * cumulative).round() as i32
        };
        let prev = *out.last().unwrap_or(&0);
        out.push(edge.clamp(prev, total));
    }
    out
}

fn even(count: u32) -> Vec<f64> {
    vec![1.0 / count as f64; count as usize]
}

fn grid(canvas: Resolution, rows: u32, cols: u32) -> Vec<Rect> {
    let ys = edges(canvas.height as i32, &even(rows));
    let xs = edges(canvas.width as i32, &even(cols));
    let mut rects = Vec::with_capacity((rows * cols) as usize);
    for row in ys.windows(2) {
        for col in xs.windows(2) {
            rects.push(Rect::new(col[0], row[0], col[1] - col[0], row[1] - row[0]));
        }
    }
    rects
}

fn hero(canvas: Resolution, options: &Options) -> Vec<Rect> {
    let ratio = options
        .f64_or("hero_ratio", DEFAULT_HERO_RATIO)
        .clamp(HERO_RATIO_MIN, HERO_RATIO_MAX);
    let (w, h) = (canvas.width as i32, canvas.height as i32);
    let hero_height = ((h as f64) * ratio).round() as i32;

    let mut rects = vec![Rect::new(0, 0, w, hero_height)];
    let xs = edges(w, &even(footer_slots(options)));
    for col in xs.windows(2) {
        rects.push(Rect::new(col[0], hero_height, col[1] - col[0], h - hero_height));
    }
    rects
}

fn split(canvas: Resolution, options: &Options) -> Vec<Rect> {
    let ratio = options
        .f64_or("ratio", DEFAULT_SPLIT_RATIO)
        .clamp(SPLIT_RATIO_MIN, SPLIT_RATIO_MAX);
    let (w, h) = (canvas.width as i32, canvas.height as i32);
    match SplitOrientation::from_options(options) {
        SplitOrientation::Vertical => {
            let xs = edges(w, &[ratio, 1.0 - ratio]);
            vec![
                Rect::new(0, 0, xs[1], h),
                Rect::new(xs[1], 0, w - xs[1], h),
            ]
        }
        SplitOrientation::Horizontal => {
            let ys = edges(h, &[ratio, 1.0 - ratio]);
            vec![
                Rect::new(0, 0, w, ys[1]),
                Rect::new(0, ys[1], w, h - ys[1]),
            ]
        }
    }
}

/// Column ratios for `three_column`.
///
/// Three positive numbers are used as given when they sum to ~1 and
/// normalized otherwise. Anything else falls back to equal thirds.
pub fn column_ratios(options: &Options) -> [f64; 3] {
    let equal = [1.0 / 3.0; 3];
    let Some(values) = options.array("ratios") else {
        return equal;
    };
    if values.len() != 3 {
        log::debug!("three_column ratios need 3 entries, got {}", values.len());
        return equal;
    }
    let mut ratios = [0.0; 3];
    for (slot, value) in ratios.iter_mut().zip(values) {
        match value.as_f64() {
            Some(v) if v.is_finite() && v > 0.0 => *slot = v,
            _ => {
                log::debug!("three_column ratio {} is not a positive number", value);
                return equal;
            }
        }
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
        for r in &mut ratios {
            *r /= sum;
        }
    }
    ratios
}

fn three_column(canvas: Resolution, options: &Options) -> Vec<Rect> {
    let xs = edges(canvas.width as i32, &column_ratios(options));
    xs.windows(2)
        .map(|col| Rect::new(col[0], 0, col[1] - col[0], canvas.height as i32))
        .collect()
}

/// Compute ordered slot rectangles for a known layout
pub fn compute_slot_rects(layout: LayoutType, canvas: Resolution, options: &Options) -> Vec<Rect> {
    match layout {
        LayoutType::Hero => hero(canvas, options),
        LayoutType::Split => split(canvas, options),
        LayoutType::ThreeColumn => three_column(canvas, options),
        grid_layout => {
            let (rows, cols) = grid_layout.grid_dimensions().unwrap_or((2, 2));
            grid(canvas, rows, cols)
        }
    }
}

/// Compute slot rectangles for a layout given by name
pub fn compute_slot_rects_by_name(
    name: &str,
    canvas: Resolution,
    options: &Options,
) -> Result<(LayoutType, Vec<Rect>), ConfigError> {
    let layout: LayoutType = name
        .parse()
        .map_err(|_| ConfigError::UnknownLayout(name.to_string()))?;
    Ok((layout, compute_slot_rects(layout, canvas, options)))
}

/// Like [`compute_slot_rects_by_name`], but an unknown name yields the
/// fallback grid instead of an error so a screen always renders.
pub fn slot_rects_or_fallback(
    name: &str,
    canvas: Resolution,
    options: &Options,
) -> (LayoutType, Vec<Rect>) {
    match compute_slot_rects_by_name(name, canvas, options) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("{}, using {}", e, FALLBACK_LAYOUT);
            let fallback = LayoutType::Grid2x2;
            (fallback, compute_slot_rects(fallback, canvas, &Options::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CANVASES: [(u32, u32); 6] = [(240, 240), (320, 240), (160, 128), (7, 5), (1000, 333), (480, 320)];

    fn option_variants() -> Vec<Options> {
        vec![
            Options::new(),
            Options::new().with("hero_ratio", 0.55).with("footer_slots", 4),
            Options::new().with("orientation", "horizontal").with("ratio", 0.3),
            Options::new().with("ratios", json!([0.2, 0.5, 0.3])),
            Options::new().with("ratios", json!([3, 1, 1])),
        ]
    }

    fn assert_partition(rects: &[Rect], canvas: Resolution, what: &str) {
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(
            total,
            canvas.width as i64 * canvas.height as i64,
            "{}: union does not cover canvas",
            what
        );
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x >= 0 && a.y >= 0, "{}: rect {} starts off canvas", what, i);
            assert!(
                a.right() <= canvas.width as i32 && a.bottom() <= canvas.height as i32,
                "{}: rect {} ends off canvas",
                what,
                i
            );
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{}: {:?} overlaps {:?}", what, a, b);
            }
        }
    }

    #[test]
    fn test_every_layout_partitions_canvas() {
        for layout in LayoutType::ALL {
            for (w, h) in CANVASES {
                for options in option_variants() {
                    let canvas = Resolution::new(w, h);
                    let rects = compute_slot_rects(layout, canvas, &options);
                    assert_eq!(rects.len(), layout.slot_count(&options));
                    assert_partition(&rects, canvas, &format!("{} {}x{}", layout, w, h));
                }
            }
        }
    }

    #[test]
    fn test_hero_scenario() {
        let rects = compute_slot_rects(
            LayoutType::Hero,
            Resolution::new(240, 240),
            &Options::new().with("hero_ratio", 0.7),
        );
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 240, 168),
                Rect::new(0, 168, 80, 72),
                Rect::new(80, 168, 80, 72),
                Rect::new(160, 168, 80, 72),
            ]
        );
    }

    #[test]
    fn test_hero_ratio_clamped() {
        let canvas = Resolution::new(240, 240);
        let low = compute_slot_rects(LayoutType::Hero, canvas, &Options::new().with("hero_ratio", 0.1));
        let high = compute_slot_rects(LayoutType::Hero, canvas, &Options::new().with("hero_ratio", 0.95));
        assert_eq!(low[0].height, 120);
        assert_eq!(high[0].height, 192);
    }

    #[test]
    fn test_grid_2x3_is_row_major() {
        let rects = compute_slot_rects(LayoutType::Grid2x3, Resolution::new(240, 240), &Options::new());
        assert_eq!(rects[0], Rect::new(0, 0, 80, 120));
        assert_eq!(rects[2], Rect::new(160, 0, 80, 120));
        assert_eq!(rects[3], Rect::new(0, 120, 80, 120));
    }

    #[test]
    fn test_split_orientations() {
        let canvas = Resolution::new(240, 240);
        let vertical = compute_slot_rects(LayoutType::Split, canvas, &Options::new());
        assert_eq!(vertical, vec![Rect::new(0, 0, 120, 240), Rect::new(120, 0, 120, 240)]);

        let horizontal = compute_slot_rects(
            LayoutType::Split,
            canvas,
            &Options::new().with("orientation", "horizontal"),
        );
        assert_eq!(horizontal, vec![Rect::new(0, 0, 240, 120), Rect::new(0, 120, 240, 120)]);
    }

    #[test]
    fn test_three_column_ratios() {
        assert_eq!(column_ratios(&Options::new()), [1.0 / 3.0; 3]);

        let normalized = column_ratios(&Options::new().with("ratios", json!([2, 1, 1])));
        assert!((normalized[0] - 0.5).abs() < 1e-9);
        assert!((normalized.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let close = column_ratios(&Options::new().with("ratios", json!([0.3, 0.4, 0.305])));
        assert_eq!(close, [0.3, 0.4, 0.305]);

        for bad in [json!([0.5, 0.5]), json!([1, -1, 1]), json!([1, "x", 1]), json!("wide")] {
            assert_eq!(column_ratios(&Options::new().with("ratios", bad)), [1.0 / 3.0; 3]);
        }
    }

    #[test]
    fn test_unknown_layout_errors_then_falls_back() {
        let canvas = Resolution::new(240, 240);
        let err = compute_slot_rects_by_name("mosaic", canvas, &Options::new()).unwrap_err();
        assert_eq!(err, ConfigError::UnknownLayout("mosaic".into()));

        let (layout, rects) = slot_rects_or_fallback("mosaic", canvas, &Options::new());
        assert_eq!(layout, LayoutType::Grid2x2);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[3], Rect::new(120, 120, 120, 120));
    }
}
