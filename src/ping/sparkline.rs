/// Sparkline rendering for the latency series.
///
/// Drawing goes through the small [`Canvas`] trait so the geometry can be
/// tested without a display. [`PathRecorder`] turns the draw calls into an
/// SVG path for the HTML preview; [`block_sparkline`] is the terminal form.
use std::fmt::Write as _;

/// Floor of the y-scale so small latencies still draw a visible line.
pub const MIN_SCALE_MS: f64 = 100.0;

/// Distance of failed samples above the bottom edge.
const BASELINE_INSET: f64 = 2.0;

/// Minimal 2D path drawing surface.
pub trait Canvas {
    fn clear(&mut self, width: f64, height: f64);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self);
}

/// Map series values onto canvas coordinates.
///
/// Failed samples (negative values) sit on the baseline and count as zero
/// for the scale, which is `max(values, 100)`. Points are spread evenly
/// across the width; a lone sample sits at `x = 0`.
pub fn sparkline_points(values: &[i64], width: f64, height: f64) -> Vec<(f64, f64)> {
    if values.is_empty() {
        return Vec::new();
    }

    let max = values
        .iter()
        .map(|&v| v.max(0) as f64)
        .fold(MIN_SCALE_MS, f64::max);
    let step = width / (values.len().saturating_sub(1).max(1)) as f64;

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = i as f64 * step;
            let y = if v < 0 {
                height - BASELINE_INSET
            } else {
                height - (v as f64 / max) * height
            };
            (x, y)
        })
        .collect()
}

/// Clear the canvas and stroke the sparkline. An empty series only clears.
pub fn draw_sparkline(canvas: &mut dyn Canvas, values: &[i64], width: f64, height: f64) {
    canvas.clear(width, height);
    let points = sparkline_points(values, width, height);
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return;
    };
    canvas.move_to(x0, y0);
    for &(x, y) in rest {
        canvas.line_to(x, y);
    }
    canvas.stroke();
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear { width: f64, height: f64 },
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Stroke,
}

/// Canvas that records calls and renders them as SVG.
#[derive(Debug, Clone, Default)]
pub struct PathRecorder {
    ops: Vec<DrawOp>,
    width: f64,
    height: f64,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// The stroked path as SVG path data (`M x y L x y ...`).
    pub fn svg_path(&self) -> String {
        let mut d = String::new();
        for op in &self.ops {
            match op {
                DrawOp::MoveTo(x, y) => {
                    let _ = write!(d, "M{x:.1} {y:.1} ");
                }
                DrawOp::LineTo(x, y) => {
                    let _ = write!(d, "L{x:.1} {y:.1} ");
                }
                DrawOp::Clear { .. } => d.clear(),
                DrawOp::Stroke => {}
            }
        }
        d.trim_end().to_string()
    }

    /// Standalone `<svg>` element for the recorded drawing.
    pub fn svg(&self, color: &str) -> String {
        let path = self.svg_path();
        let stroke = if path.is_empty() {
            String::new()
        } else {
            format!(
                r#"<path d="{path}" fill="none" stroke="{color}" stroke-width="2"/>"#
            )
        };
        format!(
            r#"<svg class="sparkline" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{stroke}</svg>"#,
            w = self.width,
            h = self.height,
        )
    }
}

impl Canvas for PathRecorder {
    fn clear(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.ops.push(DrawOp::Clear { width, height });
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }
}

/// Render values as SVG in one call.
pub fn sparkline_svg(values: &[i64], width: f64, height: f64) -> String {
    let mut recorder = PathRecorder::new();
    draw_sparkline(&mut recorder, values, width, height);
    recorder.svg("#4B9FFF")
}

const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One character per sample: block height by latency, `×` for failures.
pub fn block_sparkline(values: &[i64]) -> String {
    let max = values
        .iter()
        .map(|&v| v.max(0) as f64)
        .fold(MIN_SCALE_MS, f64::max);
    values
        .iter()
        .map(|&v| {
            if v < 0 {
                '×'
            } else {
                let level = ((v as f64 / max) * (BLOCKS.len() - 1) as f64).round() as usize;
                BLOCKS[level.min(BLOCKS.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_only_clears() {
        let mut canvas = PathRecorder::new();
        draw_sparkline(&mut canvas, &[], 600.0, 60.0);
        assert_eq!(
            canvas.ops(),
            &[DrawOp::Clear {
                width: 600.0,
                height: 60.0
            }]
        );
        assert_eq!(canvas.svg_path(), "");
    }

    #[test]
    fn single_sample_is_a_point_at_origin_column() {
        let points = sparkline_points(&[50], 600.0, 60.0);
        assert_eq!(points, vec![(0.0, 30.0)]);

        let mut canvas = PathRecorder::new();
        draw_sparkline(&mut canvas, &[50], 600.0, 60.0);
        assert_eq!(canvas.ops()[1], DrawOp::MoveTo(0.0, 30.0));
        assert_eq!(canvas.ops()[2], DrawOp::Stroke);
    }

    #[test]
    fn scale_floor_is_one_hundred_ms() {
        let points = sparkline_points(&[10, 20], 100.0, 100.0);
        assert_eq!(points, vec![(0.0, 90.0), (100.0, 80.0)]);
    }

    #[test]
    fn scale_follows_largest_latency() {
        let points = sparkline_points(&[400, 200, 0], 10.0, 40.0);
        assert_eq!(points, vec![(0.0, 0.0), (5.0, 20.0), (10.0, 40.0)]);
    }

    #[test]
    fn failures_sit_on_the_baseline() {
        let points = sparkline_points(&[-1, 100, -1], 20.0, 60.0);
        assert_eq!(points[0], (0.0, 58.0));
        assert_eq!(points[1], (10.0, 0.0));
        assert_eq!(points[2], (20.0, 58.0));
    }

    #[test]
    fn svg_path_follows_draw_calls() {
        let svg = sparkline_svg(&[0, 100], 10.0, 10.0);
        assert!(svg.contains(r#"d="M0.0 10.0 L10.0 0.0""#), "{svg}");
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn block_sparkline_marks_failures() {
        assert_eq!(block_sparkline(&[0, 100, -1]), "▁█×");
        assert_eq!(block_sparkline(&[]), "");
    }
}
