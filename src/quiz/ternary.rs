use crate::quiz::content::Strings;
use crate::quiz::scores::{Axis, ScoreVector};

pub const PLOT_WIDTH: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Equilateral triangle in screen coordinates (y grows downward) with the
/// catholic axis at the apex, protestant bottom-left and liberal bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TernaryLayout {
    pub width: f64,
}

impl Default for TernaryLayout {
    fn default() -> Self {
        Self { width: PLOT_WIDTH }
    }
}

impl TernaryLayout {
    pub fn height(&self) -> f64 {
        (3f64.sqrt() / 2.0) * self.width
    }

    pub fn vertex(&self, axis: Axis) -> Point {
        match axis {
            Axis::Catholic => Point {
                x: self.width / 2.0,
                y: 0.0,
            },
            Axis::Protestant => Point {
                x: 0.0,
                y: self.height(),
            },
            Axis::Liberal => Point {
                x: self.width,
                y: self.height(),
            },
        }
    }

    pub fn centroid(&self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height() * 2.0 / 3.0,
        }
    }

    /// Barycentric marker position. Each axis is weighted by
    /// `score / total_max` and the weights are not renormalized, so a vector
    /// that does not sum to `total_max` lands off the usual simplex.
    ///
    /// The zero vector (and `total_max == 0`) project to `(0, 0)`; renderers
    /// should substitute their own default position for it.
    pub fn project(&self, scores: &ScoreVector, total_max: u32) -> Point {
        if total_max == 0 {
            return Point::default();
        }
        Axis::ALL.iter().fold(Point::default(), |acc, &axis| {
            let weight = scores.get(axis) as f64 / total_max as f64;
            let v = self.vertex(axis);
            Point {
                x: acc.x + weight * v.x,
                y: acc.y + weight * v.y,
            }
        })
    }
}

pub fn project(scores: &ScoreVector, total_max: u32) -> Point {
    TernaryLayout::default().project(scores, total_max)
}

const GRID_ROWS: usize = 11;
const GRID_COLS: usize = 2 * GRID_ROWS - 1;

/// Monospaced drawing of the triangle with the marker, for chat clients.
pub fn render_text_plot(scores: &ScoreVector, total_max: u32, strings: &Strings) -> String {
    let layout = TernaryLayout::default();
    let point = if scores.is_zero() {
        layout.centroid()
    } else {
        layout.project(scores, total_max)
    };

    let row = ((point.y / layout.height()) * (GRID_ROWS - 1) as f64).round();
    let col = ((point.x / layout.width) * (GRID_COLS - 1) as f64).round();
    let row = row.clamp(0.0, (GRID_ROWS - 1) as f64) as usize;
    let col = col.clamp(0.0, (GRID_COLS - 1) as f64) as usize;

    let mut lines = Vec::with_capacity(GRID_ROWS + 2);
    lines.push(centered(strings.plot_label(Axis::Catholic), GRID_COLS));
    for r in 0..GRID_ROWS {
        // Row r spans the columns covered by the triangle at that height.
        let half = GRID_ROWS - 1;
        let (left, right) = (half - r, half + r);
        let line: String = (0..GRID_COLS)
            .map(|c| {
                if r == row && c == col {
                    '●'
                } else if c == left || c == right || (r == GRID_ROWS - 1 && c >= left && c <= right) {
                    '·'
                } else {
                    ' '
                }
            })
            .collect();
        lines.push(line.trim_end().to_string());
    }
    lines.push(format!(
        "{}{}",
        strings.plot_label(Axis::Protestant),
        right_aligned(
            strings.plot_label(Axis::Liberal),
            GRID_COLS.saturating_sub(strings.plot_label(Axis::Protestant).chars().count())
        )
    ));
    lines.join("\n")
}

fn centered(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn right_aligned(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count()).max(1);
    format!("{}{}", " ".repeat(pad), text)
}
