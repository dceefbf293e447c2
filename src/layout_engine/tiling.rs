//! Partitioning of a host rectangle among a group's windows.
//!
//! All arithmetic is done on integer pixels. Whatever a division leaves over
//! is given to the last column and the last row, so linear layouts always
//! reconstruct the host rectangle exactly.

use crate::common::config::LayoutSettings;
use crate::layout_engine::{LayoutKind, Orientation};
use crate::sys::geometry::Rect;

const GRID_COLUMNS: i32 = 2;

/// Per-window size floors used when dividing the host rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilingLimits {
    pub min_column_width: i32,
    pub min_row_height: i32,
}

impl Default for TilingLimits {
    fn default() -> Self {
        Self {
            min_column_width: 400,
            min_row_height: 300,
        }
    }
}

impl From<&LayoutSettings> for TilingLimits {
    fn from(settings: &LayoutSettings) -> Self {
        Self {
            min_column_width: settings.min_column_width,
            min_row_height: settings.min_row_height,
        }
    }
}

/// Computes `count` window frames inside `host`, in URL order.
///
/// The returned frames are in absolute coordinates. A `count` of zero yields
/// no frames.
pub fn tile(host: Rect, layout: LayoutKind, count: usize, limits: &TilingLimits) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let count = i32::try_from(count).unwrap_or(i32::MAX);

    let local: Vec<Rect> = match layout.orientation() {
        Some(Orientation::Horizontal) => spans(host.width, count, limits.min_column_width)
            .map(|(left, width)| Rect::new(left, 0, width, host.height))
            .collect(),
        Some(Orientation::Vertical) => spans(host.height, count, limits.min_row_height)
            .map(|(top, height)| Rect::new(0, top, host.width, height))
            .collect(),
        None => grid(host, count),
    };

    local.iter().map(|frame| frame.offset_by(&host)).collect()
}

/// Splits `total` pixels into `count` consecutive `(offset, length)` spans.
///
/// Every span but the last is `max(total / count, floor)` long; the last one
/// takes what is left. The floor is dropped when honouring it would push the
/// last span to zero or negative length.
fn spans(total: i32, count: i32, floor: i32) -> impl Iterator<Item = (i32, i32)> {
    let even = total / count;
    let mut size = even.max(floor);
    if size.saturating_mul(count - 1) >= total {
        size = even;
    }

    (0..count).map(move |i| {
        let offset = i * size;
        let length = if i == count - 1 { total - offset } else { size };
        (offset, length)
    })
}

fn grid(host: Rect, count: i32) -> Vec<Rect> {
    let rows = ((count + GRID_COLUMNS - 1) / GRID_COLUMNS).max(1);
    let cell_width = host.width / GRID_COLUMNS;
    let cell_height = host.height / rows;

    (0..count)
        .map(|i| {
            let col = i % GRID_COLUMNS;
            let row = i / GRID_COLUMNS;
            let width = if col == GRID_COLUMNS - 1 {
                host.width - cell_width * (GRID_COLUMNS - 1)
            } else {
                cell_width
            };
            let height = if row == rows - 1 {
                host.height - cell_height * (rows - 1)
            } else {
                cell_height
            };
            Rect::new(col * cell_width, row * cell_height, width, height)
        })
        .collect()
}
