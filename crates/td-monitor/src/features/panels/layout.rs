//! Main-view geometry and hit-testing.
//!
//! Top to bottom: optional search bar, three panes proportioned by the
//! pane-height triple, optional footer. The last pane absorbs rounding.

use ratatui::layout::Rect;

use super::Panel;

pub const SEARCH_BAR_HEIGHT: u16 = 2;
pub const FOOTER_HEIGHT: u16 = 3;
/// Borders, title and the two scroll indicators.
pub const PANEL_CHROME: u16 = 5;
/// Smallest share of the available height a pane may take.
pub const MIN_PANE_SHARE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MainLayout {
    pub search: Option<Rect>,
    pub panes: [Rect; 3],
    /// Three-row bands centred on the pane borders 0|1 and 1|2.
    pub dividers: [Rect; 2],
    pub footer: Option<Rect>,
    /// Height shared by the three panes.
    pub available: u16,
}

impl MainLayout {
    pub fn compute(area: Rect, heights: [f64; 3], show_search: bool, show_footer: bool) -> Self {
        let search_h = if show_search {
            SEARCH_BAR_HEIGHT.min(area.height)
        } else {
            0
        };
        let footer_h = if show_footer {
            FOOTER_HEIGHT.min(area.height - search_h)
        } else {
            0
        };
        let available = area.height - search_h - footer_h;

        let h0 = share(available, heights[0]);
        let h1 = share(available, heights[1]).min(available - h0);
        let h2 = available - h0 - h1;

        let top = area.y + search_h;
        let pane = |y: u16, height: u16| Rect {
            x: area.x,
            y,
            width: area.width,
            height,
        };
        let panes = [pane(top, h0), pane(top + h0, h1), pane(top + h0 + h1, h2)];
        let band = |boundary: u16| Rect {
            x: area.x,
            y: boundary.saturating_sub(1),
            width: area.width,
            height: 3,
        };

        Self {
            search: show_search.then(|| Rect {
                height: search_h,
                ..area
            }),
            panes,
            dividers: [band(panes[1].y), band(panes[2].y)],
            footer: show_footer.then(|| Rect {
                x: area.x,
                y: top + available,
                width: area.width,
                height: footer_h,
            }),
            available,
        }
    }

    pub fn pane(&self, panel: Panel) -> Rect {
        self.panes[panel.index()]
    }

    /// Rows a pane can show once scrolled (chrome excluded), at least one.
    pub fn visible_height(&self, panel: Panel) -> usize {
        visible_height(self.pane(panel))
    }

    pub fn hit_test_panel(&self, x: u16, y: u16) -> Option<Panel> {
        Panel::ALL
            .into_iter()
            .find(|&p| contains(self.pane(p), x, y))
    }

    /// Divider bands win over pane clicks.
    pub fn hit_test_divider(&self, x: u16, y: u16) -> Option<usize> {
        self.dividers.iter().position(|&band| contains(band, x, y))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn share(available: u16, fraction: f64) -> u16 {
    let rows = (f64::from(available) * fraction).floor();
    if rows <= 0.0 {
        0
    } else if rows >= f64::from(available) {
        available
    } else {
        rows as u16
    }
}

pub fn visible_height(pane: Rect) -> usize {
    usize::from(pane.height.saturating_sub(PANEL_CHROME)).max(1)
}

/// Half-open containment: `[x, x + w) × [y, y + h)`.
pub fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && u32::from(x) < u32::from(rect.x) + u32::from(rect.width)
        && y >= rect.y
        && u32::from(y) < u32::from(rect.y) + u32::from(rect.height)
}

/// Moves the divider between panes `divider` and `divider + 1` by `delta`
/// (a fraction of the available height). Each pane keeps at least
/// [`MIN_PANE_SHARE`] and the result is renormalised to sum to one.
pub fn drag_heights(start: [f64; 3], divider: usize, delta: f64) -> [f64; 3] {
    let (a, b) = (divider.min(1), divider.min(1) + 1);
    let pair = start[a] + start[b];
    let mut heights = start;
    let upper = (pair - MIN_PANE_SHARE).max(MIN_PANE_SHARE);
    heights[a] = (start[a] + delta).clamp(MIN_PANE_SHARE, upper);
    heights[b] = pair - heights[a];
    normalize(heights)
}

/// Scales the triple to sum to one, lifting any pane below the floor.
pub fn normalize(heights: [f64; 3]) -> [f64; 3] {
    let mut h = heights.map(|v| if v.is_finite() { v.max(MIN_PANE_SHARE) } else { MIN_PANE_SHARE });
    let sum: f64 = h.iter().sum();
    h = h.map(|v| v / sum);
    // Scaling down can push a pane under the floor again; take the deficit
    // from the largest pane.
    for i in 0..3 {
        if h[i] < MIN_PANE_SHARE {
            let deficit = MIN_PANE_SHARE - h[i];
            h[i] = MIN_PANE_SHARE;
            let largest = (0..3)
                .filter(|&j| j != i)
                .max_by(|&x, &y| h[x].total_cmp(&h[y]))
                .unwrap_or(0);
            h[largest] -= deficit;
        }
    }
    h
}
