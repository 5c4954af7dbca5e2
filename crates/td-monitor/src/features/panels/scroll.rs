//! Scroll and selection engine.
//!
//! Works on a panel's row groups only: `groups[i]` is the sub-header label of
//! row `i`, or `None` for panels without sub-headers. The first visible row
//! gets its header line; every later group change costs a blank line plus a
//! header line.
//!
//! Row area of a pane: the `▲` line is shown only when `offset > 0`, the `▼`
//! line is always reserved. So a pane fits `visible_height + 1` lines at
//! offset zero and `visible_height` lines otherwise.

pub type Group = Option<&'static str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLine {
    Header(&'static str),
    Blank,
    Row(usize),
}

pub fn capacity(offset: usize, visible_height: usize) -> usize {
    if offset == 0 {
        visible_height + 1
    } else {
        visible_height
    }
}

/// Lines shown from `offset`, at most `max_lines`.
pub fn layout_lines(groups: &[Group], offset: usize, max_lines: usize) -> Vec<PanelLine> {
    let mut lines = Vec::with_capacity(max_lines);
    let mut prev: Option<Group> = None;
    for (row, &group) in groups.iter().enumerate().skip(offset) {
        if lines.len() >= max_lines {
            break;
        }
        if let Some(label) = group {
            match prev {
                None => lines.push(PanelLine::Header(label)),
                Some(p) if p != group => {
                    lines.push(PanelLine::Blank);
                    if lines.len() < max_lines {
                        lines.push(PanelLine::Header(label));
                    }
                }
                Some(_) => {}
            }
        }
        if lines.len() < max_lines {
            lines.push(PanelLine::Row(row));
        }
        prev = Some(group);
    }
    lines
}

/// Lines needed to show rows `from..` completely.
fn lines_needed(groups: &[Group], from: usize) -> usize {
    let mut total = 0;
    let mut prev: Option<Group> = None;
    for &group in groups.iter().skip(from) {
        if group.is_some() {
            total += match prev {
                None => 1,
                Some(p) if p != group => 2,
                Some(_) => 0,
            };
        }
        total += 1;
        prev = Some(group);
    }
    total
}

/// Header lines between `offset` and `cursor` (inclusive).
fn header_lines(groups: &[Group], offset: usize, cursor: usize) -> usize {
    let end = cursor.min(groups.len().saturating_sub(1));
    if offset > end {
        return 0;
    }
    let mut total = usize::from(groups[offset].is_some());
    for i in offset + 1..=end {
        if groups[i].is_some() && groups[i] != groups[i - 1] {
            total += 2;
        }
    }
    total
}

pub fn max_offset(groups: &[Group], visible_height: usize) -> usize {
    if lines_needed(groups, 0) <= visible_height {
        return 0;
    }
    let mut offset = groups.len().saturating_sub(1);
    while offset > 1 && lines_needed(groups, offset - 1) <= visible_height {
        offset -= 1;
    }
    offset
}

pub fn is_row_visible(groups: &[Group], offset: usize, row: usize, visible_height: usize) -> bool {
    layout_lines(groups, offset, capacity(offset, visible_height)).contains(&PanelLine::Row(row))
}

/// Offset that keeps `cursor` on screen, starting from `offset`.
pub fn ensure_visible(groups: &[Group], cursor: usize, offset: usize, visible_height: usize) -> usize {
    if groups.is_empty() {
        return 0;
    }
    let cursor = cursor.min(groups.len() - 1);
    let effective = visible_height
        .saturating_sub(header_lines(groups, offset, cursor))
        .max(1);

    let mut next = offset;
    if cursor < offset {
        next = cursor;
    } else if cursor >= offset + effective {
        next = cursor + 1 - effective;
        if offset == 0 {
            // The ▲ line appears and takes a row.
            next += 1;
        }
    }
    next = next.min(cursor);
    while next < cursor && !is_row_visible(groups, next, cursor, visible_height) {
        next += 1;
    }
    next.min(max_offset(groups, visible_height))
}

/// Row index under screen line `line` (0 = first line below the title and
/// the `▲` indicator).
pub fn row_at_line(groups: &[Group], offset: usize, line: usize, visible_height: usize) -> Option<usize> {
    match layout_lines(groups, offset, capacity(offset, visible_height)).get(line)? {
        PanelLine::Row(row) => Some(*row),
        _ => None,
    }
}

/// Clamps an offset after the row set or the pane size changed.
pub fn clamp_offset(groups: &[Group], offset: usize, visible_height: usize) -> usize {
    offset.min(max_offset(groups, visible_height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize) -> Vec<Group> {
        vec![None; n]
    }

    fn grouped(layout: &[(&'static str, usize)]) -> Vec<Group> {
        layout
            .iter()
            .flat_map(|&(label, n)| std::iter::repeat_n(Some(label), n))
            .collect()
    }

    #[test]
    fn test_flat_max_offset_matches_count_minus_height() {
        assert_eq!(max_offset(&flat(5), 10), 0);
        assert_eq!(max_offset(&flat(10), 10), 0);
        assert_eq!(max_offset(&flat(25), 10), 15);
        assert_eq!(max_offset(&flat(0), 10), 0);
    }

    #[test]
    fn test_layout_inserts_headers_on_group_change() {
        let groups = grouped(&[("READY", 2), ("BLOCKED", 1)]);
        let lines = layout_lines(&groups, 0, 10);
        assert_eq!(
            lines,
            vec![
                PanelLine::Header("READY"),
                PanelLine::Row(0),
                PanelLine::Row(1),
                PanelLine::Blank,
                PanelLine::Header("BLOCKED"),
                PanelLine::Row(2),
            ]
        );
        // Scrolled into the second group: its header comes first.
        assert_eq!(
            layout_lines(&groups, 2, 10),
            vec![PanelLine::Header("BLOCKED"), PanelLine::Row(2)]
        );
    }

    #[test]
    fn test_ensure_visible_moving_down_flat() {
        let groups = flat(100);
        let mut offset = 0;
        for cursor in 0..100 {
            offset = ensure_visible(&groups, cursor, offset, 10);
            assert!(offset <= cursor);
            assert!(is_row_visible(&groups, offset, cursor, 10), "cursor {cursor} offset {offset}");
            assert!(offset <= max_offset(&groups, 10));
        }
    }

    #[test]
    fn test_ensure_visible_moving_up_sets_offset_to_cursor() {
        let groups = flat(100);
        assert_eq!(ensure_visible(&groups, 40, 50, 10), 40);
    }

    #[test]
    fn test_ensure_visible_with_headers() {
        let groups = grouped(&[("REVIEW", 3), ("READY", 10), ("BLOCKED", 4), ("CLOSED", 6)]);
        let mut offset = 0;
        for cursor in (0..groups.len()).chain((0..groups.len()).rev()) {
            offset = ensure_visible(&groups, cursor, offset, 8);
            assert!(is_row_visible(&groups, offset, cursor, 8), "cursor {cursor} offset {offset}");
            assert!(offset <= max_offset(&groups, 8));
        }
    }

    #[test]
    fn test_max_offset_shows_last_row_with_headers() {
        let groups = grouped(&[("READY", 10), ("CLOSED", 3)]);
        let max = max_offset(&groups, 6);
        let lines = layout_lines(&groups, max, 6);
        assert!(lines.contains(&PanelLine::Row(12)));
        // One less would not fit.
        assert!(lines_needed(&groups, max - 1) > 6);
    }

    #[test]
    fn test_row_at_line_skips_headers() {
        let groups = grouped(&[("READY", 2), ("BLOCKED", 2)]);
        assert_eq!(row_at_line(&groups, 0, 0, 10), None);
        assert_eq!(row_at_line(&groups, 0, 1, 10), Some(0));
        assert_eq!(row_at_line(&groups, 0, 3, 10), None);
        assert_eq!(row_at_line(&groups, 0, 5, 10), Some(2));
        assert_eq!(row_at_line(&groups, 0, 9, 10), None);
    }

    #[test]
    fn test_empty_panel_is_stable() {
        assert_eq!(ensure_visible(&[], 0, 0, 10), 0);
        assert_eq!(clamp_offset(&[], 5, 10), 0);
        assert!(layout_lines(&[], 0, 10).is_empty());
    }
}
