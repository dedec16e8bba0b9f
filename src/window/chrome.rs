//! Window chrome: where the title bar, its controls and the resize handle sit,
//! and how they are painted onto the terminal grid.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};

use super::{FloatRect, Interaction, WindowHandle, WindowId};
use crate::constants::{
    CELL_HEIGHT_PX, CELL_WIDTH_PX, CLOSE_CONTROL_PX, HOT_CORNER_PX, RESIZE_HANDLE_HEIGHT_PX,
    RESIZE_HANDLE_WIDTH_PX, SELECT_CONTROL_PX, TITLE_BAR_PX,
};
use crate::ui::{UiFrame, ellipsize, safe_set_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    Title,
    Close,
    Select,
    ResizeHandle,
    Body,
}

/// Result of hit-testing a point against the topmost window under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: WindowId,
    pub region: HitRegion,
    pub hot_corner: bool,
}

/// Classify a point inside `window`, or `None` when it misses the window.
pub fn hit_region(window: &WindowHandle, x: i32, y: i32) -> Option<HitRegion> {
    let rect = window.rect;
    if !rect.contains(x, y) {
        return None;
    }
    if y < rect.top + TITLE_BAR_PX {
        let close_start = rect.right() - CLOSE_CONTROL_PX;
        if x >= close_start {
            return Some(HitRegion::Close);
        }
        if window.has_select_control() && x >= close_start - SELECT_CONTROL_PX {
            return Some(HitRegion::Select);
        }
        return Some(HitRegion::Title);
    }
    if window.resize_handle
        && x >= rect.right() - RESIZE_HANDLE_WIDTH_PX
        && y >= rect.bottom() - RESIZE_HANDLE_HEIGHT_PX
    {
        return Some(HitRegion::ResizeHandle);
    }
    Some(HitRegion::Body)
}

pub fn in_hot_corner(rect: FloatRect, x: i32, y: i32) -> bool {
    rect.contains(x, y) && x > rect.right() - HOT_CORNER_PX && y > rect.bottom() - HOT_CORNER_PX
}

/// Signed cell placement of a pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

pub fn cell_rect(rect: FloatRect) -> CellRect {
    CellRect {
        x: rect.left.div_euclid(CELL_WIDTH_PX),
        y: rect.top.div_euclid(CELL_HEIGHT_PX),
        width: (rect.width / CELL_WIDTH_PX).clamp(0, u16::MAX as i32) as u16,
        height: (rect.height / CELL_HEIGHT_PX).clamp(0, u16::MAX as i32) as u16,
    }
}

/// Pixel coordinate of the center of a terminal cell.
pub fn cell_center_px(column: u16, row: u16) -> (i32, i32) {
    (
        column as i32 * CELL_WIDTH_PX + CELL_WIDTH_PX / 2,
        row as i32 * CELL_HEIGHT_PX + CELL_HEIGHT_PX / 2,
    )
}

/// Clip a signed cell rectangle to `bounds`.
pub fn visible_cells(rect: CellRect, bounds: Rect) -> Rect {
    let left = rect.x.max(bounds.x as i32);
    let top = rect.y.max(bounds.y as i32);
    let right = (rect.x + rect.width as i32).min(bounds.right() as i32);
    let bottom = (rect.y + rect.height as i32).min(bounds.bottom() as i32);
    if right <= left || bottom <= top {
        return Rect::default();
    }
    Rect {
        x: left as u16,
        y: top as u16,
        width: (right - left) as u16,
        height: (bottom - top) as u16,
    }
}

/// Area left for window content once border and title bar are drawn.
pub fn content_area(window: &WindowHandle, bounds: Rect) -> Rect {
    let cells = cell_rect(window.rect);
    let inner = CellRect {
        x: cells.x + 1,
        y: cells.y + 1,
        width: cells.width.saturating_sub(2),
        height: cells.height.saturating_sub(2),
    };
    visible_cells(inner, bounds)
}

/// Paint border, title bar, controls and resize handle for `window`.
///
/// `select_label` is drawn in the selection control slot when the window has
/// one.
pub fn render_chrome(
    frame: &mut UiFrame<'_>,
    window: &WindowHandle,
    bounds: Rect,
    select_label: Option<&str>,
) {
    let cells = cell_rect(window.rect);
    if cells.width < 3 || cells.height < 2 {
        return;
    }
    let header_style = if window.active {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    };
    let border_style = match (window.interaction, window.resize_hint) {
        (Interaction::Resizing, _) | (_, true) => Style::default().fg(Color::Yellow),
        (Interaction::Dragging, _) => Style::default().fg(Color::Cyan),
        (Interaction::Idle, _) => Style::default().fg(Color::DarkGray),
    };

    let buffer = frame.buffer_mut();
    let clip = bounds.intersection(buffer.area);
    let left = cells.x;
    let top = cells.y;
    let right = cells.x + cells.width as i32 - 1;
    let bottom = cells.y + cells.height as i32 - 1;

    let mut put = |x: i32, y: i32, symbol: &str, style: Style| {
        if x < clip.x as i32 || y < clip.y as i32 {
            return;
        }
        if x >= clip.right() as i32 || y >= clip.bottom() as i32 {
            return;
        }
        if let Some(cell) = buffer.cell_mut((x as u16, y as u16)) {
            cell.set_symbol(symbol);
            cell.set_style(style);
        }
    };

    // Title row doubles as the top border.
    for x in left..=right {
        let symbol = if x == left {
            "┌"
        } else if x == right {
            "┐"
        } else {
            " "
        };
        let style = if x == left || x == right {
            border_style
        } else {
            header_style
        };
        put(x, top, symbol, style);
    }
    for x in left..=right {
        let symbol = if x == left {
            "└"
        } else if x == right {
            "┘"
        } else {
            "─"
        };
        put(x, bottom, symbol, border_style);
    }
    for y in top + 1..bottom {
        put(left, y, "│", border_style);
        put(right, y, "│", border_style);
    }
    if window.resize_handle {
        put(right, bottom, "◢", border_style);
    }

    let buffer = frame.buffer_mut();
    if top >= clip.y as i32 && top < clip.bottom() as i32 {
        let y = top as u16;
        let close_cells = CLOSE_CONTROL_PX / CELL_WIDTH_PX;
        let close_x = right + 1 - close_cells;
        if close_x >= clip.x as i32 {
            safe_set_string(buffer, clip, close_x as u16, y, "[x]", header_style);
        }
        let mut title_end = close_x;
        if window.has_select_control()
            && let Some(label) = select_label
        {
            let select_cells = SELECT_CONTROL_PX / CELL_WIDTH_PX;
            let select_x = close_x - select_cells;
            if select_x > left && select_x >= clip.x as i32 {
                let text = format!("{label:>3} ▾ ");
                safe_set_string(buffer, clip, select_x as u16, y, &text, header_style);
            }
            title_end = select_x;
        }
        let title_x = left + 2;
        let room = (title_end - title_x - 1).max(0) as usize;
        if room > 0 && title_x >= clip.x as i32 {
            let title = ellipsize(&window.title, room);
            safe_set_string(buffer, clip, title_x as u16, y, &title, header_style);
        }
    }
}
