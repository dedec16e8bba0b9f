//! Shared crate-wide constants.

use std::time::Duration;

/// Smallest width, in pixels, a window can be resized to. Keeps the title
/// bar controls reachable.
pub const MIN_WINDOW_WIDTH: i32 = 200;

/// Smallest height, in pixels, a window can be resized to.
pub const MIN_WINDOW_HEIGHT: i32 = 150;

/// Spacing between two window materializations drained from the creation
/// queue.
pub const CREATION_DELAY: Duration = Duration::from_millis(300);

/// First value handed out by the stacking counter.
pub const BASE_Z_INDEX: u64 = 100;

/// Side of the square, anchored at a window's bottom-right corner, in which a
/// pointer-down only flags resize intent for presentation.
pub const HOT_CORNER_PX: i32 = 15;

/// Height of the title bar region that starts a drag.
pub const TITLE_BAR_PX: i32 = 16;

/// Width of the close control at the right end of the title bar.
pub const CLOSE_CONTROL_PX: i32 = 24;

/// Width of the interval selection control left of the close control.
pub const SELECT_CONTROL_PX: i32 = 40;

/// Size of the dedicated resize handle element.
pub const RESIZE_HANDLE_WIDTH_PX: i32 = 8;
pub const RESIZE_HANDLE_HEIGHT_PX: i32 = 16;

/// Pixel size of one terminal cell.
///
/// The window core works in pixels; the terminal host divides by these to
/// place windows on the character grid and multiplies pointer cells back into
/// pixels (aimed at the cell center).
pub const CELL_WIDTH_PX: i32 = 8;
pub const CELL_HEIGHT_PX: i32 = 16;

/// Default size of a freshly materialized ticker window.
pub const TICKER_WINDOW_WIDTH: i32 = 320;
pub const TICKER_WINDOW_HEIGHT: i32 = 224;

/// Cascade step between consecutive new windows so they don't stack exactly.
pub const CASCADE_STEP_PX: i32 = 32;
pub const CASCADE_SLOTS: i32 = 8;

/// Session the backend writes scraped intelligence into.
pub const INTEL_SESSION_ID: &str = "INTEL_STREAM";

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_INTEL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_PIZZA_INTERVAL: Duration = Duration::from_secs(1800);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on how long the UI loop waits for input before redrawing.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);
