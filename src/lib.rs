//! Floating-window market terminal.
//!
//! Every ticker on the watchlist gets its own draggable, resizable chart
//! window. Utility windows (chat, sessions, intel, pizza index, volatility
//! surface) float on the same desk. The window core (`stack`, `window`,
//! `registry`, `queue`, `reconcile`, `chat`) is independent of the terminal
//! and is driven through [`desk::Desk`].

pub mod api;
pub mod app;
pub mod chat;
pub mod component_context;
pub mod components;
pub mod config;
pub mod constants;
pub mod desired;
pub mod desk;
pub mod drivers;
pub mod embed;
pub mod error;
pub mod event_loop;
pub mod host;
pub mod keybindings;
pub mod queue;
pub mod reconcile;
pub mod registry;
pub mod stack;
pub mod tracing_sub;
pub mod ui;
pub mod window;
