//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Screen selection, chrome and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `tabs`: Tab content (queue list, park clock)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
