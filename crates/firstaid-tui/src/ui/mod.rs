//! Terminal UI module using ratatui.
//!
//! - `render`: header, page content, login form, overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
