//! Editor-side types shared by the assistant and the front end.
//!
//! - The editable markup document and plain-text extraction
//! - Platform seams (selection, persistent key-value storage, toolbar commands)
//! - Tone color lookup and panel resize ergonomics
//! - Configuration persistence (`~/.zen_writer/config.json`)

mod config;
mod document;
mod panel_resize;
mod platform;
mod theme;
mod tone;

pub use config::*;
pub use document::*;
pub use panel_resize::*;
pub use platform::*;
pub use theme::*;
pub use tone::*;
