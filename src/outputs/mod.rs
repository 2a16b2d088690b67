//! Output generation modules for checkpoints and the newsletter body.
//!
//! # Submodules
//!
//! - [`json`]: Writes and reads the article checkpoint files
//! - [`html`]: Renders the enriched article list as an HTML newsletter

pub mod html;
pub mod json;
