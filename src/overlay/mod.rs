//! # Translation overlay
//!
//! Merges a sparse translation onto the base rule set. Each translated
//! attribute is classified as a [`TranslatedAttribute`] and merged according
//! to its kind:
//!
//! - `suggestions`: translated keys are matched to the base values by position,
//! - `mosaique`: same, for the nested `mosaique.suggestions`,
//! - `*.ref`: provenance markers, dropped,
//! - anything else: replaced wholesale.

pub mod attribute;
pub mod engine;
pub mod translation;

pub use attribute::{REFERENCE_SUFFIX, TranslatedAttribute};
pub use engine::{Overlaid, OverlayOptions, OverlayStats, apply_overlay, apply_overlay_with};
pub use translation::Translation;
