//! Branding pipeline stages — each one transform, run in order by
//! [`crate::brand::apply_branding`].

pub mod content_types;
pub mod header_footer;
pub mod media;
pub mod relationships;
pub mod section;
pub mod styles;
