//! Wiki page fetching and portrait extraction.
//!
//! This crate provides:
//! - [`PortraitResolver`]: fetches a character page and returns its infobox portrait URL
//! - [`extract_portrait`] / [`strip_revision`]: the pure selection rule, usable without a network

pub mod resolver;

pub use resolver::{INFOBOX_PORTRAIT_SELECTOR, PortraitResolver, extract_portrait, strip_revision};
