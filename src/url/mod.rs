//! URL handling module for Paper-Harvest
//!
//! This module provides link resolution against a page URL, listing-link
//! classification, the download extension allow-list check, and derivation of
//! safe local filenames from file URLs.

mod filename;
mod resolve;

pub use filename::{filename_from_url, numbered_path, sanitize_filename};
pub use resolve::{has_allowed_extension, is_excluded_link, resolve_link};
