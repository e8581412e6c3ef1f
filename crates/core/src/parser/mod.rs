//! Listing title parser.
//!
//! Maps one raw listing to an [`ExtractedIdentity`] (shows/anime) or an
//! [`ExtractedMovie`]. A title that matches no known pattern yields `None`.

mod slug;
mod title;
mod types;

pub use slug::{is_valid_slug, normalize_title, slugify, AliasTable};
pub use title::{is_repack, parse_movie_listing, parse_show_listing};
pub use types::*;
