//! Page scanning: locate the saved-search controls, wait for the task list,
//! and turn raw page text into a deduplicated list of task titles.

pub mod finder;
pub mod scan;
pub mod title;

pub use finder::{activate_first, filter_option_finders, saved_searches_finders, Finder};
pub use scan::Scanner;
pub use title::{classify, clean_title, contains_marker, is_likely_title};
