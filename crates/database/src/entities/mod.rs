pub mod doi_entry;

pub use doi_entry as doi_entries;
