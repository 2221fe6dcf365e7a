pub mod doi_entry;
