pub mod biblatex;
pub mod doi_entry;
pub mod search_vector;

pub use biblatex::{BibLatex, render_bibliography};
pub use doi_entry::{DoiEntry, DoiEntryDraft, EntryError};
pub use search_vector::{SearchVector, SearchVectorError};
