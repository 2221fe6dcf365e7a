use crate::doi_entry::DoiEntry;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Renders a [`DoiEntry`] as a BibLaTeX record
pub struct BibLatex<'a>(pub &'a DoiEntry);

impl Display for BibLatex<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let entry = self.0;
        writeln!(f, "@{}{{{},", entry.bib_type, entry.cite_key)?;

        let fields: [(&str, &dyn Display); 10] = [
            ("author", &entry.author),
            ("title", &entry.title),
            ("journal", &entry.journal),
            ("publisher", &entry.publisher),
            ("volume", &entry.volume),
            ("number", &entry.number),
            ("month", &entry.month),
            ("year", &entry.year),
            ("doi", &entry.doi),
            ("url", &entry.url),
        ];
        for (name, value) in fields {
            writeln!(f, "  {name} = {{{value}}},")?;
        }

        write!(f, "}}")
    }
}

/// Renders a whole bibliography, records separated by a blank line
pub fn render_bibliography<'a>(entries: impl IntoIterator<Item = &'a DoiEntry>) -> String {
    entries
        .into_iter()
        .map(|entry| BibLatex(entry).to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}
