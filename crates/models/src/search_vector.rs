use std::{collections::BTreeSet, iter::Peekable, str::Chars, str::FromStr};
use thiserror::Error;

/// Errors raised while reading the text form of a tsvector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchVectorError {
    #[error("expected a quoted lexeme, found `{0}`")]
    ExpectedQuote(char),
    #[error("lexeme is missing its closing quote")]
    UnterminatedLexeme,
    #[error("invalid position list `{0}`")]
    InvalidPosition(String),
}

/// The lexemes stored in a `search` column, as Postgres prints them
///
/// The text form looks like `'acm':7 'graph':1 'j':4,5`. Position lists,
/// including weight suffixes (`3A`), are validated and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchVector {
    lexemes: BTreeSet<String>,
}

impl SearchVector {
    /// Whether the vector holds the given lexeme
    pub fn contains(&self, lexeme: &str) -> bool {
        self.lexemes.contains(lexeme)
    }

    /// Lexemes in sorted order
    pub fn lexemes(&self) -> impl Iterator<Item = &str> {
        self.lexemes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }
}

fn read_lexeme(chars: &mut Peekable<Chars<'_>>) -> Result<String, SearchVectorError> {
    let mut lexeme = String::new();

    loop {
        match chars.next() {
            None => return Err(SearchVectorError::UnterminatedLexeme),
            Some('\\') => match chars.next() {
                Some(escaped) => lexeme.push(escaped),
                None => return Err(SearchVectorError::UnterminatedLexeme),
            },
            Some('\'') => {
                // A doubled quote is an escaped quote inside the lexeme
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    lexeme.push('\'');
                } else {
                    return Ok(lexeme);
                }
            }
            Some(c) => lexeme.push(c),
        }
    }
}

fn skip_positions(chars: &mut Peekable<Chars<'_>>) -> Result<(), SearchVectorError> {
    let mut raw = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        raw.push(c);
        chars.next();
    }

    let valid = raw.split(',').all(|part| {
        part.trim_end_matches(['A', 'B', 'C', 'D', 'a', 'b', 'c', 'd'])
            .parse::<u16>()
            .is_ok()
    });
    if !valid {
        return Err(SearchVectorError::InvalidPosition(raw));
    }

    Ok(())
}

impl FromStr for SearchVector {
    type Err = SearchVectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lexemes = BTreeSet::new();
        let mut chars = s.chars().peekable();

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }

            let Some(c) = chars.next() else { break };
            if c != '\'' {
                return Err(SearchVectorError::ExpectedQuote(c));
            }

            let lexeme = read_lexeme(&mut chars)?;
            if chars.peek() == Some(&':') {
                chars.next();
                skip_positions(&mut chars)?;
            }

            lexemes.insert(lexeme);
        }

        Ok(Self { lexemes })
    }
}
