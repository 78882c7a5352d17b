//! Tokens and the symbols they are made of

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on expanded readings per token
const MAX_READINGS: usize = 64;

/// One transcription symbol
///
/// Symbols are kept as transcribed; no alphabet canonicalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Symbol {
    /// A single character or a `{...}` group
    Plain(String),
    /// Alternate readings of one position, `[a:o]`
    Choice(Vec<String>),
    /// Unreadable position, `?`
    Illegible,
}

impl Symbol {
    /// Every reading this position admits
    #[must_use]
    pub fn alternatives(&self) -> Vec<&str> {
        match self {
            Self::Plain(s) => vec![s.as_str()],
            Self::Choice(alts) => alts.iter().map(String::as_str).collect(),
            Self::Illegible => vec!["?"],
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.write_str(s),
            Self::Choice(alts) => write!(f, "[{}]", alts.join(":")),
            Self::Illegible => f.write_str("?"),
        }
    }
}

/// Whether a token carries alternate readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Plain,
    /// Contains at least one `[a:o]` choice; never collapsed to one reading
    Choice,
}

/// One transliterated unit on a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text as transcribed, choice groups included
    pub content: String,
    /// 0-based position on the line
    pub position: usize,
    pub folio: String,
    pub line_number: usize,
    pub kind: TokenKind,
    /// Closed by an uncertain word break (`,`) rather than a certain one (`.`)
    pub uncertain_break: bool,
    pub symbols: Vec<Symbol>,
}

impl Token {
    /// Number of symbol positions
    #[inline]
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    #[must_use]
    pub fn has_choice(&self) -> bool {
        self.kind == TokenKind::Choice
    }

    /// Number of illegible positions
    #[must_use]
    pub fn illegible(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s, Symbol::Illegible))
            .count()
    }

    /// Expand every combination of choice readings
    ///
    /// Readings are produced in transcription order and capped at 64.
    #[must_use]
    pub fn readings(&self) -> Vec<String> {
        let mut readings = vec![String::new()];
        for symbol in &self.symbols {
            let alternatives = symbol.alternatives();
            let mut next = Vec::with_capacity(readings.len() * alternatives.len());
            'expand: for prefix in &readings {
                for alt in &alternatives {
                    if next.len() == MAX_READINGS {
                        break 'expand;
                    }
                    next.push(format!("{prefix}{alt}"));
                }
            }
            readings = next;
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbols: Vec<Symbol>) -> Token {
        let kind = if symbols.iter().any(|s| matches!(s, Symbol::Choice(_))) {
            TokenKind::Choice
        } else {
            TokenKind::Plain
        };
        Token {
            content: symbols.iter().map(ToString::to_string).collect(),
            position: 0,
            folio: "f1r".to_string(),
            line_number: 1,
            kind,
            uncertain_break: false,
            symbols,
        }
    }

    #[test]
    fn test_readings_expand_choices() {
        let t = token(vec![
            Symbol::Plain("c".into()),
            Symbol::Choice(vec!["a".into(), "o".into()]),
            Symbol::Plain("r".into()),
        ]);
        assert!(t.has_choice());
        assert_eq!(t.content, "c[a:o]r");
        assert_eq!(t.readings(), vec!["car", "cor"]);
    }

    #[test]
    fn test_illegible_counted() {
        let t = token(vec![Symbol::Plain("d".into()), Symbol::Illegible]);
        assert_eq!(t.illegible(), 1);
        assert_eq!(t.symbol_count(), 2);
        assert_eq!(t.readings(), vec!["d?"]);
    }

    #[test]
    fn test_readings_are_capped() {
        let choice = Symbol::Choice(vec!["a".into(), "o".into(), "y".into()]);
        let t = token(vec![choice; 6]);
        assert_eq!(t.readings().len(), MAX_READINGS);
    }
}
