//! Single-line grammar of the transliteration format
//!
//! ```text
//! # comment
//! <f1r>      <! $Q=A $P=A $I=H>
//! <f1r.1,@P0>       fachys.ykal.ar.ataiin.shol.shory.c[t:h]res.y.kor.sholdy=
//! ```
//!
//! - `.` is a certain word break, `,` an uncertain one
//! - `[a:o]` holds alternate readings of one position
//! - `{...}` groups several characters into one symbol
//! - `?` is an illegible position, `!` a filler that is dropped
//! - `<!...>` comments and `<%>`/`<$>` markers are dropped; `<->` and `<~>`
//!   (interruptions by drawings) act as word breaks
//! - a trailing `=` ends a paragraph, a trailing `-` just ends the line

use crate::token::{Symbol, Token, TokenKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `<folio.line,section>` followed by the token string
static LOCUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(?P<folio>[^.,<>\s]+)\.(?P<line>[^,<>\s]+),(?P<section>[^<>\s]+)>(?P<body>.*)$")
        .expect("valid locus regex")
});

/// `<folio>` page header, optionally followed by an attribute comment
static FOLIO_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(?P<folio>[^.,<>\s]+)>(?P<body>.*)$").expect("valid folio header regex")
});

/// `$KEY=VALUE` attribute inside a page header comment
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?P<key>[A-Za-z]+)=(?P<value>[^\s>$]+)").expect("valid attribute regex")
});

/// One manuscript line's transcription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub folio: String,
    pub line_number: usize,
    pub section: String,
    pub tokens: Vec<Token>,
    /// Line closes a paragraph (`=` terminator)
    pub paragraph_end: bool,
    /// 1-based line in the source file
    pub source_line: usize,
}

impl ParsedLine {
    /// Token contents in order
    #[must_use]
    pub fn token_texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.content.as_str()).collect()
    }
}

/// Page header with its `$KEY=VALUE` attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioHeader {
    pub folio: String,
    pub attributes: BTreeMap<String, String>,
    pub source_line: usize,
}

/// What one physical line of the file turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    Skip,
    Header(FolioHeader),
    Line(ParsedLine),
    /// Reason the line could not be parsed
    Malformed(String),
}

pub(crate) fn parse_line(raw: &str, source_line: usize) -> LineOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineOutcome::Skip;
    }
    if !trimmed.starts_with('<') {
        return LineOutcome::Malformed("missing locus header".to_string());
    }

    if let Some(caps) = LOCUS.captures(trimmed) {
        let folio = caps["folio"].to_string();
        let Ok(line_number) = caps["line"].parse::<usize>() else {
            return LineOutcome::Malformed(format!(
                "line index {:?} is not a number",
                &caps["line"]
            ));
        };
        let section = caps["section"].to_string();
        return match parse_body(&caps["body"], &folio, line_number) {
            Ok((tokens, paragraph_end)) => LineOutcome::Line(ParsedLine {
                folio,
                line_number,
                section,
                tokens,
                paragraph_end,
                source_line,
            }),
            Err(reason) => LineOutcome::Malformed(reason),
        };
    }

    if let Some(caps) = FOLIO_HEADER.captures(trimmed) {
        let attributes = ATTRIBUTE
            .captures_iter(&caps["body"])
            .map(|a| (a["key"].to_string(), a["value"].to_string()))
            .collect();
        return LineOutcome::Header(FolioHeader {
            folio: caps["folio"].to_string(),
            attributes,
            source_line,
        });
    }

    LineOutcome::Malformed("locus header does not match <folio.line,section>".to_string())
}

/// Remove `<...>` groups; drawing interruptions become word breaks
fn strip_angle_groups(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            return Err("unbalanced '<' in token string".to_string());
        };
        let group = &rest[start..=start + len];
        if group == "<->" || group == "<~>" {
            out.push('.');
        }
        rest = &rest[start + len + 1..];
    }
    if rest.contains('>') {
        return Err("unbalanced '>' in token string".to_string());
    }
    out.push_str(rest);
    Ok(out)
}

fn parse_body(
    body: &str,
    folio: &str,
    line_number: usize,
) -> Result<(Vec<Token>, bool), String> {
    let cleaned = strip_angle_groups(body)?;
    let mut text = cleaned.trim();
    let mut paragraph_end = false;
    if let Some(stripped) = text.strip_suffix('=') {
        paragraph_end = true;
        text = stripped;
    } else if let Some(stripped) = text.strip_suffix('-') {
        text = stripped;
    }

    // (raw token text, closed by uncertain break)
    let mut pieces: Vec<(String, bool)> = Vec::new();
    let mut current = String::new();
    let mut open: Option<char> = None;
    for ch in text.chars() {
        match (open, ch) {
            (None, '.' | ',') => {
                if !current.is_empty() {
                    pieces.push((std::mem::take(&mut current), ch == ','));
                }
            }
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    pieces.push((std::mem::take(&mut current), false));
                }
            }
            (None, '!') | (Some(_), '!') => {}
            (None, '[' | '{') => {
                open = Some(ch);
                current.push(ch);
            }
            (None, ']' | '}') => return Err(format!("unbalanced '{ch}' in token string")),
            (Some('['), ']') | (Some('{'), '}') => {
                open = None;
                current.push(ch);
            }
            (Some(_), '[' | '{' | ']' | '}' | '.' | ',') => {
                return Err(format!("unexpected '{ch}' inside group"));
            }
            (_, c) => current.push(c),
        }
    }
    if let Some(o) = open {
        return Err(format!("unbalanced '{o}' in token string"));
    }
    if !current.is_empty() {
        pieces.push((current, false));
    }
    if pieces.is_empty() {
        return Err("empty token string".to_string());
    }

    let mut tokens = Vec::with_capacity(pieces.len());
    for (position, (content, uncertain_break)) in pieces.into_iter().enumerate() {
        let symbols = parse_symbols(&content)?;
        let kind = if symbols.iter().any(|s| matches!(s, Symbol::Choice(_))) {
            TokenKind::Choice
        } else {
            TokenKind::Plain
        };
        tokens.push(Token {
            content,
            position,
            folio: folio.to_string(),
            line_number,
            kind,
            uncertain_break,
            symbols,
        });
    }
    Ok((tokens, paragraph_end))
}

/// Split balanced token text into symbols
fn parse_symbols(content: &str) -> Result<Vec<Symbol>, String> {
    let mut symbols = Vec::new();
    let mut chars = content.char_indices();
    while let Some((start, ch)) = chars.next() {
        match ch {
            '[' => {
                let inner: String = chars.by_ref().map(|(_, c)| c).take_while(|&c| c != ']').collect();
                let alternatives: Vec<String> = inner.split(':').map(str::to_string).collect();
                if alternatives.len() < 2 || alternatives.iter().any(String::is_empty) {
                    return Err(format!("choice group [{inner}] needs two or more readings"));
                }
                symbols.push(Symbol::Choice(alternatives));
            }
            '{' => {
                let inner: String = chars.by_ref().map(|(_, c)| c).take_while(|&c| c != '}').collect();
                if inner.is_empty() {
                    return Err(format!("empty group at offset {start}"));
                }
                symbols.push(Symbol::Plain(format!("{{{inner}}}")));
            }
            '?' => symbols.push(Symbol::Illegible),
            c => symbols.push(Symbol::Plain(c.to_string())),
        }
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(raw: &str) -> ParsedLine {
        match parse_line(raw, 1) {
            LineOutcome::Line(l) => l,
            other => panic!("expected a line, got {other:?}"),
        }
    }

    fn malformed(raw: &str) -> String {
        match parse_line(raw, 1) {
            LineOutcome::Malformed(reason) => reason,
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_record() {
        let l = line("<f1r.1,@P0>       fachys.ykal.ar.ataiin");
        assert_eq!(l.folio, "f1r");
        assert_eq!(l.line_number, 1);
        assert_eq!(l.section, "@P0");
        assert_eq!(l.token_texts(), vec!["fachys", "ykal", "ar", "ataiin"]);
        assert_eq!(l.tokens[3].position, 3);
        assert_eq!(l.tokens[0].symbol_count(), 6);
        assert!(!l.paragraph_end);
    }

    #[test]
    fn test_comments_and_blank_lines_skip() {
        assert_eq!(parse_line("# transcriber: Takahashi", 1), LineOutcome::Skip);
        assert_eq!(parse_line("   ", 2), LineOutcome::Skip);
    }

    #[test]
    fn test_uncertain_breaks_and_terminators() {
        let l = line("<f2v.4,+P0> qokeedy,dar.shey=");
        assert_eq!(l.token_texts(), vec!["qokeedy", "dar", "shey"]);
        assert!(l.tokens[0].uncertain_break);
        assert!(!l.tokens[1].uncertain_break);
        assert!(l.paragraph_end);

        let l = line("<f2v.5,+P0> otol.daiin-");
        assert_eq!(l.token_texts(), vec!["otol", "daiin"]);
        assert!(!l.paragraph_end);
    }

    #[test]
    fn test_choice_preserved() {
        let l = line("<f1r.3,@P0> c[t:h]res.y");
        assert_eq!(l.tokens[0].content, "c[t:h]res");
        assert_eq!(l.tokens[0].kind, TokenKind::Choice);
        assert_eq!(
            l.tokens[0].symbols[1],
            Symbol::Choice(vec!["t".to_string(), "h".to_string()])
        );
        assert_eq!(l.tokens[0].readings(), vec!["ctres", "chres"]);
    }

    #[test]
    fn test_inline_comments_fillers_and_drawing_breaks() {
        let l = line("<f3r.2,@P0> sho!l<!plant>.dy<->chol.{cth}or?");
        assert_eq!(l.token_texts(), vec!["shol", "dy", "chol", "{cth}or?"]);
        let last = &l.tokens[3];
        assert_eq!(last.symbols[0], Symbol::Plain("{cth}".to_string()));
        assert_eq!(last.illegible(), 1);
    }

    #[test]
    fn test_folio_header_attributes() {
        match parse_line("<f1r>      <! $Q=A $P=A $I=H>", 5) {
            LineOutcome::Header(h) => {
                assert_eq!(h.folio, "f1r");
                assert_eq!(h.source_line, 5);
                assert_eq!(h.attributes.get("I").map(String::as_str), Some("H"));
                assert_eq!(h.attributes.len(), 3);
            }
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines() {
        assert!(malformed("f1r.1,@P0 daiin").contains("missing locus"));
        assert!(malformed("<f1r.x,@P0> daiin").contains("not a number"));
        assert!(malformed("<f1r.1> daiin").contains("does not match"));
        assert!(malformed("<f1r.1,@P0> da[i.n").contains("unexpected"));
        assert!(malformed("<f1r.1,@P0> da[in").contains("unbalanced"));
        assert!(malformed("<f1r.1,@P0> da[i]n").contains("two or more"));
        assert!(malformed("<f1r.1,@P0> ..").contains("empty token string"));
        assert!(malformed("<f1r.1,@P0> dain<!note").contains("unbalanced"));
    }
}
