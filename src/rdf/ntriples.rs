//! rdf::ntriples
//!
//! N-Triples reader and writer.
//!
//! The writer emits statements grouped by subject in graph order, so a
//! parse of the output rebuilds the same per-subject ordering. `xsd:string`
//! literals are written without a datatype suffix.
//!
//! # Example
//!
//! ```
//! use ipmkit::core::types::Iri;
//! use ipmkit::rdf::{ntriples, Graph, Literal, Resource};
//!
//! let mut graph = Graph::new();
//! graph.insert(
//!     Resource::Iri(Iri::new("urn:a").unwrap()),
//!     Iri::new("urn:name").unwrap(),
//!     Literal::string("line one\nline \"two\""),
//! );
//!
//! let text = ntriples::write(&graph);
//! assert_eq!(text, "<urn:a> <urn:name> \"line one\\nline \\\"two\\\"\" .\n");
//!
//! let parsed = ntriples::parse(&text).unwrap();
//! assert_eq!(parsed, graph);
//! ```

use std::fmt::Write as _;

use thiserror::Error;

use super::{vocab, Graph, Literal, Resource, Term};
use crate::core::types::{Iri, TypeError};

/// Errors from parsing N-Triples text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NTriplesError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    InvalidIri { line: usize, source: TypeError },
}

/// Serialize a graph, one statement per line.
pub fn write(graph: &Graph) -> String {
    let mut out = String::new();
    for line in lines(graph) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// The serialized statement lines of a graph, without line terminators.
pub fn lines(graph: &Graph) -> Vec<String> {
    graph
        .triples()
        .map(|t| {
            let mut line = String::new();
            write_resource(&mut line, t.subject);
            line.push(' ');
            write_iri(&mut line, t.predicate);
            line.push(' ');
            match t.object {
                Term::Resource(r) => write_resource(&mut line, r),
                Term::Literal(l) => write_literal(&mut line, l),
            }
            line.push_str(" .");
            line
        })
        .collect()
}

fn write_iri(out: &mut String, iri: &Iri) {
    out.push('<');
    out.push_str(iri.as_str());
    out.push('>');
}

fn write_resource(out: &mut String, resource: &Resource) {
    match resource {
        Resource::Iri(iri) => write_iri(out, iri),
        Resource::Blank(id) => {
            out.push_str("_:");
            out.push_str(id.as_str());
        }
    }
}

fn write_literal(out: &mut String, literal: &Literal) {
    out.push('"');
    for c in literal.lexical().chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');

    if let Some(lang) = literal.language() {
        out.push('@');
        out.push_str(lang);
    } else if literal.datatype().as_str() != vocab::XSD_STRING {
        out.push_str("^^");
        write_iri(out, literal.datatype());
    }
}

/// Parse N-Triples text into a graph.
///
/// Blank lines and `#` comment lines are skipped.
///
/// # Errors
///
/// Returns the first malformed line, numbered from 1.
pub fn parse(text: &str) -> Result<Graph, NTriplesError> {
    let mut graph = Graph::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cursor = Cursor {
            chars: line,
            pos: 0,
            line: i + 1,
        };
        let subject = cursor.resource(&mut graph)?;
        cursor.skip_ws();
        let predicate = cursor.iri()?;
        cursor.skip_ws();
        let object = cursor.term(&mut graph)?;
        cursor.skip_ws();
        cursor.expect('.')?;
        cursor.skip_ws();
        if !cursor.at_end() && !cursor.rest().starts_with('#') {
            return Err(cursor.error("unexpected text after '.'"));
        }
        graph.insert(subject, predicate, object);
    }
    Ok(graph)
}

struct Cursor<'a> {
    chars: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.chars[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> NTriplesError {
        NTriplesError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> Result<(), NTriplesError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of line"))),
        }
    }

    fn iri(&mut self) -> Result<Iri, NTriplesError> {
        self.expect('<')?;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some('\\') => text.push(self.unicode_escape()?),
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
        Iri::new(text).map_err(|source| NTriplesError::InvalidIri {
            line: self.line,
            source,
        })
    }

    fn blank(&mut self, graph: &mut Graph) -> Result<Resource, NTriplesError> {
        self.expect('_')?;
        self.expect(':')?;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            self.pos += 1;
        }
        // A trailing '.' ends the statement, not the label.
        while self.chars[start..self.pos].ends_with('.') {
            self.pos -= 1;
        }
        let label = &self.chars[start..self.pos];
        graph
            .blank(label)
            .ok_or_else(|| self.error(format!("invalid blank node label '{label}'")))
    }

    fn resource(&mut self, graph: &mut Graph) -> Result<Resource, NTriplesError> {
        match self.peek() {
            Some('<') => self.iri().map(Resource::Iri),
            Some('_') => self.blank(graph),
            _ => Err(self.error("expected IRI or blank node")),
        }
    }

    fn term(&mut self, graph: &mut Graph) -> Result<Term, NTriplesError> {
        match self.peek() {
            Some('"') => self.literal().map(Term::Literal),
            _ => self.resource(graph).map(Term::Resource),
        }
    }

    fn literal(&mut self) -> Result<Literal, NTriplesError> {
        self.expect('"')?;
        let mut lexical = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    let c = match self.peek() {
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u') | Some('U') => {
                            lexical.push(self.unicode_escape()?);
                            continue;
                        }
                        _ => return Err(self.error("invalid escape sequence")),
                    };
                    self.pos += 1;
                    lexical.push(c);
                }
                Some(c) => lexical.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }

        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-') {
                    self.pos += 1;
                }
                let tag = &self.chars[start..self.pos];
                if tag.is_empty() {
                    return Err(self.error("empty language tag"));
                }
                Ok(Literal::lang(lexical, tag))
            }
            Some('^') => {
                self.expect('^')?;
                self.expect('^')?;
                let datatype = self.iri()?;
                Ok(Literal::typed(lexical, datatype))
            }
            _ => Ok(Literal::string(lexical)),
        }
    }

    /// Decode `uXXXX` or `UXXXXXXXX` after a backslash.
    fn unicode_escape(&mut self) -> Result<char, NTriplesError> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.error("invalid escape sequence")),
        };
        let digits = self
            .rest()
            .get(..width)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        self.pos += width;
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid code point U+{digits}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Iri {
        Iri::new(s).unwrap()
    }

    mod writer {
        use super::*;

        #[test]
        fn typed_and_tagged_literals() {
            let mut g = Graph::new();
            let s = Resource::Iri(iri("urn:s"));
            g.insert(s.clone(), iri("urn:size"), Literal::long(12));
            g.insert(s.clone(), iri("urn:label"), Literal::lang("hello", "en"));

            let text = write(&g);
            assert_eq!(
                text,
                "<urn:s> <urn:size> \"12\"^^<http://www.w3.org/2001/XMLSchema#long> .\n\
                 <urn:s> <urn:label> \"hello\"@en .\n"
            );
        }

        #[test]
        fn blank_nodes() {
            let mut g = Graph::new();
            let b = g.new_blank();
            g.insert(Resource::Iri(iri("urn:s")), iri("urn:info"), b.clone());
            g.insert(b, iri("urn:name"), Literal::string("x"));
            let text = write(&g);
            assert!(text.contains("<urn:s> <urn:info> _:b0 ."));
            assert!(text.contains("_:b0 <urn:name> \"x\" ."));
        }

        #[test]
        fn control_characters_escaped() {
            let mut g = Graph::new();
            g.insert(
                Resource::Iri(iri("urn:s")),
                iri("urn:p"),
                Literal::string("a\u{1}b\tc"),
            );
            assert_eq!(write(&g), "<urn:s> <urn:p> \"a\\u0001b\\tc\" .\n");
        }
    }

    mod parser {
        use super::*;

        #[test]
        fn roundtrip_keeps_subject_order() {
            let text = "<urn:b> <urn:p> \"1\" .\n<urn:a> <urn:p> _:x .\n_:x <urn:q> <urn:b> .\n";
            let g = parse(text).unwrap();
            assert_eq!(write(&g), text);
        }

        #[test]
        fn comments_and_blank_lines_skipped() {
            let text = "# header\n\n<urn:a> <urn:p> <urn:b> . # trailing\n";
            let g = parse(text).unwrap();
            assert_eq!(g.len(), 1);
        }

        #[test]
        fn blank_label_followed_by_dot() {
            let g = parse("<urn:a> <urn:p> _:x.\n").unwrap();
            let obj = g.triples().next().unwrap().object.clone();
            assert_eq!(obj.as_resource().map(Resource::is_blank), Some(true));
        }

        #[test]
        fn escapes_decoded() {
            let g = parse(r#"<urn:a> <urn:p> "tab\there é \U0001F600 \"q\"" ."#).unwrap();
            let lit = g.triples().next().unwrap().object.as_literal().cloned().unwrap();
            assert_eq!(lit.lexical(), "tab\there é 😀 \"q\"");
        }

        #[test]
        fn datatype_parsed() {
            let g = parse(
                "<urn:a> <urn:p> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .",
            )
            .unwrap();
            let lit = g.triples().next().unwrap().object.as_literal().cloned().unwrap();
            assert_eq!(lit.as_bool(), Some(true));
            assert_eq!(lit.datatype().as_str(), vocab::XSD_BOOLEAN);
        }

        #[test]
        fn errors_carry_line_numbers() {
            let text = "<urn:a> <urn:p> <urn:b> .\n<urn:a> <urn:p> \"open .\n";
            match parse(text) {
                Err(NTriplesError::Syntax { line, .. }) => assert_eq!(line, 2),
                other => panic!("expected syntax error, got {other:?}"),
            }
        }

        #[test]
        fn missing_dot_rejected() {
            assert!(parse("<urn:a> <urn:p> <urn:b>").is_err());
        }

        #[test]
        fn literal_subject_rejected() {
            assert!(parse("\"x\" <urn:p> <urn:b> .").is_err());
        }

        #[test]
        fn invalid_iri_rejected() {
            let err = parse("<not an iri> <urn:p> <urn:b> .").unwrap_err();
            assert!(matches!(err, NTriplesError::InvalidIri { line: 1, .. }));
        }
    }
}
