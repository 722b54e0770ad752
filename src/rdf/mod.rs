//! rdf
//!
//! In-memory triple graph used for domain objects and for the wire
//! encoding of the content tree.
//!
//! # Modules
//!
//! - [`vocab`] - RDF / XSD terms
//! - [`list`] - `rdf:first` / `rdf:rest` collections
//! - [`ntriples`] - N-Triples reader and writer
//!
//! # Invariants
//!
//! - A graph is a set: inserting an existing triple is a no-op
//! - Statements about one subject keep their insertion order, and subjects
//!   keep the order in which they were first used
//!
//! # Example
//!
//! ```
//! use ipmkit::core::types::Iri;
//! use ipmkit::rdf::{Graph, Literal, Resource, Term};
//!
//! let mut graph = Graph::new();
//! let s = Resource::Iri(Iri::new("urn:s").unwrap());
//! let p = Iri::new("urn:p").unwrap();
//!
//! assert!(graph.insert(s.clone(), p.clone(), Literal::string("one")));
//! assert!(!graph.insert(s.clone(), p.clone(), Literal::string("one")));
//! assert!(graph.insert(s.clone(), p.clone(), Literal::string("two")));
//!
//! let values: Vec<_> = graph.objects(&s, &p).filter_map(Term::as_literal).collect();
//! assert_eq!(values[0].lexical(), "one");
//! assert_eq!(graph.len(), 2);
//! ```

pub mod list;
pub mod ntriples;
pub mod vocab;

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::types::{Fingerprint, Iri};

pub use list::ListError;
pub use ntriples::NTriplesError;

/// A graph-scoped blank node label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankId(String);

impl BlankId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A node that can be the subject of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Iri(Iri),
    Blank(BlankId),
}

impl Resource {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Resource::Iri(iri) => Some(iri),
            Resource::Blank(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Resource::Blank(_))
    }
}

impl From<Iri> for Resource {
    fn from(iri: Iri) -> Self {
        Resource::Iri(iri)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(iri) => write!(f, "<{iri}>"),
            Resource::Blank(id) => write!(f, "{id}"),
        }
    }
}

/// A literal value: lexical form, datatype, optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: String,
    datatype: Iri,
    language: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, vocab::xsd_string())
    }

    pub fn typed(lexical: impl Into<String>, datatype: Iri) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
            language: None,
        }
    }

    /// A language-tagged string. The tag is stored lowercased.
    pub fn lang(lexical: impl Into<String>, language: &str) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: vocab::rdf_lang_string(),
            language: Some(language.to_ascii_lowercase()),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), vocab::xsd_boolean())
    }

    pub fn long(value: i64) -> Self {
        Self::typed(value.to_string(), vocab::xsd_long())
    }

    /// An `xsd:dateTime` at millisecond precision, in UTC.
    pub fn date_time(value: DateTime<Utc>) -> Self {
        Self::typed(
            value.to_rfc3339_opts(SecondsFormat::Millis, true),
            vocab::xsd_date_time(),
        )
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> &Iri {
        &self.datatype
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Parse as `xsd:boolean` (`true`, `false`, `1`, `0`).
    pub fn as_bool(&self) -> Option<bool> {
        match self.lexical.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.lexical.trim().parse().ok()
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.lexical)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Any node that can be the object of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Resource(Resource),
    Literal(Literal),
}

impl Term {
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Term::Resource(r) => Some(r),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            Term::Resource(_) => None,
        }
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        self.as_resource().and_then(Resource::as_iri)
    }
}

impl From<Resource> for Term {
    fn from(r: Resource) -> Self {
        Term::Resource(r)
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Resource(Resource::Iri(iri))
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

/// Borrowed view of one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleRef<'a> {
    pub subject: &'a Resource,
    pub predicate: &'a Iri,
    pub object: &'a Term,
}

/// A set of statements indexed by subject.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    order: Vec<Resource>,
    statements: HashMap<Resource, Vec<(Iri, Term)>>,
    blank_labels: HashSet<String>,
    next_blank: usize,
    len: usize,
}

impl PartialEq for Graph {
    /// Set equality over statements; blank labels must match exactly.
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.triples().all(|t| other.contains(t.subject, t.predicate, t.object))
    }
}

impl Eq for Graph {}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A fresh blank node not yet used in this graph.
    pub fn new_blank(&mut self) -> Resource {
        loop {
            let label = format!("b{}", self.next_blank);
            self.next_blank += 1;
            if self.blank_labels.insert(label.clone()) {
                return Resource::Blank(BlankId(label));
            }
        }
    }

    /// A blank node with a caller-chosen label (used by parsers).
    ///
    /// Returns `None` if the label is not a valid N-Triples label.
    pub fn blank(&mut self, label: &str) -> Option<Resource> {
        let mut chars = label.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid_start || !valid_rest || label.ends_with('.') {
            return None;
        }
        self.blank_labels.insert(label.to_string());
        Some(Resource::Blank(BlankId(label.to_string())))
    }

    fn note_blank(&mut self, term: &Term) {
        if let Term::Resource(Resource::Blank(id)) = term {
            if !self.blank_labels.contains(&id.0) {
                self.blank_labels.insert(id.0.clone());
            }
        }
    }

    /// Insert a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, subject: Resource, predicate: Iri, object: impl Into<Term>) -> bool {
        let object = object.into();
        if let Resource::Blank(id) = &subject {
            if !self.blank_labels.contains(&id.0) {
                self.blank_labels.insert(id.0.clone());
            }
        }
        self.note_blank(&object);

        if !self.statements.contains_key(&subject) {
            self.order.push(subject.clone());
        }
        let entry = self.statements.entry(subject).or_default();
        if entry.iter().any(|(p, o)| p == &predicate && o == &object) {
            return false;
        }
        entry.push((predicate, object));
        self.len += 1;
        true
    }

    pub fn contains(&self, subject: &Resource, predicate: &Iri, object: &Term) -> bool {
        self.statements
            .get(subject)
            .is_some_and(|s| s.iter().any(|(p, o)| p == predicate && o == object))
    }

    /// Remove one statement. Returns `false` if it was absent.
    pub fn remove(&mut self, subject: &Resource, predicate: &Iri, object: &Term) -> bool {
        self.remove_where(subject, |p, o| p == predicate && o == object) > 0
    }

    /// Remove every statement about `subject` matching `pred`.
    pub fn remove_where(
        &mut self,
        subject: &Resource,
        mut pred: impl FnMut(&Iri, &Term) -> bool,
    ) -> usize {
        let Some(entry) = self.statements.get_mut(subject) else {
            return 0;
        };
        let before = entry.len();
        entry.retain(|(p, o)| !pred(p, o));
        let removed = before - entry.len();
        if entry.is_empty() {
            self.statements.remove(subject);
            self.order.retain(|s| s != subject);
        }
        self.len -= removed;
        removed
    }

    /// Remove every statement with `predicate` about `subject`.
    pub fn remove_values(&mut self, subject: &Resource, predicate: &Iri) -> usize {
        self.remove_where(subject, |p, _| p == predicate)
    }

    /// Remove every statement whose object is `object`, optionally limited
    /// to one predicate.
    pub fn remove_incoming(&mut self, object: &Term, predicate: Option<&Iri>) -> usize {
        let subjects = self.subjects_referencing(object);
        subjects
            .iter()
            .map(|s| {
                self.remove_where(s, |p, o| {
                    o == object && predicate.map_or(true, |want| want == p)
                })
            })
            .sum()
    }

    /// Remove every statement about `subject`.
    pub fn remove_subject(&mut self, subject: &Resource) -> usize {
        self.remove_where(subject, |_, _| true)
    }

    /// Objects of `subject predicate ?o`, in insertion order.
    pub fn objects<'a>(
        &'a self,
        subject: &Resource,
        predicate: &'a Iri,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.statements
            .get(subject)
            .into_iter()
            .flatten()
            .filter(move |(p, _)| p == predicate)
            .map(|(_, o)| o)
    }

    /// Every statement about `subject`, in insertion order.
    pub fn statements_about(&self, subject: &Resource) -> &[(Iri, Term)] {
        self.statements
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Subjects of `?s predicate object`, in subject order.
    pub fn subjects(&self, predicate: &Iri, object: &Term) -> Vec<Resource> {
        self.order
            .iter()
            .filter(|s| self.contains(s, predicate, object))
            .cloned()
            .collect()
    }

    /// Subjects with at least one statement whose object is `object`.
    pub fn subjects_referencing(&self, object: &Term) -> Vec<Resource> {
        self.order
            .iter()
            .filter(|s| self.statements_about(s).iter().any(|(_, o)| o == object))
            .cloned()
            .collect()
    }

    /// Subjects with at least one statement, in first-use order.
    pub fn all_subjects(&self) -> impl Iterator<Item = &Resource> {
        self.order.iter()
    }

    pub fn has_subject(&self, subject: &Resource) -> bool {
        self.statements.contains_key(subject)
    }

    /// All statements, grouped by subject.
    pub fn triples(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.order.iter().flat_map(move |s| {
            self.statements_about(s)
                .iter()
                .map(move |(p, o)| TripleRef {
                    subject: s,
                    predicate: p,
                    object: o,
                })
        })
    }

    /// Copy every statement of `other` into this graph.
    ///
    /// Blank labels are taken as-is, so both graphs must come from the same
    /// labelling scope.
    pub fn extend_from(&mut self, other: &Graph) {
        for t in other.triples() {
            self.insert(t.subject.clone(), t.predicate.clone(), t.object.clone());
        }
    }

    /// Order-independent hash over the N-Triples form of the graph.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_graph(self)
    }
}
