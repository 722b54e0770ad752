//! rdf::list
//!
//! Ordered collections encoded as `rdf:first` / `rdf:rest` chains ending in
//! `rdf:nil`.

use std::collections::HashSet;

use thiserror::Error;

use super::{vocab, Graph, Resource, Term};

/// Malformed list structure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    #[error("list cell {0} has no rdf:first")]
    MissingFirst(Resource),

    #[error("list cell {0} has no rdf:rest")]
    MissingRest(Resource),

    #[error("list cell {cell} has more than one {predicate}")]
    Ambiguous { cell: Resource, predicate: &'static str },

    #[error("rdf:rest of {0} is a literal")]
    LiteralRest(Resource),

    #[error("list revisits cell {0}")]
    Cycle(Resource),
}

impl Graph {
    /// Write `items` as a list and return its head (`rdf:nil` when empty).
    pub fn insert_list(&mut self, items: impl IntoIterator<Item = Term>) -> Resource {
        let items: Vec<Term> = items.into_iter().collect();
        let nil = Resource::Iri(vocab::rdf_nil());
        let cells: Vec<Resource> = items.iter().map(|_| self.new_blank()).collect();

        for (i, item) in items.into_iter().enumerate() {
            let rest = cells.get(i + 1).cloned().unwrap_or_else(|| nil.clone());
            self.insert(cells[i].clone(), vocab::rdf_first(), item);
            self.insert(cells[i].clone(), vocab::rdf_rest(), rest);
        }

        cells.into_iter().next().unwrap_or(nil)
    }

    /// Read the list starting at `head`.
    pub fn read_list(&self, head: &Resource) -> Result<Vec<Term>, ListError> {
        let first = vocab::rdf_first();
        let rest = vocab::rdf_rest();
        let nil = Resource::Iri(vocab::rdf_nil());

        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut cell = head.clone();

        while cell != nil {
            if !seen.insert(cell.clone()) {
                return Err(ListError::Cycle(cell));
            }
            let item = single(self, &cell, &first, vocab::RDF_FIRST)?
                .ok_or_else(|| ListError::MissingFirst(cell.clone()))?;
            let next = single(self, &cell, &rest, vocab::RDF_REST)?
                .ok_or_else(|| ListError::MissingRest(cell.clone()))?;

            items.push(item.clone());
            cell = match next {
                Term::Resource(r) => r.clone(),
                Term::Literal(_) => return Err(ListError::LiteralRest(cell)),
            };
        }

        Ok(items)
    }

    /// Remove the cells of the list starting at `head`. Items are kept.
    ///
    /// Stops quietly at the first malformed cell.
    pub fn remove_list(&mut self, head: &Resource) -> usize {
        let first = vocab::rdf_first();
        let rest = vocab::rdf_rest();
        let nil = Resource::Iri(vocab::rdf_nil());

        let mut removed = 0;
        let mut seen = HashSet::new();
        let mut cell = head.clone();
        while cell != nil && cell.is_blank() && seen.insert(cell.clone()) {
            let next = self.objects(&cell, &rest).find_map(Term::as_resource).cloned();
            removed += self.remove_values(&cell, &first);
            removed += self.remove_values(&cell, &rest);
            match next {
                Some(n) => cell = n,
                None => break,
            }
        }
        removed
    }
}

fn single<'a>(
    graph: &'a Graph,
    cell: &Resource,
    predicate: &'a crate::core::types::Iri,
    name: &'static str,
) -> Result<Option<&'a Term>, ListError> {
    let mut values = graph.objects(cell, predicate);
    let first = values.next();
    if values.next().is_some() {
        return Err(ListError::Ambiguous {
            cell: cell.clone(),
            predicate: name,
        });
    }
    Ok(first)
}
