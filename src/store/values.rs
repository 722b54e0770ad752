//! store::values
//!
//! Mapping between property values and graph terms.
//!
//! Scalars become literals (URIs become resources). A complex value becomes
//! a blank node carrying one statement per sub-property.

use tracing::warn;

use crate::core::profile::{PropertyType, PropertyValueType, ProfileRegistry};
use crate::core::property::{PropertyData, PropertyValue};
use crate::core::types::PropertyTypeId;
use crate::rdf::{Graph, Literal, Resource, Term};

/// Write `data` into the graph and return the term to link it with.
pub(crate) fn encode(graph: &mut Graph, data: &PropertyData) -> Term {
    match data {
        PropertyData::String(s) => Literal::string(s.clone()).into(),
        PropertyData::Long(n) => Literal::long(*n).into(),
        PropertyData::Boolean(b) => Literal::boolean(*b).into(),
        PropertyData::DateTime(t) => Literal::date_time(*t).into(),
        PropertyData::Uri(iri) => iri.clone().into(),
        PropertyData::Complex(parts) => {
            let node = graph.new_blank();
            for part in parts {
                let term = encode(graph, part.data());
                graph.insert(node.clone(), part.property_type().as_iri().clone(), term);
            }
            node.into()
        }
    }
}

/// The term a scalar value encodes to, without touching the graph.
///
/// Returns `None` for complex values, whose blank node label is not known
/// in advance.
pub(crate) fn scalar_term(data: &PropertyData) -> Option<Term> {
    match data {
        PropertyData::Complex(_) => None,
        other => {
            let mut scratch = Graph::new();
            Some(encode(&mut scratch, other))
        }
    }
}

/// Read a term back as a value of `property_type`.
///
/// Returns `None` (and logs) when the term does not fit the declared kind.
pub(crate) fn decode(
    graph: &Graph,
    registry: &ProfileRegistry,
    property_type: &PropertyType,
    term: &Term,
) -> Option<PropertyValue> {
    let data = match (property_type.value_type, term) {
        (PropertyValueType::String, Term::Literal(l)) => Some(PropertyData::String(l.lexical().to_string())),
        (PropertyValueType::Long, Term::Literal(l)) => l.as_i64().map(PropertyData::Long),
        (PropertyValueType::Boolean, Term::Literal(l)) => l.as_bool().map(PropertyData::Boolean),
        (PropertyValueType::DateTime, Term::Literal(l)) => {
            l.as_date_time().map(PropertyData::DateTime)
        }
        (PropertyValueType::Uri, Term::Resource(Resource::Iri(iri))) => {
            Some(PropertyData::Uri(iri.clone()))
        }
        (PropertyValueType::Complex, Term::Resource(node @ Resource::Blank(_))) => {
            Some(PropertyData::Complex(decode_parts(graph, registry, node)))
        }
        _ => None,
    };

    if data.is_none() {
        warn!(
            property_type = %property_type.id,
            ?term,
            "stored value does not match its property type, skipping"
        );
    }
    data.map(|d| PropertyValue::new(property_type.id.clone(), d))
}

fn decode_parts(graph: &Graph, registry: &ProfileRegistry, node: &Resource) -> Vec<PropertyValue> {
    graph
        .statements_about(node)
        .iter()
        .filter_map(|(predicate, term)| {
            let pt = registry.property_type(&PropertyTypeId::from(predicate.clone()))?;
            decode(graph, registry, pt, term)
        })
        .collect()
}

/// Remove a complex value's blank node and everything nested under it.
pub(crate) fn remove_nested(graph: &mut Graph, term: &Term) {
    let Term::Resource(node @ Resource::Blank(_)) = term else {
        return;
    };
    let nested: Vec<Term> = graph
        .statements_about(node)
        .iter()
        .map(|(_, o)| o.clone())
        .collect();
    graph.remove_subject(node);
    for child in &nested {
        remove_nested(graph, child);
    }
}
