//! rdf::vocab
//!
//! RDF and XML Schema terms used by the graph layer.

use crate::core::types::Iri;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";

pub fn rdf_type() -> Iri {
    Iri::from_static(RDF_TYPE)
}

pub fn rdf_first() -> Iri {
    Iri::from_static(RDF_FIRST)
}

pub fn rdf_rest() -> Iri {
    Iri::from_static(RDF_REST)
}

pub fn rdf_nil() -> Iri {
    Iri::from_static(RDF_NIL)
}

pub fn rdf_lang_string() -> Iri {
    Iri::from_static(RDF_LANG_STRING)
}

pub fn xsd_string() -> Iri {
    Iri::from_static(XSD_STRING)
}

pub fn xsd_boolean() -> Iri {
    Iri::from_static(XSD_BOOLEAN)
}

pub fn xsd_long() -> Iri {
    Iri::from_static(XSD_LONG)
}

pub fn xsd_date_time() -> Iri {
    Iri::from_static(XSD_DATE_TIME)
}

pub fn xsd_any_uri() -> Iri {
    Iri::from_static(XSD_ANY_URI)
}
