//! ipm::vocab
//!
//! Wire vocabulary of the internal package model graph.
//!
//! Terms are namespace-qualified and stable across versions. Identifier,
//! name, ignore and byte-stream predicates come from the shared package
//! serialization vocabulary.

use crate::core::types::Iri;

/// Internal package model namespace.
pub const IPM_NS: &str = "http://dataconservancy.org/internal-package-model/";

/// Shared package serialization namespace.
pub const PKG_NS: &str = "http://dataconservancy.org/package-serialization/";

pub const IPM_NODE: &str = "http://dataconservancy.org/internal-package-model/IPMNode";
pub const FILE_INFO: &str = "http://dataconservancy.org/internal-package-model/FileInfo";
pub const DOMAIN_OBJECT: &str = "http://dataconservancy.org/internal-package-model/DomainObject";

pub const HAS_PARENT: &str = "http://dataconservancy.org/internal-package-model/hasParent";
pub const HAS_CHILD: &str = "http://dataconservancy.org/internal-package-model/hasChild";
pub const HAS_FILE_INFO: &str = "http://dataconservancy.org/internal-package-model/hasFileInfo";
pub const HAS_DOMAIN_OBJECT: &str =
    "http://dataconservancy.org/internal-package-model/hasDomainObject";
pub const HAS_SUB_TYPE: &str = "http://dataconservancy.org/internal-package-model/hasSubType";
pub const HAS_NODE_TYPE: &str = "http://dataconservancy.org/internal-package-model/hasNodeType";
pub const HAS_LOCATION: &str = "http://dataconservancy.org/internal-package-model/hasLocation";
pub const HAS_FORMAT: &str = "http://dataconservancy.org/internal-package-model/hasFormat";
pub const HAS_SHA1_CHECKSUM: &str =
    "http://dataconservancy.org/internal-package-model/hasSHA1Checksum";
pub const HAS_MD5_CHECKSUM: &str =
    "http://dataconservancy.org/internal-package-model/hasMD5Checksum";
pub const HAS_SIZE: &str = "http://dataconservancy.org/internal-package-model/hasSize";
pub const IS_DIRECTORY: &str = "http://dataconservancy.org/internal-package-model/isDirectory";
pub const HAS_CREATED_DATE: &str =
    "http://dataconservancy.org/internal-package-model/hasCreatedDate";
pub const HAS_MODIFIED_DATE: &str =
    "http://dataconservancy.org/internal-package-model/hasModifiedDate";
pub const IS_ROOT: &str = "http://dataconservancy.org/internal-package-model/isRoot";

pub const HAS_ID: &str = "http://dataconservancy.org/package-serialization/hasId";
pub const HAS_NAME: &str = "http://dataconservancy.org/package-serialization/hasName";
pub const IS_IGNORED: &str = "http://dataconservancy.org/package-serialization/isIgnored";
pub const IS_BYTE_STREAM: &str = "http://dataconservancy.org/package-serialization/isByteStream";

/// Parsed vocabulary terms, built once per transform service.
#[derive(Debug, Clone)]
pub struct Vocab {
    pub ipm_node: Iri,
    pub file_info: Iri,
    pub has_parent: Iri,
    pub has_child: Iri,
    pub has_file_info: Iri,
    pub has_domain_object: Iri,
    pub has_sub_type: Iri,
    pub has_node_type: Iri,
    pub has_location: Iri,
    pub has_format: Iri,
    pub has_sha1_checksum: Iri,
    pub has_md5_checksum: Iri,
    pub has_size: Iri,
    pub is_directory: Iri,
    pub has_created_date: Iri,
    pub has_modified_date: Iri,
    pub is_root: Iri,
    pub has_id: Iri,
    pub has_name: Iri,
    pub is_ignored: Iri,
    pub is_byte_stream: Iri,
}

impl Default for Vocab {
    fn default() -> Self {
        Self {
            ipm_node: Iri::from_static(IPM_NODE),
            file_info: Iri::from_static(FILE_INFO),
            has_parent: Iri::from_static(HAS_PARENT),
            has_child: Iri::from_static(HAS_CHILD),
            has_file_info: Iri::from_static(HAS_FILE_INFO),
            has_domain_object: Iri::from_static(HAS_DOMAIN_OBJECT),
            has_sub_type: Iri::from_static(HAS_SUB_TYPE),
            has_node_type: Iri::from_static(HAS_NODE_TYPE),
            has_location: Iri::from_static(HAS_LOCATION),
            has_format: Iri::from_static(HAS_FORMAT),
            has_sha1_checksum: Iri::from_static(HAS_SHA1_CHECKSUM),
            has_md5_checksum: Iri::from_static(HAS_MD5_CHECKSUM),
            has_size: Iri::from_static(HAS_SIZE),
            is_directory: Iri::from_static(IS_DIRECTORY),
            has_created_date: Iri::from_static(HAS_CREATED_DATE),
            has_modified_date: Iri::from_static(HAS_MODIFIED_DATE),
            is_root: Iri::from_static(IS_ROOT),
            has_id: Iri::from_static(HAS_ID),
            has_name: Iri::from_static(HAS_NAME),
            is_ignored: Iri::from_static(IS_IGNORED),
            is_byte_stream: Iri::from_static(IS_BYTE_STREAM),
        }
    }
}

/// Class given to every domain object the store manages.
pub fn domain_object() -> Iri {
    Iri::from_static(DOMAIN_OBJECT)
}
