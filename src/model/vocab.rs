//! Namespace and datatype identifiers shared by the value model and the
//! primitive libraries.
//!
//! Library namespaces are versioned. The newest namespace is canonical and the
//! older ones are kept as aliases so that programs written against an earlier
//! vocabulary still resolve.

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// xsd types whose lexical form is an integer.
pub const XSD_INTEGER_TYPES: &[&str] = &[
    "integer",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "negativeInteger",
    "positiveInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

/// xsd types whose lexical form is a floating point or decimal number.
pub const XSD_DECIMAL_TYPES: &[&str] = &["decimal", "double", "float"];

/// Namespace for keywords bound interactively through `@define`.
pub const USER_NS: &str = "urn:ripple:user#";

pub const STACK_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/stack#",
    "http://fortytwo.net/2008/08/ripple/stack#",
    "http://fortytwo.net/2007/08/ripple/stack#",
];

pub const LOGIC_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/logic#",
    "http://fortytwo.net/2008/08/ripple/logic#",
];

pub const DATA_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/data#",
    "http://fortytwo.net/2008/08/ripple/graph#",
    "http://fortytwo.net/2007/08/ripple/graph#",
];

pub const MATH_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/math#",
    "http://fortytwo.net/2008/08/ripple/math#",
    "http://fortytwo.net/2007/08/ripple/math#",
];

pub const STREAM_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/stream#",
    "http://fortytwo.net/2008/08/ripple/stream#",
];

pub const ETC_NS: &[&str] = &[
    "http://fortytwo.net/2013/03/ripple/etc#",
    "http://fortytwo.net/2008/08/ripple/etc#",
];

pub const GRAPH_NS: &[&str] = &["http://fortytwo.net/2013/03/ripple/graph#"];

/// Returns the part of an identifier after its last `#` or `/`.
pub fn local_name(identifier: &str) -> &str {
    identifier
        .rfind(['#', '/'])
        .map(|i| &identifier[i + 1..])
        .unwrap_or(identifier)
}

/// Expands a local name into one identifier per namespace version, canonical first.
pub fn identifiers(namespaces: &[&str], local: &str) -> Vec<String> {
    namespaces
        .iter()
        .map(|ns| format!("{}{}", ns, local))
        .collect()
}

/// Canonical (newest namespace) identifier for a local name.
pub fn canonical(namespaces: &[&str], local: &str) -> String {
    format!("{}{}", namespaces[0], local)
}
