use core::fmt;
use std::sync::Arc;

use super::list::StackList;
use super::vocab::{self, XSD};
use crate::eval::operator::Operator;

/// A value that can live on the stack.
///
/// Values are immutable. Equality and ordering come from
/// [`comparator::compare`](super::comparator::compare), never from the
/// in-memory representation, so `"2"^^xsd:integer` and `2` are the same value.
#[derive(Clone)]
pub enum Value {
    Number(Numeric),
    Text(Arc<str>),
    Boolean(bool),
    Resource(ResourceId),
    Literal(Literal),
    List(StackList),
    Operator(Operator),
}

#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Integer(i64),
    Decimal(f64),
}

impl Numeric {
    pub fn as_f64(&self) -> f64 {
        match self {
            Numeric::Integer(i) => *i as f64,
            Numeric::Decimal(d) => *d,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Numeric::Integer(_))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(i) => write!(f, "{}", i),
            Numeric::Decimal(d) if d.is_finite() && d.fract() == 0.0 => write!(f, "{:.1}", d),
            Numeric::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// A resource identifier (IRI or keyword reference).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    pub fn new(identifier: impl AsRef<str>) -> Self {
        Self(Arc::from(identifier.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.as_str() == vocab::RDF_NIL
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A typed or language-tagged literal as it appears in the graph.
#[derive(Debug, Clone)]
pub struct Literal {
    pub lexical: Arc<str>,
    pub datatype: Option<ResourceId>,
    pub language: Option<Arc<str>>,
}

impl Literal {
    pub fn typed(lexical: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Some(ResourceId::new(datatype)),
            language: None,
        }
    }

    pub fn plain(lexical: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: None,
            language: None,
        }
    }

    pub fn tagged(lexical: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: None,
            language: Some(Arc::from(language.as_ref().to_lowercase().as_str())),
        }
    }

    /// The native value this literal denotes, if its datatype is understood.
    ///
    /// Language-tagged literals and unknown datatypes have no native form.
    pub fn normalize(&self) -> Option<Value> {
        if self.language.is_some() {
            return None;
        }
        let lexical = self.lexical.trim();
        let Some(datatype) = &self.datatype else {
            return Some(Value::Text(self.lexical.clone()));
        };
        let local = datatype.as_str().strip_prefix(XSD)?;
        if local == "string" {
            return Some(Value::Text(self.lexical.clone()));
        }
        if local == "boolean" {
            return match lexical {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            };
        }
        if vocab::XSD_INTEGER_TYPES.contains(&local) {
            return lexical
                .trim_start_matches('+')
                .parse::<i64>()
                .ok()
                .map(|i| Value::Number(Numeric::Integer(i)));
        }
        if vocab::XSD_DECIMAL_TYPES.contains(&local) {
            let parsed = match lexical {
                "INF" => Some(f64::INFINITY),
                "-INF" => Some(f64::NEG_INFINITY),
                "NaN" => Some(f64::NAN),
                other => other.parse::<f64>().ok(),
            };
            return parsed.map(|d| Value::Number(Numeric::Decimal(d)));
        }
        None
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape(&self.lexical))?;
        if let Some(language) = &self.language {
            write!(f, "@{}", language)
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^{}", datatype)
        } else {
            Ok(())
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Value {
    pub fn text(s: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(s.as_ref()))
    }

    pub fn resource(identifier: impl AsRef<str>) -> Self {
        Value::Resource(ResourceId::new(identifier))
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(StackList::from_values(items))
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Resource(_) => "resource",
            Value::Literal(_) => "literal",
            Value::List(_) => "list",
            Value::Operator(_) => "operator",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "\"{}\"", escape(s)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Resource(r) => write!(f, "{}", r),
            Value::Literal(l) => write!(f, "{}", l),
            Value::List(l) => write!(f, "{}", l),
            Value::Operator(op) => write!(f, "{}", op),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Numeric::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Number(Numeric::Decimal(d))
    }
}

impl From<Numeric> for Value {
    fn from(n: Numeric) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Arc::from(s.as_str()))
    }
}

impl From<ResourceId> for Value {
    fn from(r: ResourceId) -> Self {
        Value::Resource(r)
    }
}

impl From<Literal> for Value {
    fn from(l: Literal) -> Self {
        Value::Literal(l)
    }
}

impl From<StackList> for Value {
    fn from(l: StackList) -> Self {
        Value::List(l)
    }
}

impl From<Operator> for Value {
    fn from(op: Operator) -> Self {
        Value::Operator(op)
    }
}
