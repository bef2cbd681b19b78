//! Operator library: identifier and keyword lookup over loaded operators.
//!
//! The standard library is loaded from the sub-modules below. Each primitive
//! is registered under one identifier per namespace version (the newest
//! first) and under its short keyword, so `dup` and
//! `http://fortytwo.net/2008/08/ripple/stack#dup` name the same operator.

pub mod data;
pub mod etc;
pub mod graph;
pub mod logic;
pub mod math;
pub mod stack;
pub mod stream;

use core::fmt;
use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::eval::Operator;
use crate::model::vocab;

/// Why a binding was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DuplicateIdentifierError {
    #[error("Duplicate identifier: {identifier}")]
    Taken { identifier: String },
    #[error("Identifier listed more than once: {identifier}")]
    Repeated { identifier: String },
    #[error("Operator {operator} has no identifier to register under")]
    Unnamed { operator: String },
}

impl DuplicateIdentifierError {
    /// The identifier that could not be bound, if there was one.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Taken { identifier } | Self::Repeated { identifier } => Some(identifier),
            Self::Unnamed { .. } => None,
        }
    }
}

/// What to do when an identifier is already bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    #[default]
    Reject,
    AllowOverride,
}

#[derive(Clone, Default)]
pub struct Library {
    operators: HashMap<String, Operator>,
    /// keyword -> identifier it resolves to
    keywords: BTreeMap<String, String>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// All standard primitives.
    pub fn standard() -> Result<Self, DuplicateIdentifierError> {
        let mut library = Self::new();
        stack::register(&mut library)?;
        logic::register(&mut library)?;
        data::register(&mut library)?;
        math::register(&mut library)?;
        stream::register(&mut library)?;
        etc::register(&mut library)?;
        graph::register(&mut library)?;
        debug!(
            "standard library loaded: {} identifiers, {} keywords",
            library.operators.len(),
            library.keywords.len()
        );
        Ok(library)
    }

    /// Registers a primitive under all of its own identifiers.
    pub fn register(&mut self, op: impl Into<Operator>) -> Result<(), DuplicateIdentifierError> {
        let op = op.into();
        let identifiers = op.identifiers().to_vec();
        self.register_as(identifiers, op, RegistrationPolicy::Reject)
    }

    /// Binds `op` to every identifier in `identifiers`.
    ///
    /// With [`RegistrationPolicy::Reject`] nothing is bound if any identifier
    /// is taken. A keyword already claimed by another operator keeps its
    /// first binding unless overriding is allowed.
    pub fn register_as(
        &mut self,
        identifiers: Vec<String>,
        op: Operator,
        policy: RegistrationPolicy,
    ) -> Result<(), DuplicateIdentifierError> {
        let Some(canonical) = identifiers.first().cloned() else {
            return Err(DuplicateIdentifierError::Unnamed {
                operator: op.to_string(),
            });
        };
        if policy == RegistrationPolicy::Reject {
            let mut seen = HashSet::with_capacity(identifiers.len());
            for identifier in &identifiers {
                if self.operators.contains_key(identifier) {
                    return Err(DuplicateIdentifierError::Taken {
                        identifier: identifier.clone(),
                    });
                }
                if !seen.insert(identifier.as_str()) {
                    return Err(DuplicateIdentifierError::Repeated {
                        identifier: identifier.clone(),
                    });
                }
            }
        }
        for identifier in identifiers {
            let keyword = vocab::local_name(&identifier).to_string();
            if policy == RegistrationPolicy::AllowOverride && identifier == canonical {
                self.keywords.insert(keyword, canonical.clone());
            } else {
                self.keywords.entry(keyword).or_insert_with(|| canonical.clone());
            }
            self.operators.insert(identifier, op.clone());
        }
        Ok(())
    }

    /// Copies every binding of `other` into this library.
    pub fn merge(
        &mut self,
        other: &Library,
        policy: RegistrationPolicy,
    ) -> Result<(), DuplicateIdentifierError> {
        if policy == RegistrationPolicy::Reject {
            if let Some(taken) = other.operators.keys().find(|id| self.operators.contains_key(*id)) {
                return Err(DuplicateIdentifierError::Taken {
                    identifier: taken.clone(),
                });
            }
        }
        for (identifier, op) in &other.operators {
            self.operators.insert(identifier.clone(), op.clone());
        }
        for (keyword, identifier) in &other.keywords {
            if policy == RegistrationPolicy::AllowOverride {
                self.keywords.insert(keyword.clone(), identifier.clone());
            } else {
                self.keywords
                    .entry(keyword.clone())
                    .or_insert_with(|| identifier.clone());
            }
        }
        Ok(())
    }

    /// Looks up a full identifier first, then a keyword.
    pub fn resolve(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name).or_else(|| {
            self.keywords
                .get(name)
                .and_then(|identifier| self.operators.get(identifier))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// The identifier `name` resolves to, if any.
    pub fn identifier_of(&self, name: &str) -> Option<&str> {
        if let Some((identifier, _)) = self.operators.get_key_value(name) {
            return Some(identifier.as_str());
        }
        self.keywords
            .get(name)
            .filter(|identifier| self.operators.contains_key(*identifier))
            .map(String::as_str)
    }

    /// Removes the binding `name` resolves to.
    ///
    /// A keyword that pointed at the removed identifier falls back to another
    /// identifier with the same local name, if one is still loaded. Dated
    /// namespaces sort by date, so the newest one wins.
    pub fn unregister(&mut self, name: &str) -> Option<Operator> {
        let identifier = self.identifier_of(name)?.to_string();
        let removed = self.operators.remove(&identifier)?;
        let keyword = vocab::local_name(&identifier).to_string();
        if self.keywords.get(&keyword) == Some(&identifier) {
            let fallback = self
                .operators
                .keys()
                .filter(|id| vocab::local_name(id) == keyword)
                .max()
                .cloned();
            match fallback {
                Some(fallback) => {
                    self.keywords.insert(keyword, fallback);
                }
                None => {
                    self.keywords.remove(&keyword);
                }
            }
        }
        debug!("unregistered {}", identifier);
        Some(removed)
    }

    /// Keywords in alphabetical order with the operators they resolve to.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &Operator)> {
        self.keywords.iter().filter_map(|(keyword, identifier)| {
            self.operators
                .get(identifier)
                .map(|op| (keyword.as_str(), op))
        })
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("identifiers", &self.operators.len())
            .field("keywords", &self.keywords.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{solutions, Primitive};
    use crate::model::vocab::STACK_NS;

    fn noop(local: &str) -> Primitive {
        Primitive::new(
            vocab::identifiers(&["urn:a#", "urn:b#"], local),
            "",
            |_, ctx| Ok(solutions::single(ctx)),
        )
    }

    #[test]
    fn test_register_and_resolve_aliases() {
        let mut library = Library::new();
        library.register(noop("x")).unwrap();

        let by_keyword = library.resolve("x").unwrap();
        let by_old = library.resolve("urn:b#x").unwrap();
        assert!(by_keyword.ptr_eq(by_old));
        assert_eq!(library.identifier_of("x"), Some("urn:a#x"));
    }

    #[test]
    fn test_duplicate_is_rejected_atomically() {
        let mut library = Library::new();
        library.register(noop("x")).unwrap();
        let before = library.len();

        let err = library.register(noop("x")).unwrap_err();
        assert_eq!(err.identifier(), Some("urn:a#x"));
        assert_eq!(library.len(), before);
    }

    #[test]
    fn test_register_needs_distinct_identifiers() {
        let mut library = Library::new();

        let err = library
            .register_as(Vec::new(), Operator::from(noop("x")), RegistrationPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, DuplicateIdentifierError::Unnamed { .. }));
        let err = library
            .register_as(Vec::new(), Operator::from(noop("x")), RegistrationPolicy::AllowOverride)
            .unwrap_err();
        assert!(matches!(err, DuplicateIdentifierError::Unnamed { .. }));

        let err = library
            .register_as(
                vec!["urn:u#y".into(), "urn:v#y".into(), "urn:u#y".into()],
                Operator::from(noop("y")),
                RegistrationPolicy::Reject,
            )
            .unwrap_err();
        assert_eq!(
            err,
            DuplicateIdentifierError::Repeated {
                identifier: "urn:u#y".to_string()
            }
        );
        assert!(library.is_empty());
    }

    #[test]
    fn test_keyword_collision_keeps_first() {
        let mut library = Library::new();
        library.register(noop("x")).unwrap();
        let other = Primitive::new(vec!["urn:c#x".to_string()], "", |_, ctx| {
            Ok(solutions::single(ctx))
        });
        library.register(other).unwrap();

        assert_eq!(library.identifier_of("x"), Some("urn:a#x"));
        assert!(library.resolve("urn:c#x").is_some());
    }

    #[test]
    fn test_override_and_unregister() {
        let mut library = Library::new();
        let first = Operator::from(noop("x"));
        let second = Operator::from(noop("x"));
        library
            .register_as(vec!["urn:u#x".into()], first, RegistrationPolicy::Reject)
            .unwrap();
        library
            .register_as(
                vec!["urn:u#x".into()],
                second.clone(),
                RegistrationPolicy::AllowOverride,
            )
            .unwrap();
        assert!(library.resolve("x").unwrap().ptr_eq(&second));

        assert!(library.unregister("x").is_some());
        assert!(library.resolve("x").is_none());
        assert!(library.unregister("x").is_none());
    }

    #[test]
    fn test_standard_library_keywords() {
        let library = Library::standard().unwrap();
        for keyword in ["dup", "swap", "rotate", "each", "unique", "invert", "asin", "links"] {
            assert!(library.contains(keyword), "missing {}", keyword);
        }
        assert!(library.contains(&vocab::identifiers(STACK_NS, "dup")[2]));
    }
}
