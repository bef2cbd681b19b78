use core::fmt;
use std::sync::Arc;

use super::value::Value;

/// Immutable singly-linked list with structural sharing.
///
/// Used both for stacks (the first element is the top of the stack) and for
/// list values. Cells are reference counted and only ever prepended, so there
/// are no cycles and any number of contexts can share a tail.
#[derive(Clone, Default)]
pub struct StackList {
    head: Option<Arc<Cell>>,
}

struct Cell {
    first: Value,
    rest: StackList,
    len: usize,
}

impl StackList {
    pub fn nil() -> Self {
        Self { head: None }
    }

    /// Builds a list whose first element is the first item of `values`.
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        let items: Vec<Value> = values.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(StackList::nil(), |list, value| list.push(value))
    }

    pub fn push(&self, value: Value) -> Self {
        Self {
            head: Some(Arc::new(Cell {
                first: value,
                rest: self.clone(),
                len: self.len() + 1,
            })),
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.head.as_ref().map(|cell| &cell.first)
    }

    pub fn rest(&self) -> Option<&StackList> {
        self.head.as_ref().map(|cell| &cell.rest)
    }

    /// Splits off the first element, sharing the tail.
    pub fn uncons(&self) -> Option<(Value, StackList)> {
        self.head
            .as_ref()
            .map(|cell| (cell.first.clone(), cell.rest.clone()))
    }

    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |cell| cell.len)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { next: self }
    }

    pub fn reverse(&self) -> Self {
        self.iter()
            .fold(StackList::nil(), |list, value| list.push(value.clone()))
    }

    /// True when both lists are the same cell (or both empty).
    pub fn ptr_eq(&self, other: &StackList) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Renders a stack bottom-first, the way solutions are shown to users.
    pub fn display_stack(&self) -> String {
        let items: Vec<String> = self.reverse().iter().map(|v| v.to_string()).collect();
        items.join(" ")
    }
}

// Drop cells iteratively; the default recursive drop overflows on long lists.
impl Drop for StackList {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cell) => next = cell.rest.head.take(),
                Err(_) => break,
            }
        }
    }
}

pub struct Iter<'a> {
    next: &'a StackList,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next.head.as_ref()?;
        self.next = &cell.rest;
        Some(&cell.first)
    }
}

impl<'a> IntoIterator for &'a StackList {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator; clones each element and keeps only the remaining tail.
pub struct IntoIter {
    next: StackList,
}

impl Iterator for IntoIter {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.next.uncons()?;
        self.next = rest;
        Some(first)
    }
}

impl IntoIterator for StackList {
    type Item = Value;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { next: self }
    }
}

impl FromIterator<Value> for StackList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        StackList::from_values(iter)
    }
}

impl fmt::Display for StackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for StackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
