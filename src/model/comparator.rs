//! The single source of truth for value identity.
//!
//! Values are first brought to a canonical form (literals with a known
//! datatype become native numbers, booleans or text; `rdf:nil` becomes the
//! empty list) and then ordered by variant rank:
//!
//! ```text
//! Boolean < Number < Text < Literal < Resource < List < Operator
//! ```
//!
//! Within a variant: `false < true`; numbers compare by exact numeric value,
//! with `-0.0` equal to `0` (mixed integer/decimal pairs never go through a
//! lossy `f64` conversion); text, resources
//! and literals compare by their lexical parts; lists compare element-wise with
//! a shorter prefix first; operators compare by kind and then by canonical
//! identifier or structure.

use std::borrow::Cow;
use std::cmp::Ordering;

use super::list::StackList;
use super::value::{Numeric, Value};
use crate::eval::operator::{Operator, OperatorKind};

pub fn compare(a: &Value, b: &Value) -> Ordering {
    let a = canonical(a);
    let b = canonical(b);
    match (a.as_ref(), b.as_ref()) {
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Literal(x), Value::Literal(y)) => x
            .lexical
            .cmp(&y.lexical)
            .then_with(|| x.datatype.cmp(&y.datatype))
            .then_with(|| x.language.cmp(&y.language)),
        (Value::Resource(x), Value::Resource(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => compare_lists(x, y),
        (Value::Operator(x), Value::Operator(y)) => compare_operators(x, y),
        (x, y) => rank(x).cmp(&rank(y)),
    }
}

pub fn equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Ordering::Equal
}

pub fn compare_numbers(a: &Numeric, b: &Numeric) -> Ordering {
    match (a, b) {
        (Numeric::Integer(x), Numeric::Integer(y)) => x.cmp(y),
        (Numeric::Decimal(x), Numeric::Decimal(y)) => {
            unsigned_zero(*x).total_cmp(&unsigned_zero(*y))
        }
        (Numeric::Integer(x), Numeric::Decimal(y)) => compare_integer_decimal(*x, *y),
        (Numeric::Decimal(x), Numeric::Integer(y)) => compare_integer_decimal(*y, *x).reverse(),
    }
}

/// `-0.0 + 0.0` is `+0.0`; every other value is unchanged.
fn unsigned_zero(x: f64) -> f64 {
    x + 0.0
}

/// Orders an integer against a decimal without rounding the integer.
///
/// NaN sorts where `total_cmp` puts it: above everything when positive,
/// below everything when negative.
fn compare_integer_decimal(i: i64, d: f64) -> Ordering {
    if d.is_nan() {
        return if d.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    // Saturating cast; the i64 range is far inside i128's.
    let whole = d.trunc();
    (i as i128).cmp(&(whole as i128)).then_with(|| {
        let fraction = d - whole;
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

pub fn compare_lists(a: &StackList, b: &StackList) -> Ordering {
    let mut left = a.iter();
    let mut right = b.iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

pub fn compare_operators(a: &Operator, b: &Operator) -> Ordering {
    match (a.kind(), b.kind()) {
        (OperatorKind::Primitive(x), OperatorKind::Primitive(y)) => {
            x.identifier().cmp(y.identifier())
        }
        (OperatorKind::Composed { steps: x, .. }, OperatorKind::Composed { steps: y, .. }) => {
            let mut left = x.iter();
            let mut right = y.iter();
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(p), Some(q)) => match compare_operators(p, q) {
                        Ordering::Equal => continue,
                        other => return other,
                    },
                }
            }
        }
        (
            OperatorKind::Inverted { original: x, .. },
            OperatorKind::Inverted { original: y, .. },
        ) => compare_operators(x, y),
        (OperatorKind::Constant(x), OperatorKind::Constant(y)) => compare(x, y),
        (x, y) => operator_rank(x).cmp(&operator_rank(y)),
    }
}

fn canonical(value: &Value) -> Cow<'_, Value> {
    match value {
        Value::Literal(literal) => match literal.normalize() {
            Some(native) => Cow::Owned(native),
            None => Cow::Borrowed(value),
        },
        Value::Resource(r) if r.is_nil() => Cow::Owned(Value::List(StackList::nil())),
        _ => Cow::Borrowed(value),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Boolean(_) => 0,
        Value::Number(_) => 1,
        Value::Text(_) => 2,
        Value::Literal(_) => 3,
        Value::Resource(_) => 4,
        Value::List(_) => 5,
        Value::Operator(_) => 6,
    }
}

fn operator_rank(kind: &OperatorKind) -> u8 {
    match kind {
        OperatorKind::Primitive(_) => 0,
        OperatorKind::Composed { .. } => 1,
        OperatorKind::Inverted { .. } => 2,
        OperatorKind::Constant(_) => 3,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialEq for StackList {
    fn eq(&self, other: &Self) -> bool {
        compare_lists(self, other) == Ordering::Equal
    }
}

impl Eq for StackList {}

impl PartialOrd for StackList {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StackList {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_lists(self, other)
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        compare_operators(self, other) == Ordering::Equal
    }
}

impl Eq for Operator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Literal;
    use crate::model::vocab::{RDF_NIL, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};
    use proptest::prelude::*;

    #[test]
    fn test_cross_representation_equality() {
        assert!(equal(
            &Value::Literal(Literal::typed("01", XSD_INTEGER)),
            &Value::from(1)
        ));
        assert!(equal(
            &Value::Literal(Literal::typed("1", XSD_INTEGER)),
            &Value::Literal(Literal::typed("1.0", XSD_DOUBLE))
        ));
        assert!(equal(
            &Value::Literal(Literal::typed("abc", XSD_STRING)),
            &Value::from("abc")
        ));
        assert!(equal(
            &Value::Literal(Literal::typed("true", XSD_BOOLEAN)),
            &Value::from(true)
        ));
        assert!(equal(&Value::resource(RDF_NIL), &Value::list(vec![])));
    }

    #[test]
    fn test_variant_order() {
        let ordered = vec![
            Value::from(false),
            Value::from(-3),
            Value::from("text"),
            Value::Literal(Literal::tagged("chat", "fr")),
            Value::resource("http://example.org/a"),
            Value::list(vec![Value::from(1)]),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(compare(&pair[0], &pair[1]), Ordering::Less, "{:?}", pair);
        }
    }

    #[test]
    fn test_list_prefix_is_smaller() {
        let short = Value::list(vec![Value::from(1)]);
        let long = Value::list(vec![Value::from(1), Value::from(0)]);
        assert_eq!(compare(&short, &long), Ordering::Less);
        assert_eq!(
            compare(
                &Value::list(vec![Value::from(1), Value::from(2)]),
                &Value::list(vec![Value::from(2), Value::from(1)])
            ),
            Ordering::Less
        );
    }

    const TWO_53: i64 = 1 << 53;

    #[test]
    fn test_large_integers_against_decimals() {
        let a = Value::from(TWO_53);
        let b = Value::from(TWO_53 as f64);
        let c = Value::from(TWO_53 + 1);
        assert_eq!(compare(&a, &b), Ordering::Equal);
        assert_eq!(compare(&b, &c), Ordering::Less);
        assert_eq!(compare(&a, &c), Ordering::Less);
        let max = Value::from(i64::MAX);
        assert_eq!(compare(&max, &Value::from(i64::MAX as f64)), Ordering::Less);
        let min = Value::from(i64::MIN);
        assert_eq!(compare(&min, &Value::from(i64::MIN as f64)), Ordering::Equal);
    }

    #[test]
    fn test_signed_zero_and_fractions() {
        assert!(equal(&Value::from(0), &Value::from(-0.0)));
        assert!(equal(&Value::from(0.0), &Value::from(-0.0)));
        assert_eq!(compare(&Value::from(-1), &Value::from(-0.5)), Ordering::Less);
        assert_eq!(compare(&Value::from(2), &Value::from(1.5)), Ordering::Greater);
        assert_eq!(compare(&Value::from(3), &Value::from(f64::INFINITY)), Ordering::Less);
        assert_eq!(compare(&Value::from(3), &Value::from(f64::NEG_INFINITY)), Ordering::Greater);
        assert_eq!(compare(&Value::from(3), &Value::from(f64::NAN)), Ordering::Less);
    }

    fn number_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-4i64..4).prop_map(|d| Value::from(TWO_53 + d)),
            (-4i64..4).prop_map(|d| Value::from((TWO_53 + d) as f64)),
            (-3i64..3).prop_map(Value::from),
            (-12i64..12).prop_map(|i| Value::from(i as f64 / 4.0)),
            Just(Value::from(-0.0)),
            Just(Value::from(i64::MAX)),
            Just(Value::from(i64::MAX as f64)),
        ]
    }

    fn leaf_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            (-1000i64..1000).prop_map(Value::from),
            (-1000i64..1000).prop_map(|i| Value::from(i as f64 / 4.0)),
            "[a-c]{0,3}".prop_map(|s| Value::from(s.as_str())),
            (-1000i64..1000)
                .prop_map(|i| Value::Literal(Literal::typed(i.to_string(), XSD_INTEGER))),
            "[a-c]{0,3}".prop_map(|s| Value::Literal(Literal::typed(s, XSD_STRING))),
            "[a-c]{0,3}".prop_map(|s| Value::Literal(Literal::tagged(s, "en"))),
            "[a-c]{1,3}".prop_map(|s| Value::resource(format!("http://example.org/{}", s))),
            Just(Value::resource(RDF_NIL)),
            number_value(),
        ]
    }

    fn any_value() -> impl Strategy<Value = Value> {
        leaf_value().prop_recursive(2, 8, 3, |inner| {
            prop::collection::vec(inner, 0..3).prop_map(Value::list)
        })
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(a in any_value(), b in any_value()) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }

        #[test]
        fn prop_equality_matches_compare(a in any_value(), b in any_value()) {
            prop_assert_eq!(compare(&a, &b) == Ordering::Equal, a == b);
            prop_assert_eq!(equal(&a, &b), a == b);
        }

        #[test]
        fn prop_number_order_is_transitive(
            a in number_value(),
            b in number_value(),
            c in number_value(),
        ) {
            let mut sorted = vec![a, b, c];
            sorted.sort_by(compare);
            prop_assert_ne!(compare(&sorted[0], &sorted[1]), Ordering::Greater);
            prop_assert_ne!(compare(&sorted[1], &sorted[2]), Ordering::Greater);
            prop_assert_ne!(compare(&sorted[0], &sorted[2]), Ordering::Greater);
            if equal(&sorted[0], &sorted[1]) && equal(&sorted[1], &sorted[2]) {
                prop_assert!(equal(&sorted[0], &sorted[2]));
            }
        }

        #[test]
        fn prop_compare_is_transitive(a in any_value(), b in any_value(), c in any_value()) {
            if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(compare(&a, &c), Ordering::Greater);
            }
        }

        #[test]
        fn prop_compare_is_reflexive(a in any_value()) {
            prop_assert_eq!(compare(&a, &a.clone()), Ordering::Equal);
        }
    }
}
