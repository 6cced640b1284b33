use std::fmt::{Display, Formatter};

use claimlens_core::{AppError, MemberEmail};

use crate::query::{FilterOperator, FilterPredicate, QuerySpec};

/// Semantic-model dimension holding the member identity.
///
/// Every dispatched query carries exactly one equality predicate on this
/// dimension, bound to the authenticated member.
pub const MEMBER_EMAIL_DIMENSION: &str = "member__email";

/// Structured reason a filter set fails the row-level scope checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolation {
    /// No predicate on the member identity dimension is present.
    MissingScopeFilter,
    /// More than one predicate on the member identity dimension is present.
    DuplicateScopeFilter {
        /// Number of member-scope predicates found.
        count: usize,
    },
    /// The member-scope predicate is not an equality comparison.
    NotEquality {
        /// Operator found on the member-scope predicate.
        operator: FilterOperator,
    },
    /// The member-scope predicate binds a different identity.
    WrongMember {
        /// Identity value found on the predicate.
        found: String,
    },
}

impl Display for ScopeViolation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingScopeFilter => {
                write!(formatter, "no {MEMBER_EMAIL_DIMENSION} predicate present")
            }
            Self::DuplicateScopeFilter { count } => write!(
                formatter,
                "{count} {MEMBER_EMAIL_DIMENSION} predicates present, expected exactly one"
            ),
            Self::NotEquality { operator } => write!(
                formatter,
                "{MEMBER_EMAIL_DIMENSION} predicate uses operator '{}', expected equality",
                operator.as_str()
            ),
            Self::WrongMember { found } => write!(
                formatter,
                "{MEMBER_EMAIL_DIMENSION} predicate binds '{found}' instead of the authenticated member"
            ),
        }
    }
}

impl From<ScopeViolation> for AppError {
    fn from(value: ScopeViolation) -> Self {
        Self::FilterValidationFailed(value.to_string())
    }
}

/// Outcome of row-level filter enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    /// The specification now carries the mandatory member-scope predicate.
    Accepted(QuerySpec),
    /// Enforcement could not produce a valid scope; the query must not be dispatched.
    Rejected(ScopeViolation),
}

/// Binds a query specification to the authenticated member.
///
/// Caller-supplied predicates on the member identity dimension are stripped
/// before the single equality predicate is appended; untrusted input never
/// sets or overrides its own scope. The produced filter set is then
/// re-validated with [`validate_scope`] rather than trusted, so an
/// enforcement bug surfaces here instead of at the backend.
#[must_use]
pub fn enforce(spec: QuerySpec, member: &MemberEmail) -> Enforcement {
    let mut spec = spec;
    spec.filters.retain(|predicate| !predicate.is_member_scope());

    let scope = FilterPredicate::new(
        MEMBER_EMAIL_DIMENSION,
        FilterOperator::Equals,
        member.as_str(),
    );
    match scope {
        Ok(predicate) => spec.filters.push(predicate),
        Err(_) => return Enforcement::Rejected(ScopeViolation::MissingScopeFilter),
    }

    match validate_scope(spec.filters(), member) {
        Ok(()) => Enforcement::Accepted(spec),
        Err(violation) => Enforcement::Rejected(violation),
    }
}

/// Checks a filter set against the row-level scope invariant.
///
/// The set must contain exactly one predicate on the member identity
/// dimension, it must be an equality, and its value must equal the
/// authenticated member identity. Used both by [`enforce`] as its self-check
/// and by audit recording to recompute the violation flag over the filters
/// actually dispatched.
pub fn validate_scope(
    filters: &[FilterPredicate],
    member: &MemberEmail,
) -> Result<(), ScopeViolation> {
    let scoped: Vec<&FilterPredicate> = filters
        .iter()
        .filter(|predicate| predicate.is_member_scope())
        .collect();

    let predicate = match scoped.as_slice() {
        [] => return Err(ScopeViolation::MissingScopeFilter),
        [single] => *single,
        many => {
            return Err(ScopeViolation::DuplicateScopeFilter { count: many.len() });
        }
    };

    if predicate.operator() != FilterOperator::Equals {
        return Err(ScopeViolation::NotEquality {
            operator: predicate.operator(),
        });
    }

    if predicate.value() != member.as_str() {
        return Err(ScopeViolation::WrongMember {
            found: predicate.value().to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use claimlens_core::MemberEmail;
    use proptest::prelude::*;

    use crate::query::{
        Dimension, FilterOperator, FilterPredicate, Metric, OrderBy, OrderTarget, QuerySpec,
    };

    use super::{Enforcement, MEMBER_EMAIL_DIMENSION, ScopeViolation, enforce, validate_scope};

    fn member(value: &str) -> MemberEmail {
        MemberEmail::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn metric(name: &str) -> Metric {
        Metric::new(name).unwrap_or_else(|_| unreachable!())
    }

    fn predicate(dimension: &str, operator: FilterOperator, value: &str) -> FilterPredicate {
        FilterPredicate::new(dimension, operator, value).unwrap_or_else(|_| unreachable!())
    }

    fn spec_with_filters(filters: Vec<FilterPredicate>) -> QuerySpec {
        QuerySpec::new(
            vec![metric("total_claim_amount")],
            vec![Dimension::new("metric_time", None).unwrap_or_else(|_| unreachable!())],
            filters,
            vec![OrderBy::new(
                OrderTarget::Metric("total_claim_amount".to_owned()),
                true,
            )],
            Some(50),
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn accepted(enforcement: Enforcement) -> QuerySpec {
        match enforcement {
            Enforcement::Accepted(spec) => spec,
            Enforcement::Rejected(violation) => {
                unreachable!("expected accepted enforcement, got {violation}")
            }
        }
    }

    #[test]
    fn enforce_appends_single_scope_predicate() {
        let alice = member("a@techcorp.com");
        let spec = accepted(enforce(spec_with_filters(Vec::new()), &alice));

        let scoped: Vec<_> = spec
            .filters()
            .iter()
            .filter(|p| p.is_member_scope())
            .collect();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].operator(), FilterOperator::Equals);
        assert_eq!(scoped[0].value(), "a@techcorp.com");
    }

    #[test]
    fn enforce_overwrites_attacker_supplied_identity() {
        let alice = member("a@techcorp.com");
        let crafted = spec_with_filters(vec![predicate(
            MEMBER_EMAIL_DIMENSION,
            FilterOperator::Equals,
            "someoneelse@techcorp.com",
        )]);

        let spec = accepted(enforce(crafted, &alice));
        assert!(
            spec.filters()
                .iter()
                .all(|p| p.value() != "someoneelse@techcorp.com")
        );
        assert!(validate_scope(spec.filters(), &alice).is_ok());
    }

    #[test]
    fn enforce_is_idempotent() {
        let alice = member("a@techcorp.com");
        let once = accepted(enforce(spec_with_filters(Vec::new()), &alice));
        let twice = accepted(enforce(once.clone(), &alice));
        assert_eq!(once, twice);
    }

    #[test]
    fn enforce_preserves_unrelated_filters() {
        let alice = member("a@techcorp.com");
        let spec = accepted(enforce(
            spec_with_filters(vec![predicate(
                "claim__status",
                FilterOperator::Equals,
                "approved",
            )]),
            &alice,
        ));

        assert!(
            spec.filters()
                .iter()
                .any(|p| p.dimension() == "claim__status" && p.value() == "approved")
        );
        assert_eq!(spec.filters().len(), 2);
    }

    #[test]
    fn validate_scope_rejects_missing_predicate() {
        let alice = member("a@techcorp.com");
        assert_eq!(
            validate_scope(&[], &alice),
            Err(ScopeViolation::MissingScopeFilter)
        );
    }

    #[test]
    fn validate_scope_rejects_duplicates() {
        let alice = member("a@techcorp.com");
        let filters = vec![
            predicate(MEMBER_EMAIL_DIMENSION, FilterOperator::Equals, "a@techcorp.com"),
            predicate(MEMBER_EMAIL_DIMENSION, FilterOperator::Equals, "a@techcorp.com"),
        ];
        assert_eq!(
            validate_scope(&filters, &alice),
            Err(ScopeViolation::DuplicateScopeFilter { count: 2 })
        );
    }

    #[test]
    fn validate_scope_rejects_non_equality() {
        let alice = member("a@techcorp.com");
        let filters = vec![predicate(
            MEMBER_EMAIL_DIMENSION,
            FilterOperator::In,
            "a@techcorp.com",
        )];
        assert_eq!(
            validate_scope(&filters, &alice),
            Err(ScopeViolation::NotEquality {
                operator: FilterOperator::In
            })
        );
    }

    #[test]
    fn validate_scope_rejects_wrong_member() {
        let alice = member("a@techcorp.com");
        let filters = vec![predicate(
            MEMBER_EMAIL_DIMENSION,
            FilterOperator::Equals,
            "b@techcorp.com",
        )];
        assert_eq!(
            validate_scope(&filters, &alice),
            Err(ScopeViolation::WrongMember {
                found: "b@techcorp.com".to_owned()
            })
        );
    }

    fn arbitrary_operator() -> impl Strategy<Value = FilterOperator> {
        prop_oneof![
            Just(FilterOperator::Equals),
            Just(FilterOperator::NotEquals),
            Just(FilterOperator::GreaterThan),
            Just(FilterOperator::LessThan),
            Just(FilterOperator::In),
            Just(FilterOperator::Contains),
        ]
    }

    fn arbitrary_filter() -> impl Strategy<Value = FilterPredicate> {
        (
            prop_oneof![
                Just(MEMBER_EMAIL_DIMENSION.to_owned()),
                "[a-z][a-z_]{1,20}",
            ],
            arbitrary_operator(),
            "[a-z0-9@._-]{0,30}",
        )
            .prop_map(|(dimension, operator, value)| {
                FilterPredicate::new(dimension, operator, value)
                    .unwrap_or_else(|_| unreachable!())
            })
    }

    proptest! {
        #[test]
        fn enforcement_always_yields_exactly_one_valid_scope_predicate(
            filters in proptest::collection::vec(arbitrary_filter(), 0..8)
        ) {
            let alice = member("a@techcorp.com");
            let spec = accepted(enforce(spec_with_filters(filters), &alice));

            prop_assert!(validate_scope(spec.filters(), &alice).is_ok());
            let scoped = spec
                .filters()
                .iter()
                .filter(|p| p.is_member_scope())
                .count();
            prop_assert_eq!(scoped, 1);
        }

        #[test]
        fn enforcement_preserves_every_non_scope_predicate(
            filters in proptest::collection::vec(arbitrary_filter(), 0..8)
        ) {
            let alice = member("a@techcorp.com");
            let expected: Vec<FilterPredicate> = filters
                .iter()
                .filter(|p| !p.is_member_scope())
                .cloned()
                .collect();

            let spec = accepted(enforce(spec_with_filters(filters), &alice));
            let kept: Vec<FilterPredicate> = spec
                .filters()
                .iter()
                .filter(|p| !p.is_member_scope())
                .cloned()
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
