//! Permission implication.

use super::Permission;
use crate::TRACING_TARGET_PERMISSION;

impl Permission {
    /// Returns whether holding `held` grants `self`.
    ///
    /// Services and actions must match exactly, the held level must be at
    /// least the requested one, and the held resource must cover the
    /// requested resource.
    pub fn is_satisfied_by(&self, held: &Permission) -> bool {
        held.service() == self.service()
            && held.action() == self.action()
            && held.ownership_level().implies(self.ownership_level())
            && held.resource().covers(self.resource())
    }
}

/// Returns whether any permission in `held` grants `requested`.
///
/// This is a pure allow-list: there are no deny rules and each requested
/// permission is evaluated independently.
pub fn is_present<'a, I>(held: I, requested: &Permission) -> bool
where
    I: IntoIterator<Item = &'a Permission>,
{
    let granted = held
        .into_iter()
        .any(|permission| requested.is_satisfied_by(permission));

    tracing::trace!(
        target: TRACING_TARGET_PERMISSION,
        permission = %requested,
        granted,
        "evaluated permission",
    );

    granted
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{OwnershipLevel, build_permission};

    fn p(s: &str) -> Permission {
        build_permission(s).unwrap()
    }

    #[test]
    fn resource_hierarchy() {
        let held = vec![p("iam::Owner::read::dc/region")];
        assert!(is_present(&held, &p("iam::Owner::read::dc/region")));
        assert!(is_present(&held, &p("iam::Owner::read::dc/region/zone1")));
        assert!(!is_present(&held, &p("iam::Owner::read::dc/region2")));
        assert!(!is_present(&held, &p("iam::Owner::read::dc")));
    }

    #[test]
    fn wildcard_grants_any_resource() {
        let held = vec![p("iam::Lender::read::*")];
        assert!(is_present(&held, &p("iam::Lender::read::dc/region")));
        assert!(is_present(&held, &p("iam::Lender::read::*")));
        assert!(!is_present(&held, &p("iam::Lender::write::dc")));
        assert!(!is_present(&held, &p("other::Lender::read::dc")));
    }

    #[test]
    fn ownership_monotonicity() {
        let owner = vec![p("iam::Owner::read::dc")];
        let lender = vec![p("iam::Lender::read::dc")];
        assert!(is_present(&owner, &p("iam::Lender::read::dc")));
        assert!(is_present(&lender, &p("iam::Lender::read::dc")));
        assert!(!is_present(&lender, &p("iam::Owner::read::dc")));
    }

    #[test]
    fn empty_set_grants_nothing() {
        assert!(!is_present(&Vec::<Permission>::new(), &p("iam::Lender::read::*")));
    }

    fn permission() -> impl Strategy<Value = Permission> {
        (
            "[a-z]{1,6}",
            prop_oneof![Just(OwnershipLevel::Lender), Just(OwnershipLevel::Owner)],
            "[a-z]{1,6}",
            prop_oneof![
                Just("*".to_owned()),
                prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(|s| s.join("/")),
            ],
        )
            .prop_map(|(service, level, action, resource)| {
                Permission::new(service, level, action, resource).unwrap()
            })
    }

    proptest! {
        #[test]
        fn reflexive(permission in permission()) {
            prop_assert!(is_present([&permission], &permission));
        }

        #[test]
        fn owner_implies_every_level(permission in permission()) {
            let held = permission.to_owner();
            for level in [OwnershipLevel::Lender, OwnershipLevel::Owner] {
                prop_assert!(is_present([&held], &permission.with_ownership_level(level)));
            }
        }

        #[test]
        fn child_of_held_resource_is_granted(permission in permission(), child in "[a-z]{1,4}") {
            let requested = Permission::new(
                permission.service(),
                permission.ownership_level(),
                permission.action(),
                format!("{}/{child}", permission.resource()),
            )
            .unwrap();
            prop_assert!(is_present([&permission], &requested));
        }
    }
}
