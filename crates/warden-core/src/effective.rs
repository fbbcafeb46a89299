//! Effective permission aggregation.

use std::collections::HashSet;

use uuid::Uuid;

use crate::Permission;

/// Computes the effective permissions of a service account.
///
/// The result is every permission attached to the account's base role or to
/// any of its bound roles. The union is neither deduplicated nor ordered;
/// callers only test membership through [`crate::is_present`].
pub fn effective_permissions<I>(
    base_role_id: Uuid,
    bound_role_ids: &[Uuid],
    attachments: I,
) -> Vec<Permission>
where
    I: IntoIterator<Item = (Uuid, Permission)>,
{
    let reachable: HashSet<Uuid> = bound_role_ids
        .iter()
        .copied()
        .chain(std::iter::once(base_role_id))
        .collect();

    attachments
        .into_iter()
        .filter(|(role_id, _)| reachable.contains(role_id))
        .map(|(_, permission)| permission)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_permission;

    #[test]
    fn unions_base_and_bound_roles() {
        let base = Uuid::new_v4();
        let bound = Uuid::new_v4();
        let unrelated = Uuid::new_v4();

        let attachments = vec![
            (base, build_permission("a::Owner::x::*").unwrap()),
            (bound, build_permission("b::Lender::y::p").unwrap()),
            (unrelated, build_permission("c::Owner::z::*").unwrap()),
            (bound, build_permission("a::Owner::x::*").unwrap()),
        ];

        let effective = effective_permissions(base, &[bound], attachments);
        let rendered: Vec<String> = effective.iter().map(ToString::to_string).collect();

        assert_eq!(rendered.len(), 3);
        assert!(rendered.contains(&"b::Lender::y::p".to_owned()));
        assert!(!rendered.contains(&"c::Owner::z::*".to_owned()));
        assert_eq!(rendered.iter().filter(|p| *p == "a::Owner::x::*").count(), 2);
    }

    #[test]
    fn base_role_without_bindings() {
        let base = Uuid::new_v4();
        let effective = effective_permissions(
            base,
            &[],
            [(base, build_permission("a::Lender::x::*").unwrap())],
        );
        assert_eq!(effective.len(), 1);
    }
}
