use uuid::Uuid;

use crate::auth::claims::Claims;

/// Owner narrowing applied to every list/aggregate query.
///
/// Non-admin callers are always forced onto their own records; an admin may
/// optionally narrow to one owner, otherwise sees everything. This is the one
/// place the scoping rule lives, so it is testable without a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    All,
    One(Uuid),
}

impl OwnerScope {
    pub fn resolve(claims: &Claims, requested: Option<Uuid>) -> Self {
        if claims.is_admin() {
            match requested {
                Some(owner) => OwnerScope::One(owner),
                None => OwnerScope::All,
            }
        } else {
            OwnerScope::One(claims.sub)
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        match self {
            OwnerScope::All => None,
            OwnerScope::One(id) => Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{test_claims, Role};

    #[test]
    fn non_admin_is_forced_to_own_records() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        for role in [Role::Staff, Role::Accountant] {
            let claims = test_claims(me, role);
            // A caller-supplied owner filter must not widen the scope.
            assert_eq!(
                OwnerScope::resolve(&claims, Some(other)),
                OwnerScope::One(me)
            );
            assert_eq!(OwnerScope::resolve(&claims, None), OwnerScope::One(me));
        }
    }

    #[test]
    fn admin_sees_all_by_default() {
        let claims = test_claims(Uuid::new_v4(), Role::Admin);
        assert_eq!(OwnerScope::resolve(&claims, None), OwnerScope::All);
    }

    #[test]
    fn admin_may_narrow_to_one_owner() {
        let target = Uuid::new_v4();
        let claims = test_claims(Uuid::new_v4(), Role::Admin);
        assert_eq!(
            OwnerScope::resolve(&claims, Some(target)),
            OwnerScope::One(target)
        );
    }
}
