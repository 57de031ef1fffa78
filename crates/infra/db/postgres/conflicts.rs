use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::repositories::errors::MemberIdTaken;

/// Partial unique index over `members(member_id) WHERE status = 'active'`.
pub const ACTIVE_MEMBER_ID_CONSTRAINT: &str = "members_active_member_id_key";

/// Turns a violation of the active member ID index into `MemberIdTaken`;
/// everything else passes through untouched.
pub fn map_member_id_conflict(err: DieselError, member_id: Option<i32>) -> anyhow::Error {
    let taken = matches!(
        &err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(ACTIVE_MEMBER_ID_CONSTRAINT)
    );

    if taken {
        MemberIdTaken { member_id }.into()
    } else {
        err.into()
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
