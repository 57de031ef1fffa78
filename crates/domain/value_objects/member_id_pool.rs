use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::Serialize;

pub const MIN_MEMBER_ID: i32 = 1;
pub const MAX_MEMBER_ID: i32 = 999;
pub const MEMBER_ID_RANGE: RangeInclusive<i32> = MIN_MEMBER_ID..=MAX_MEMBER_ID;

/// Below this many free IDs the pool status carries a warning.
pub const LOW_POOL_WARNING_THRESHOLD: usize = 50;

pub fn is_in_range(member_id: i32) -> bool {
    MEMBER_ID_RANGE.contains(&member_id)
}

/// Snapshot of the recyclable IDs currently held by active members.
///
/// Allocation is advisory: the partial unique index on active `member_id`
/// values is what finally rejects a double grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberIdPool {
    active_ids: BTreeSet<i32>,
}

impl MemberIdPool {
    pub fn from_active_ids<I>(active_ids: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        Self {
            active_ids: active_ids.into_iter().collect(),
        }
    }

    pub fn is_available(&self, member_id: i32) -> bool {
        is_in_range(member_id) && !self.active_ids.contains(&member_id)
    }

    pub fn next_available_id(&self) -> Option<i32> {
        self.available_ids().next()
    }

    pub fn suggested_ids(&self, count: usize) -> Vec<i32> {
        self.available_ids().take(count).collect()
    }

    pub fn available_ids(&self) -> impl Iterator<Item = i32> + '_ {
        MEMBER_ID_RANGE.filter(|member_id| !self.active_ids.contains(member_id))
    }

    pub fn active_count(&self) -> usize {
        self.active_ids.len()
    }

    pub fn status(&self) -> MemberIdPoolStatus {
        let held_in_range = self
            .active_ids
            .iter()
            .filter(|member_id| is_in_range(**member_id))
            .count();
        let available_count = MEMBER_ID_RANGE.count() - held_in_range;

        MemberIdPoolStatus {
            active_members: self.active_count(),
            available_ids: available_count,
            next_available: self.next_available_id(),
            low_pool_warning: available_count < LOW_POOL_WARNING_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemberIdPoolStatus {
    pub active_members: usize,
    pub available_ids: usize,
    pub next_available: Option<i32>,
    pub low_pool_warning: bool,
}
