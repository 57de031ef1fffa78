use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::members::MemberEntity,
    value_objects::{contact::normalize_optional, members::MemberDto},
};

/// Why an existing member looks like the one being entered. Checked in
/// declaration order; the first hit wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Name,
    Phone,
    Email,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Name => "name",
            MatchReason::Phone => "phone",
            MatchReason::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DuplicateCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl DuplicateCandidate {
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: normalize_optional(self.email),
            phone: normalize_optional(self.phone),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub member: MemberEntity,
    pub match_reason: MatchReason,
    pub match_text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DuplicateMatchDto {
    pub member: MemberDto,
    pub match_reason: MatchReason,
    pub match_text: String,
}

impl From<DuplicateMatch> for DuplicateMatchDto {
    fn from(value: DuplicateMatch) -> Self {
        Self {
            member: MemberDto::from(value.member),
            match_reason: value.match_reason,
            match_text: value.match_text,
        }
    }
}

/// Classifies `existing` members against `candidate`. Members of every status
/// are considered and each appears at most once.
pub fn find_duplicates(candidate: &DuplicateCandidate, existing: &[MemberEntity]) -> Vec<DuplicateMatch> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut matches = Vec::new();

    if !candidate.first_name.is_empty() && !candidate.last_name.is_empty() {
        let name_text = format!("{} {}", candidate.first_name, candidate.last_name);
        collect_matches(&mut matches, &mut seen, existing, MatchReason::Name, &name_text, |member| {
            eq_ignore_case(&member.first_name, &candidate.first_name)
                && eq_ignore_case(&member.last_name, &candidate.last_name)
        });
    }

    if let Some(phone) = candidate.phone.as_deref() {
        collect_matches(&mut matches, &mut seen, existing, MatchReason::Phone, phone, |member| {
            member.home_phone.as_deref().map(str::trim) == Some(phone)
        });
    }

    if let Some(email) = candidate.email.as_deref() {
        collect_matches(&mut matches, &mut seen, existing, MatchReason::Email, email, |member| {
            member
                .email
                .as_deref()
                .is_some_and(|existing| eq_ignore_case(existing, email))
        });
    }

    matches
}

fn collect_matches<F>(
    matches: &mut Vec<DuplicateMatch>,
    seen: &mut HashSet<Uuid>,
    existing: &[MemberEntity],
    reason: MatchReason,
    match_text: &str,
    predicate: F,
) where
    F: Fn(&MemberEntity) -> bool,
{
    for member in existing.iter().filter(|member| predicate(member)) {
        if seen.insert(member.member_uuid) {
            matches.push(DuplicateMatch {
                member: member.clone(),
                match_reason: reason,
                match_text: match_text.to_string(),
            });
        }
    }
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}
