//! Staff records, busy flags, and tiered selection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::tier::StaffTier;

/// Errors raised by roster construction and release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// Two members share the same id.
    #[error("duplicate staff id: {0}")]
    DuplicateId(String),

    /// A claim refers to a member that is not on this roster.
    #[error("unknown staff member: {0}")]
    UnknownMember(String),

    /// Release of a member that is already free (double release).
    #[error("staff member {0} is not busy")]
    NotBusy(String),

    /// The member is busy under a different claim.
    #[error("claim on staff member {0} is no longer held")]
    StaleClaim(String),
}

/// A single staff record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub tier: StaffTier,
    /// Only the roster's owner flips this, through claim and release.
    pub busy: bool,
}

impl StaffMember {
    pub fn new(id: impl Into<String>, tier: StaffTier) -> Self {
        Self {
            id: id.into(),
            tier,
            busy: false,
        }
    }

    /// A member that starts out busy.
    pub fn busy(id: impl Into<String>, tier: StaffTier) -> Self {
        Self {
            busy: true,
            ..Self::new(id, tier)
        }
    }
}

/// Head-count per tier, used to build the startup roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffCounts {
    pub operators: usize,
    pub supervisors: usize,
    pub directors: usize,
}

impl StaffCounts {
    pub fn new(operators: usize, supervisors: usize, directors: usize) -> Self {
        Self {
            operators,
            supervisors,
            directors,
        }
    }

    pub fn total(&self) -> usize {
        self.operators + self.supervisors + self.directors
    }

    fn for_tier(&self, tier: StaffTier) -> usize {
        match tier {
            StaffTier::Operator => self.operators,
            StaffTier::Supervisor => self.supervisors,
            StaffTier::Director => self.directors,
        }
    }
}

static NEXT_CLAIM: AtomicU64 = AtomicU64::new(1);

/// Proof that a member was marked busy by [`Roster::find_available`].
///
/// Hand it back to [`Roster::release`] once the call is over. Each claim
/// carries a serial unique to the process, so only the claim that marked a
/// member busy can free it.
#[derive(Debug, PartialEq, Eq)]
pub struct Claim {
    index: usize,
    serial: u64,
    pub id: String,
    pub tier: StaffTier,
}

/// Ordered collection of staff.
///
/// Serializes as the plain member list; deserializing goes through
/// [`Roster::new`], so duplicate ids are rejected there too.
#[derive(Debug, Default, Deserialize)]
#[serde(try_from = "Vec<StaffMember>")]
pub struct Roster {
    members: Vec<StaffMember>,
    /// Serial of the claim holding each member, parallel to `members`.
    holders: Vec<Option<u64>>,
}

impl TryFrom<Vec<StaffMember>> for Roster {
    type Error = RosterError;

    fn try_from(members: Vec<StaffMember>) -> Result<Self, Self::Error> {
        Self::new(members)
    }
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.members.serialize(serializer)
    }
}

impl Roster {
    /// Build a roster from explicit members. Insertion order is kept and
    /// breaks ties within a tier; it need not be sorted by tier.
    ///
    /// Members passed in already busy have no claim and are never freed.
    pub fn new(members: Vec<StaffMember>) -> Result<Self, RosterError> {
        {
            let mut seen = HashSet::with_capacity(members.len());
            for member in &members {
                if !seen.insert(member.id.as_str()) {
                    return Err(RosterError::DuplicateId(member.id.clone()));
                }
            }
        }
        Ok(Self::unchecked(members))
    }

    fn unchecked(members: Vec<StaffMember>) -> Self {
        Self {
            holders: vec![None; members.len()],
            members,
        }
    }

    /// Operators first, then Supervisors, then Directors, ids `<n><suffix>`.
    pub fn from_counts(counts: StaffCounts) -> Self {
        let members = StaffTier::ESCALATION_ORDER
            .iter()
            .flat_map(|&tier| {
                (0..counts.for_tier(tier))
                    .map(move |i| StaffMember::new(format!("{i}{}", tier.id_suffix()), tier))
            })
            .collect();
        Self::unchecked(members)
    }

    /// Claim the first free member of the lowest tier that has one.
    ///
    /// The member is marked busy before this returns, so no other caller
    /// holding the same lock can observe it as free.
    pub fn find_available(&mut self) -> Option<Claim> {
        let (index, tier) = std::iter::successors(Some(StaffTier::Operator), StaffTier::next)
            .find_map(|tier| {
                self.members
                    .iter()
                    .position(|m| !m.busy && m.tier == tier)
                    .map(|index| (index, tier))
            })?;

        let serial = NEXT_CLAIM.fetch_add(1, Ordering::Relaxed);
        let member = &mut self.members[index];
        member.busy = true;
        self.holders[index] = Some(serial);
        debug!(staff_id = %member.id, %tier, "staff claimed");

        Some(Claim {
            index,
            serial,
            id: member.id.clone(),
            tier,
        })
    }

    /// Mark a claimed member free again.
    ///
    /// Fails with [`RosterError::NotBusy`] when the member is already free
    /// and [`RosterError::StaleClaim`] when it is busy under another claim.
    pub fn release(&mut self, claim: &Claim) -> Result<(), RosterError> {
        let member = self
            .members
            .get_mut(claim.index)
            .filter(|m| m.id == claim.id)
            .ok_or_else(|| RosterError::UnknownMember(claim.id.clone()))?;

        if !member.busy {
            return Err(RosterError::NotBusy(member.id.clone()));
        }
        if self.holders[claim.index] != Some(claim.serial) {
            return Err(RosterError::StaleClaim(member.id.clone()));
        }
        member.busy = false;
        self.holders[claim.index] = None;
        debug!(staff_id = %member.id, tier = %member.tier, "staff released");
        Ok(())
    }

    pub fn members(&self) -> &[StaffMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn busy_count(&self) -> usize {
        self.members.iter().filter(|m| m.busy).count()
    }

    pub fn available_count(&self) -> usize {
        self.len() - self.busy_count()
    }

    pub fn available_by_tier(&self, tier: StaffTier) -> usize {
        self.members
            .iter()
            .filter(|m| !m.busy && m.tier == tier)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_counts_generates_ids_in_tier_order() {
        let roster = Roster::from_counts(StaffCounts::new(3, 2, 1));
        let ids: Vec<&str> = roster.members().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["0Op", "1Op", "2Op", "0Sp", "1Sp", "0Dr"]);
        assert_eq!(roster.available_by_tier(StaffTier::Supervisor), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Roster::new(vec![
            StaffMember::new("a", StaffTier::Operator),
            StaffMember::new("a", StaffTier::Director),
        ])
        .unwrap_err();
        assert_eq!(err, RosterError::DuplicateId("a".into()));
    }

    #[test]
    fn find_available_marks_busy() {
        let mut roster = Roster::from_counts(StaffCounts::new(1, 0, 0));
        let claim = roster.find_available().unwrap();
        assert_eq!(claim.id, "0Op");
        assert!(roster.members()[0].busy);
        assert!(roster.find_available().is_none());
    }

    #[test]
    fn release_frees_member_once() {
        let mut roster = Roster::from_counts(StaffCounts::new(1, 1, 0));
        let claim = roster.find_available().unwrap();
        roster.release(&claim).unwrap();
        assert_eq!(roster.busy_count(), 0);
        assert_eq!(
            roster.release(&claim),
            Err(RosterError::NotBusy("0Op".into()))
        );
    }

    #[test]
    fn deserialize_rejects_duplicate_ids() {
        let json = r#"[
            {"id": "a", "tier": "operator", "busy": false},
            {"id": "a", "tier": "director", "busy": false}
        ]"#;
        let err = serde_json::from_str::<Roster>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate staff id: a"), "{err}");
    }

    #[test]
    fn release_of_foreign_claim_is_unknown() {
        let mut big = Roster::from_counts(StaffCounts::new(3, 0, 0));
        let mut small = Roster::from_counts(StaffCounts::new(1, 0, 0));
        big.find_available().unwrap();
        big.find_available().unwrap();
        let third = big.find_available().unwrap();
        assert_eq!(
            small.release(&third),
            Err(RosterError::UnknownMember("2Op".into()))
        );
    }
}
