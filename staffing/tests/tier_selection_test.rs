//! Tier precedence for roster selection.
//!
//! Rosters here are deliberately inserted out of tier order: selection must
//! scan by tier, not by position.

use staffing::{Roster, StaffCounts, StaffMember, StaffTier};

fn members(
    order: &[StaffTier],
    counts: StaffCounts,
    busy: &[StaffTier],
) -> Vec<StaffMember> {
    let mut out = Vec::new();
    for &tier in order {
        let n = match tier {
            StaffTier::Operator => counts.operators,
            StaffTier::Supervisor => counts.supervisors,
            StaffTier::Director => counts.directors,
        };
        for i in 0..n {
            let id = format!("{i}{}", tier.id_suffix());
            if busy.contains(&tier) {
                out.push(StaffMember::busy(id, tier));
            } else {
                out.push(StaffMember::new(id, tier));
            }
        }
    }
    out
}

fn counts() -> StaffCounts {
    StaffCounts::new(3, 2, 1)
}

#[test]
fn operator_wins_when_all_free() {
    let mut roster = Roster::new(members(
        &[StaffTier::Supervisor, StaffTier::Director, StaffTier::Operator],
        counts(),
        &[],
    ))
    .unwrap();

    let claim = roster.find_available().expect("someone is free");
    assert_eq!(claim.tier, StaffTier::Operator);
    assert_eq!(claim.id, "0Op");
}

#[test]
fn supervisor_when_operators_busy() {
    let mut roster = Roster::new(members(
        &[StaffTier::Director, StaffTier::Operator, StaffTier::Supervisor],
        counts(),
        &[StaffTier::Operator],
    ))
    .unwrap();

    let claim = roster.find_available().expect("supervisor is free");
    assert_eq!(claim.tier, StaffTier::Supervisor);
}

#[test]
fn director_when_operators_and_supervisors_busy() {
    let mut roster = Roster::new(members(
        &[StaffTier::Supervisor, StaffTier::Director, StaffTier::Operator],
        counts(),
        &[StaffTier::Operator, StaffTier::Supervisor],
    ))
    .unwrap();

    let claim = roster.find_available().expect("director is free");
    assert_eq!(claim.tier, StaffTier::Director);
}

#[test]
fn none_when_everyone_busy() {
    let mut roster = Roster::new(members(
        &[StaffTier::Operator, StaffTier::Supervisor, StaffTier::Director],
        counts(),
        &StaffTier::ESCALATION_ORDER,
    ))
    .unwrap();

    assert!(roster.find_available().is_none());
    assert_eq!(roster.available_count(), 0);
}

#[test]
fn repeated_claims_escalate_through_tiers() {
    let mut roster = Roster::from_counts(counts());
    let tiers: Vec<StaffTier> = std::iter::from_fn(|| roster.find_available())
        .map(|c| c.tier)
        .collect();

    assert_eq!(
        tiers,
        [
            StaffTier::Operator,
            StaffTier::Operator,
            StaffTier::Operator,
            StaffTier::Supervisor,
            StaffTier::Supervisor,
            StaffTier::Director,
        ]
    );
    assert_eq!(roster.busy_count(), 6);
}

#[test]
fn released_operator_is_preferred_over_free_director() {
    let mut roster = Roster::from_counts(StaffCounts::new(1, 0, 1));
    let op = roster.find_available().unwrap();
    roster.release(&op).unwrap();

    let again = roster.find_available().unwrap();
    assert_eq!(again.tier, StaffTier::Operator);
}

#[test]
fn roster_round_trips_through_json() {
    let roster = Roster::from_counts(StaffCounts::new(1, 1, 1));
    let json = serde_json::to_string(&roster).unwrap();
    assert!(json.contains("\"tier\":\"supervisor\""));
    let back: Roster = serde_json::from_str(&json).unwrap();
    assert_eq!(back.members(), roster.members());
}
