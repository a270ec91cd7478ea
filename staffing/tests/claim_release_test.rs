//! A claim frees only the member it marked busy, and only once.

use staffing::{Roster, RosterError, StaffCounts};

#[test]
fn earlier_claim_cannot_free_a_reclaimed_member() {
    let mut roster = Roster::from_counts(StaffCounts::new(1, 0, 0));

    let first = roster.find_available().unwrap();
    roster.release(&first).unwrap();
    let second = roster.find_available().unwrap();
    assert_eq!(second.id, "0Op");

    assert_eq!(
        roster.release(&first),
        Err(RosterError::StaleClaim("0Op".into()))
    );
    assert_eq!(roster.busy_count(), 1);
    assert!(roster.find_available().is_none());

    roster.release(&second).unwrap();
    assert_eq!(roster.busy_count(), 0);
}

#[test]
fn claim_from_identical_roster_is_rejected() {
    let mut ours = Roster::from_counts(StaffCounts::new(1, 1, 0));
    let mut twin = Roster::from_counts(StaffCounts::new(1, 1, 0));

    let held = ours.find_available().unwrap();
    let foreign = twin.find_available().unwrap();
    assert_eq!(held.id, foreign.id);

    assert_eq!(
        ours.release(&foreign),
        Err(RosterError::StaleClaim("0Op".into()))
    );
    assert_eq!(ours.busy_count(), 1);

    ours.release(&held).unwrap();
    twin.release(&foreign).unwrap();
}

#[test]
fn preassigned_busy_member_has_no_claim() {
    use staffing::{StaffMember, StaffTier};

    let mut roster = Roster::new(vec![
        StaffMember::busy("0Op", StaffTier::Operator),
        StaffMember::new("0Sp", StaffTier::Supervisor),
    ])
    .unwrap();
    let mut other = Roster::from_counts(StaffCounts::new(1, 0, 0));
    let claim = other.find_available().unwrap();

    assert_eq!(
        roster.release(&claim),
        Err(RosterError::StaleClaim("0Op".into()))
    );
    assert_eq!(roster.find_available().unwrap().id, "0Sp");
}
