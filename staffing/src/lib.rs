//! Staff roster for the call-center dispatcher.
//!
//! This crate is deliberately synchronous and runtime-free: it answers one
//! question, "which free staff member of the lowest tier should take the next
//! call?", and records the claim. Serialising access (one mutual-exclusion
//! domain for every claim and release) is the owner's job; the `&mut self`
//! receivers on [`Roster::find_available`] and [`Roster::release`] make that
//! requirement visible in the type system.
//!
//! ```text
//! find_available()
//!   ├─ any free Operator?   → claim first in roster order
//!   ├─ any free Supervisor? → claim first in roster order
//!   ├─ any free Director?   → claim first in roster order
//!   └─ none                 → None
//! ```

pub mod roster;
pub mod tier;

pub use roster::{Claim, Roster, RosterError, StaffCounts, StaffMember};
pub use tier::StaffTier;
