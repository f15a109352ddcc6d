use std::collections::HashSet;

use serde::Serialize;

use crate::rank::Rank;

/// Fewest connected defenders that can coordinate an assault.
pub const MIN_CONNECTED: usize = 2;

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssaultState {
    #[default]
    Inactive,
    Active,
}

/// Outcome of feeding one evaluation into the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Began,
    Ended,
}

impl AssaultState {
    pub fn is_active(&self) -> bool {
        matches!(self, AssaultState::Active)
    }

    /// Move to the state implied by `possible` and report the edge, if any.
    pub fn advance(&mut self, possible: bool) -> Transition {
        match (*self, possible) {
            (AssaultState::Inactive, true) => {
                *self = AssaultState::Active;
                Transition::Began
            }
            (AssaultState::Active, false) => {
                *self = AssaultState::Inactive;
                Transition::Ended
            }
            _ => Transition::Unchanged,
        }
    }
}

/// Roster members present in `online`, in roster order.
pub fn connected_members(roster: &[String], online: &[String]) -> Vec<String> {
    let online: HashSet<&str> = online.iter().map(String::as_str).collect();
    roster
        .iter()
        .filter(|member| online.contains(member.as_str()))
        .cloned()
        .collect()
}

/// Whether an assault is viable given the connected defenders and their ranks.
///
/// Needs at least [`MIN_CONNECTED`] defenders online, one of them holding an
/// established rank. `ranks` pairs each connected player with the looked-up
/// rank; unknown ranks never qualify.
pub fn assault_possible(connected: &[String], ranks: &[(String, Option<Rank>)]) -> bool {
    if connected.len() < MIN_CONNECTED {
        return false;
    }
    ranks.iter().any(|(player, rank)| {
        connected.contains(player) && rank.is_some_and(|rank| rank.is_established())
    })
}
