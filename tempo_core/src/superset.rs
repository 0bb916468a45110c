//! Superset group index.
//!
//! Superset membership is stored on each exercise as a shared group id.
//! This module turns that into an explicit structure once per session:
//! a group is a maximal contiguous run (two or more exercises) sharing the
//! same id. A run of one is played as a plain exercise.
//!
//! A group is played in rounds. The round count is the first member's set
//! count, and a member takes part in round `r` only while it still has a
//! set left (`sets > r`), so the current set index never exceeds the
//! current exercise's own set count.

use crate::Exercise;

/// One member of a superset group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    /// Index into the workout's exercise list
    pub exercise: usize,
    pub sets: u32,
}

/// An ordered superset group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupersetGroup {
    pub group_id: u32,
    members: Vec<Member>,
}

impl SupersetGroup {
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Number of rounds the group is played for
    pub fn rounds(&self) -> u32 {
        self.members[0].sets
    }

    /// Exercise index of the first member
    pub fn first(&self) -> usize {
        self.members[0].exercise
    }

    /// Exercise index just past the group
    pub fn end(&self) -> usize {
        self.members[self.members.len() - 1].exercise + 1
    }

    /// 1-based position of `exercise` within the group
    pub fn position_of(&self, exercise: usize) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.exercise == exercise)
            .map(|p| p + 1)
    }

    /// Next member after `exercise` taking part in `round`
    pub fn next_member(&self, exercise: usize, round: u32) -> Option<usize> {
        self.members
            .iter()
            .filter(|m| m.exercise > exercise && m.sets > round)
            .map(|m| m.exercise)
            .next()
    }

    /// Previous member before `exercise` taking part in `round`
    pub fn prev_member(&self, exercise: usize, round: u32) -> Option<usize> {
        self.members
            .iter()
            .rev()
            .filter(|m| m.exercise < exercise && m.sets > round)
            .map(|m| m.exercise)
            .next()
    }

    /// First member taking part in `round`, if the group has such a round
    pub fn first_in_round(&self, round: u32) -> Option<usize> {
        if round >= self.rounds() {
            return None;
        }
        self.members
            .iter()
            .find(|m| m.sets > round)
            .map(|m| m.exercise)
    }
}

/// Superset groups of a workout, with a per-exercise lookup
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupersetIndex {
    groups: Vec<SupersetGroup>,
    membership: Vec<Option<usize>>,
}

impl SupersetIndex {
    /// Derive the groups from the exercises' shared group ids
    pub fn build(exercises: &[Exercise]) -> Self {
        let mut groups = Vec::new();
        let mut membership = vec![None; exercises.len()];

        let mut i = 0;
        while i < exercises.len() {
            let Some(group_id) = exercises[i].superset_group else {
                i += 1;
                continue;
            };

            let start = i;
            while i < exercises.len() && exercises[i].superset_group == Some(group_id) {
                i += 1;
            }

            if i - start < 2 {
                tracing::debug!(
                    "Superset group {} at exercise {} has a single member, playing it as a plain exercise",
                    group_id,
                    start
                );
                continue;
            }

            let members = (start..i)
                .map(|exercise| Member {
                    exercise,
                    sets: exercises[exercise].set_count(),
                })
                .collect();

            for slot in &mut membership[start..i] {
                *slot = Some(groups.len());
            }
            groups.push(SupersetGroup { group_id, members });
        }

        if !groups.is_empty() {
            tracing::debug!("Indexed {} superset groups", groups.len());
        }

        Self { groups, membership }
    }

    pub fn groups(&self) -> &[SupersetGroup] {
        &self.groups
    }

    /// The group `exercise` belongs to, if any
    pub fn group_of(&self, exercise: usize) -> Option<&SupersetGroup> {
        self.membership
            .get(exercise)
            .copied()
            .flatten()
            .map(|g| &self.groups[g])
    }
}
