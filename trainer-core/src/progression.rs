//! # Challenge Progression
//!
//! A deterministic state machine over the ordered challenge list. It tracks
//! which challenges are completed and which one the learner is looking at.
//!
//! ## Rules
//! - Index 0 is always unlocked.
//! - Index `i > 0` is unlocked once the challenge at `i - 1` is completed.
//! - Navigation may point at a locked challenge; it never completes or
//!   unlocks anything. Deciding how to show a locked challenge is up to the
//!   caller.
//! - Completion only changes through [`Progression::mark_complete`], and the
//!   pointer only jumps forward through [`Progression::advance`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::challenge::ChallengeList;

/// How a challenge appears to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Locked,
    Active,
    Completed,
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChallengeStatus::Locked => "locked",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Persistable form of the progression.
///
/// Stored under the fixed key `currentChallenge`. The index is signed so that
/// a negative value written by hand still loads (and falls back to 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedProgress {
    #[serde(rename = "currentChallenge", default)]
    pub current_challenge: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub completed: BTreeSet<u32>,
}

/// Which challenge is current and which are done.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    ids: Vec<u32>,
    current: usize,
    completed: BTreeSet<u32>,
}

impl Progression {
    /// Fresh progression: pointer at 0, nothing completed.
    pub fn new(challenges: &ChallengeList) -> Self {
        Self {
            ids: challenges.ids(),
            current: 0,
            completed: BTreeSet::new(),
        }
    }

    /// Rebuilds the progression from saved state.
    ///
    /// An absent, negative or out-of-range index falls back to 0. Completed
    /// ids that are not in `challenges` are dropped.
    pub fn restore(challenges: &ChallengeList, saved: Option<SavedProgress>) -> Self {
        let mut progression = Self::new(challenges);
        let Some(saved) = saved else {
            return progression;
        };

        progression.current = saved
            .current_challenge
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < progression.ids.len())
            .unwrap_or(0);
        progression.completed = saved
            .completed
            .into_iter()
            .filter(|id| progression.ids.contains(id))
            .collect();
        progression
    }

    pub fn snapshot(&self) -> SavedProgress {
        SavedProgress {
            current_challenge: Some(self.current as i64),
            completed: self.completed.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Id of the current challenge.
    pub fn current_id(&self) -> Option<u32> {
        self.ids.get(self.current).copied()
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.ids
            .get(index)
            .is_some_and(|id| self.completed.contains(id))
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        match index {
            0 => !self.ids.is_empty(),
            i if i < self.ids.len() => self.is_completed(i - 1),
            _ => false,
        }
    }

    pub fn status(&self, index: usize) -> ChallengeStatus {
        if !self.is_unlocked(index) {
            ChallengeStatus::Locked
        } else if self.is_completed(index) {
            ChallengeStatus::Completed
        } else {
            ChallengeStatus::Active
        }
    }

    pub fn statuses(&self) -> Vec<ChallengeStatus> {
        (0..self.ids.len()).map(|i| self.status(i)).collect()
    }

    pub fn unlocked(&self) -> Vec<bool> {
        (0..self.ids.len()).map(|i| self.is_unlocked(i)).collect()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Pointer on the last challenge and every challenge completed.
    pub fn is_terminal(&self) -> bool {
        !self.ids.is_empty()
            && self.current == self.ids.len() - 1
            && self.ids.iter().all(|id| self.completed.contains(id))
    }

    /// Marks the current challenge complete. Returns `false` if it already was.
    pub fn mark_complete(&mut self) -> bool {
        match self.current_id() {
            Some(id) => self.completed.insert(id),
            None => false,
        }
    }

    /// Moves past a completed current challenge to the next incomplete one.
    ///
    /// Does nothing when the current challenge is not completed, or when every
    /// later challenge is already done. Returns whether the pointer moved.
    pub fn advance(&mut self) -> bool {
        if !self.is_completed(self.current) {
            return false;
        }
        let next = (self.current + 1..self.ids.len())
            .find(|&i| !self.completed.contains(&self.ids[i]));
        match next {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Steps the pointer back by one, stopping at the first challenge.
    pub fn navigate_prev(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Steps the pointer forward by one, stopping at the last challenge.
    pub fn navigate_next(&mut self) -> bool {
        if self.current + 1 >= self.ids.len() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Back to the first challenge with nothing completed.
    pub fn reset(&mut self) {
        self.current = 0;
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::tests::sample;
    use pretty_assertions::assert_eq;

    fn three() -> ChallengeList {
        ChallengeList::new(vec![sample(1), sample(2), sample(3)]).unwrap()
    }

    #[test]
    fn only_the_first_challenge_starts_unlocked() {
        let progression = Progression::new(&three());
        assert_eq!(progression.unlocked(), vec![true, false, false]);
        assert_eq!(
            progression.statuses(),
            vec![
                ChallengeStatus::Active,
                ChallengeStatus::Locked,
                ChallengeStatus::Locked
            ]
        );
        assert_eq!(progression.current_index(), 0);
        assert!(!progression.is_terminal());
    }

    #[test]
    fn completing_unlocks_the_next_and_advances() {
        let mut progression = Progression::new(&three());
        assert!(progression.mark_complete());
        assert_eq!(progression.unlocked(), vec![true, true, false]);
        assert!(progression.advance());
        assert_eq!(progression.current_index(), 1);
        assert_eq!(progression.status(0), ChallengeStatus::Completed);
        assert_eq!(progression.status(1), ChallengeStatus::Active);
    }

    #[test]
    fn finishing_everything_is_terminal() {
        let mut progression = Progression::new(&three());
        for _ in 0..3 {
            progression.mark_complete();
            progression.advance();
        }
        assert_eq!(progression.current_index(), 2);
        assert!(progression.is_terminal());
        assert!(!progression.advance());
        assert_eq!(progression.current_index(), 2);
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut progression = Progression::new(&three());
        assert!(progression.mark_complete());
        assert!(!progression.mark_complete());
        assert_eq!(progression.completed_count(), 1);
    }

    #[test]
    fn advance_without_completion_is_a_no_op() {
        let mut progression = Progression::new(&three());
        assert!(!progression.advance());
        assert_eq!(progression.current_index(), 0);
    }

    #[test]
    fn advance_skips_challenges_already_done() {
        let mut progression = Progression::restore(
            &three(),
            Some(SavedProgress {
                current_challenge: Some(0),
                completed: [2].into_iter().collect(),
            }),
        );
        progression.mark_complete();
        assert!(progression.advance());
        assert_eq!(progression.current_index(), 2);
    }

    #[test]
    fn navigation_is_clamped_and_changes_nothing_else() {
        let mut progression = Progression::new(&three());
        assert!(!progression.navigate_prev());
        assert!(progression.navigate_next());
        assert!(progression.navigate_next());
        assert!(!progression.navigate_next());
        assert_eq!(progression.current_index(), 2);
        assert_eq!(progression.status(2), ChallengeStatus::Locked);
        assert_eq!(progression.completed_count(), 0);
        assert!(progression.navigate_prev());
        assert_eq!(progression.current_index(), 1);
    }

    #[test]
    fn restore_falls_back_to_zero() {
        let list = three();
        for index in [None, Some(-1), Some(3), Some(99)] {
            let progression = Progression::restore(
                &list,
                Some(SavedProgress {
                    current_challenge: index,
                    completed: BTreeSet::new(),
                }),
            );
            assert_eq!(progression.current_index(), 0, "index {index:?}");
        }
        assert_eq!(Progression::restore(&list, None).current_index(), 0);
    }

    #[test]
    fn restore_keeps_known_ids_only() {
        let progression = Progression::restore(
            &three(),
            Some(SavedProgress {
                current_challenge: Some(1),
                completed: [1, 42].into_iter().collect(),
            }),
        );
        assert_eq!(progression.current_index(), 1);
        assert_eq!(progression.completed_count(), 1);
        assert_eq!(progression.snapshot().completed, [1].into_iter().collect());
    }

    #[test]
    fn reset_clears_progress() {
        let mut progression = Progression::new(&three());
        progression.mark_complete();
        progression.advance();
        progression.reset();
        assert_eq!(progression.current_index(), 0);
        assert_eq!(progression.completed_count(), 0);
    }

    #[test]
    fn saved_progress_uses_the_fixed_key() {
        let saved = SavedProgress {
            current_challenge: Some(2),
            completed: BTreeSet::new(),
        };
        assert_eq!(
            serde_json::to_string(&saved).unwrap(),
            r#"{"currentChallenge":2}"#
        );
        let decoded: SavedProgress =
            serde_json::from_str(r#"{"currentChallenge":1,"completed":[3]}"#).unwrap();
        assert_eq!(decoded.current_challenge, Some(1));
        assert!(decoded.completed.contains(&3));
    }
}
