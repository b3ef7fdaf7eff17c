//! Patrol, aggro and return transitions.

use deepfield_core::{AiState, EngagementRanges};

/// Distances the transition function reads each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distances {
    /// Entity to player.
    pub to_player: f32,
    /// Entity to its home position.
    pub to_home: f32,
}

/// Next behavioral state for `state` given the current `distances`.
///
/// Defined for every combination of inputs. Comparisons against NaN fail,
/// so non-finite distances leave the state unchanged.
#[must_use]
pub fn transition(state: AiState, distances: &Distances, ranges: &EngagementRanges) -> AiState {
    match state {
        AiState::Patrol if distances.to_player <= ranges.aggro => AiState::Aggro,
        AiState::Aggro
            if distances.to_player > ranges.disengage || distances.to_home > ranges.leash =>
        {
            AiState::Return
        }
        AiState::Return if distances.to_home <= ranges.return_threshold => AiState::Patrol,
        unchanged => unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfield_core::{BehaviorTuning, Rank};

    fn ranges() -> EngagementRanges {
        EngagementRanges::for_rank(Rank::Normal, &BehaviorTuning::default())
    }

    fn at(to_player: f32, to_home: f32) -> Distances {
        Distances { to_player, to_home }
    }

    #[test]
    fn patrol_engages_inside_aggro_range() {
        let ranges = ranges();
        assert_eq!(
            transition(AiState::Patrol, &at(ranges.aggro, 0.0), &ranges),
            AiState::Aggro
        );
        assert_eq!(
            transition(AiState::Patrol, &at(ranges.aggro + 1.0, 0.0), &ranges),
            AiState::Patrol
        );
    }

    #[test]
    fn aggro_disengages_on_distance_or_leash() {
        let ranges = ranges();
        assert_eq!(
            transition(AiState::Aggro, &at(ranges.disengage + 1.0, 0.0), &ranges),
            AiState::Return
        );
        assert_eq!(
            transition(AiState::Aggro, &at(10.0, ranges.leash + 1.0), &ranges),
            AiState::Return
        );
        assert_eq!(
            transition(AiState::Aggro, &at(ranges.disengage, ranges.leash), &ranges),
            AiState::Aggro
        );
    }

    #[test]
    fn return_settles_near_home() {
        let ranges = ranges();
        assert_eq!(
            transition(AiState::Return, &at(0.0, ranges.return_threshold), &ranges),
            AiState::Patrol
        );
        assert_eq!(
            transition(AiState::Return, &at(0.0, ranges.return_threshold + 1.0), &ranges),
            AiState::Return
        );
    }

    #[test]
    fn transition_is_total() {
        let ranges = ranges();
        let samples = [
            0.0,
            ranges.return_threshold,
            ranges.aggro,
            ranges.disengage,
            ranges.leash,
            1.0e9,
            f32::INFINITY,
            f32::NAN,
        ];
        for state in [AiState::Patrol, AiState::Aggro, AiState::Return] {
            for &to_player in &samples {
                for &to_home in &samples {
                    let next = transition(state, &at(to_player, to_home), &ranges);
                    let allowed = match state {
                        AiState::Patrol => matches!(next, AiState::Patrol | AiState::Aggro),
                        AiState::Aggro => matches!(next, AiState::Aggro | AiState::Return),
                        AiState::Return => matches!(next, AiState::Return | AiState::Patrol),
                    };
                    assert!(allowed, "{state:?} -> {next:?}");
                }
            }
        }
    }
}
