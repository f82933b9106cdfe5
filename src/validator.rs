//! Profile well-formedness checks.
//!
//! A run recorded while the robot was still rolling from the previous maneuver
//! shows time or encoder values going backwards; regressing or integrating
//! such a profile gives garbage constants, so the whole profile is thrown out
//! on the first violation.

use std::fmt;

use crate::profile::CalibProfile;

/// First invariant violation found in a profile. The index is the sample at
/// which the offending series decreased relative to its predecessor.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileFault {
    Empty,
    TimeDecreased { index: usize, prev: f64, value: f64 },
    LeftEncoderDecreased { index: usize, prev: i32, value: i32 },
    RightEncoderDecreased { index: usize, prev: i32, value: i32 },
    BadSequenceTag { tag: String },
}

impl fmt::Display for ProfileFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileFault::Empty => write!(f, "profile holds no samples"),
            ProfileFault::TimeDecreased { index, prev, value } => write!(
                f,
                "timestamp {value} at sample {index} not increasing over {prev} at {}",
                index - 1
            ),
            ProfileFault::LeftEncoderDecreased { index, prev, value } => write!(
                f,
                "left encoder {value} at sample {index} not increasing over {prev} at {}",
                index - 1
            ),
            ProfileFault::RightEncoderDecreased { index, prev, value } => write!(
                f,
                "right encoder {value} at sample {index} not increasing over {prev} at {}",
                index - 1
            ),
            ProfileFault::BadSequenceTag { tag } => {
                write!(f, "sequence tag {tag:?} is not \"LR\" or \"RL\"")
            }
        }
    }
}

/// Scan the time and encoder series pairwise; the first decrease wins.
/// Equal consecutive values are fine (the hub repeats readings between
/// control-loop ticks).
pub fn validate_series(profile: &CalibProfile) -> Result<(), ProfileFault> {
    for (index, pair) in profile.samples.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let index = index + 1;
        if cur.timestamp < prev.timestamp {
            return Err(ProfileFault::TimeDecreased {
                index,
                prev: prev.timestamp,
                value: cur.timestamp,
            });
        }
        if cur.left_encoder < prev.left_encoder {
            return Err(ProfileFault::LeftEncoderDecreased {
                index,
                prev: prev.left_encoder,
                value: cur.left_encoder,
            });
        }
        if cur.right_encoder < prev.right_encoder {
            return Err(ProfileFault::RightEncoderDecreased {
                index,
                prev: prev.right_encoder,
                value: cur.right_encoder,
            });
        }
    }
    Ok(())
}

/// Output-power runs additionally need a recognized direction-lead tag.
pub fn validate_sequence_tag(profile: &CalibProfile) -> Result<(), ProfileFault> {
    match profile.sequence.as_str() {
        "LR" | "RL" => Ok(()),
        other => Err(ProfileFault::BadSequenceTag {
            tag: other.to_string(),
        }),
    }
}

/// Log a fault the way the operator sees it: which profile, at what power.
pub fn report_fault(profile_index: usize, profile: &CalibProfile, fault: &ProfileFault) {
    log::warn!(
        "profile {} (power {:.3}) rejected: {}",
        profile_index,
        profile.nominal_power,
        fault
    );
}
