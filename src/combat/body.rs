//! Body parts, damage statuses and traveler stats

use serde::{Deserialize, Serialize};

/// Body parts that can be hit and that equipment occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Head,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl Part {
    pub const COUNT: usize = 6;

    pub const ALL: [Part; Part::COUNT] = [
        Part::Head,
        Part::Torso,
        Part::LeftArm,
        Part::RightArm,
        Part::LeftLeg,
        Part::RightLeg,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Part::Head => "head",
            Part::Torso => "torso",
            Part::LeftArm => "left arm",
            Part::RightArm => "right arm",
            Part::LeftLeg => "left leg",
            Part::RightLeg => "right leg",
        }
    }

    /// Destroying a vital part kills
    pub fn is_vital(self) -> bool {
        matches!(self, Part::Head | Part::Torso)
    }

    pub fn is_leg(self) -> bool {
        matches!(self, Part::LeftLeg | Part::RightLeg)
    }
}

/// Damage status of a part, ordered from healthy to destroyed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Normal,
    Bruised,
    /// Worst status at which a part can still hold equipment
    Wounded,
    Broken,
    Mangled,
    Destroyed,
}

impl Status {
    pub const MAX_LEVEL: usize = 5;

    pub fn level(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Bruised => "bruised",
            Status::Wounded => "wounded",
            Status::Broken => "broken",
            Status::Mangled => "mangled",
            Status::Destroyed => "destroyed",
        }
    }

    /// Can a part in this condition hold equipment?
    pub fn can_hold(self) -> bool {
        self <= Status::Wounded
    }
}

/// Traveler stats that scale combat contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Endurance,
    Agility,
}

impl Stat {
    pub const COUNT: usize = 3;

    pub const ALL: [Stat; Stat::COUNT] = [Stat::Strength, Stat::Endurance, Stat::Agility];

    pub fn index(self) -> usize {
        self as usize
    }
}

pub type Parts = [Status; Part::COUNT];
pub type Stats = [u32; Stat::COUNT];
