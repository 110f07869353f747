use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("There is no player {0}, only players 1 and 2")]
pub struct InvalidPlayerNum(pub i64);

// Serialized as the bare number 1 or 2
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub enum PlayerNum {
    P1,
    P2,
}

impl PlayerNum {
    pub fn other(self) -> Self {
        match self {
            PlayerNum::P1 => PlayerNum::P2,
            PlayerNum::P2 => PlayerNum::P1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerNum::P1 => 0,
            PlayerNum::P2 => 1,
        }
    }

    pub fn both() -> [PlayerNum; 2] {
        [PlayerNum::P1, PlayerNum::P2]
    }
}

impl TryFrom<i64> for PlayerNum {
    type Error = InvalidPlayerNum;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(PlayerNum::P1),
            2 => Ok(PlayerNum::P2),
            _ => Err(InvalidPlayerNum(n)),
        }
    }
}

impl From<PlayerNum> for u8 {
    fn from(player_num: PlayerNum) -> u8 {
        match player_num {
            PlayerNum::P1 => 1,
            PlayerNum::P2 => 2,
        }
    }
}

impl fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}
