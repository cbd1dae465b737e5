use std::fmt;

/// Life cycle stage of a unit: `Alive → Dying → Dead`, never backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Life {
    Alive,
    Dying,
    Dead,
}

impl Life {
    /// True for [`Life::Dead`].
    pub fn is_dead(self) -> bool {
        matches!(self, Life::Dead)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Life::Alive => "alive",
            Life::Dying => "dying",
            Life::Dead => "dead",
        }
    }
}

impl fmt::Display for Life {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
