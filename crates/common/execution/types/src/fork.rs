use std::fmt;

/// Hard forks the execution bridge can drive. The engine API method version
/// is a pure function of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForkVersion {
    Capella,
    Deneb,
}

impl fmt::Display for ForkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkVersion::Capella => write!(f, "capella"),
            ForkVersion::Deneb => write!(f, "deneb"),
        }
    }
}
