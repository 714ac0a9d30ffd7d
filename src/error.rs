use core::fmt;

/// Promotion of a `Weak` failed because its object was already released.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Expired;

impl fmt::Display for Expired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("weak handle has expired")
    }
}

impl std::error::Error for Expired {}
