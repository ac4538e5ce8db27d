//! Readiness and Poll Interest
//!
//! [`Readiness`] is what the polling loop reports for a descriptor at one instant.
//! Its flags are independent and may combine. [`PollInterest`] is what a socket asks
//! the polling loop to watch for.

use bitflags::bitflags;

bitflags! {
    /// Raw readiness reported for a descriptor
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Readiness: u16 {
        const READABLE = 1 << 0;
        const PRIORITY = 1 << 1;
        const WRITABLE = 1 << 2;
        const ERROR = 1 << 3;
        const HANGUP = 1 << 4;
    }
}

bitflags! {
    /// Conditions registered with the polling loop
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PollInterest: u16 {
        const READABLE = 1 << 0;
        const PRIORITY = 1 << 1;
        const WRITABLE = 1 << 2;
    }
}

impl Readiness {
    /// `true` when the descriptor reported an error or a hang-up
    pub fn is_failure(self) -> bool {
        self.intersects(Readiness::ERROR | Readiness::HANGUP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_detection() {
        assert!(Readiness::ERROR.is_failure());
        assert!((Readiness::HANGUP | Readiness::READABLE).is_failure());
        assert!(!(Readiness::READABLE | Readiness::WRITABLE | Readiness::PRIORITY).is_failure());
    }

    #[test]
    fn test_interest_bits_line_up_with_readiness() {
        assert_eq!(PollInterest::READABLE.bits(), Readiness::READABLE.bits());
        assert_eq!(PollInterest::PRIORITY.bits(), Readiness::PRIORITY.bits());
        assert_eq!(PollInterest::WRITABLE.bits(), Readiness::WRITABLE.bits());
    }
}
