//! Macro for implementing Display and FromStr for label enums
//!
//! Failure classes, supervisor states and log levels all travel through logs
//! and config as lowercase labels. This macro provides one implementation of
//! both conversions for each of them.
//!
//! # Example
//!
//! ```rust
//! use rewardpilot_domain::impl_domain_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Warmup,
//!     Running,
//! }
//!
//! impl_domain_label_conversions!(Phase {
//!     Warmup => "warmup",
//!     Running => "running",
//! });
//!
//! assert_eq!(Phase::Running.to_string(), "running");
//! assert_eq!("WARMUP".parse::<Phase>(), Ok(Phase::Warmup));
//! ```

/// Implements Display and FromStr traits for label enums
///
/// Parsing is case-insensitive; display always uses the declared label.
#[macro_export]
macro_rules! impl_domain_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Stage {
        Queued,
        InFlight,
        Settled,
    }

    impl_domain_label_conversions!(Stage {
        Queued => "queued",
        InFlight => "in_flight",
        Settled => "settled",
    });

    #[test]
    fn display_uses_declared_label() {
        assert_eq!(Stage::Queued.to_string(), "queued");
        assert_eq!(Stage::InFlight.to_string(), "in_flight");
        assert_eq!(format!("{:>8}", Stage::Settled.to_string()), " settled");
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Stage::from_str("IN_FLIGHT").unwrap(), Stage::InFlight);
        assert_eq!(Stage::from_str("Settled").unwrap(), Stage::Settled);
    }

    #[test]
    fn unknown_label_is_rejected_with_enum_name() {
        let err = Stage::from_str("done").unwrap_err();
        assert!(err.contains("Invalid Stage: done"));
    }
}
