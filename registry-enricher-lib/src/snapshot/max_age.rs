use chrono::TimeDelta;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use regex::Regex;
use std::sync::LazyLock;

static MAX_AGE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([hdw])$").expect("invalid regex"));

/// How long an enriched tool stays fresh, written as `<integer><unit>` with unit `h`, `d`, or `w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAge {
    value: u32,
    unit: char,
    delta: TimeDelta,
}

impl MaxAge {
    #[must_use]
    pub const fn as_delta(&self) -> TimeDelta {
        self.delta
    }
}

impl Default for MaxAge {
    fn default() -> Self {
        Self {
            value: 7,
            unit: 'd',
            delta: TimeDelta::days(7),
        }
    }
}

impl FromStr for MaxAge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        let invalid = || format!("invalid max-age '{s}', expected a number followed by h, d, or w (e.g. 2h, 3d, 1w)");

        let caps = MAX_AGE_REGEX.captures(s).ok_or_else(invalid)?;
        let value: u32 = caps[1].parse().map_err(|_| invalid())?;
        let unit = caps[2].chars().next().ok_or_else(invalid)?;

        let hours = match unit {
            'h' => i64::from(value),
            'd' => i64::from(value) * 24,
            _ => i64::from(value) * 24 * 7,
        };
        let delta = TimeDelta::try_hours(hours).ok_or_else(invalid)?;

        Ok(Self { value, unit, delta })
    }
}

impl Display for MaxAge {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}
