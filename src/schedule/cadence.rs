// src/schedule/cadence.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

/// A cron schedule evaluated in a fixed time zone.
///
/// Both classic 5-field expressions (`min hour dom mon dow`) and the
/// seconds-first 6/7-field form are accepted; 5-field expressions fire at
/// second 0.
#[derive(Clone)]
pub struct Cadence {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
}

impl fmt::Debug for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cadence")
            .field("expression", &self.expression)
            .field("timezone", &self.timezone.name())
            .finish()
    }
}

impl Cadence {
    pub fn parse(expression: &str, timezone: &str) -> Result<Self, String> {
        let normalized = normalize_expression(expression)?;
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| format!("invalid cron expression {expression:?}: {e}"))?;
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| format!("invalid time zone {timezone:?}: {e}"))?;

        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
            timezone,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .next()
            .map(|t| t.with_timezone(&Utc))
    }

    /// The next `count` fire times after `now`, in the cadence's time zone.
    pub fn upcoming(&self, now: DateTime<Utc>, count: usize) -> Vec<DateTime<Tz>> {
        let local = now.with_timezone(&self.timezone);
        self.schedule.after(&local).take(count).collect()
    }
}

fn normalize_expression(expression: &str) -> Result<String, String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(format!(
            "invalid cron expression {expression:?}: expected 5, 6 or 7 fields, got {n}"
        )),
    }
}
