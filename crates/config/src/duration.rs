// SPDX-License-Identifier: MIT

//! Duration string parsing: a positive decimal plus one of `ms`, `s`, `m`, `h`.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Parse a duration string like `"250ms"`, `"30s"`, `"2m"`, `"1h"`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let suffix_len = ["ms", "s", "m", "h"]
        .iter()
        .filter(|suffix| raw.ends_with(**suffix))
        .map(|suffix| suffix.len())
        .max()
        .ok_or_else(|| format!("duration {raw:?} is missing a ms/s/m/h suffix"))?;

    let (value, suffix) = raw.split_at(raw.len() - suffix_len);
    let value: f64 =
        value.parse().map_err(|_| format!("duration {raw:?} has a non-numeric value"))?;
    if value < 0.0 {
        return Err(format!("duration {raw:?} must be positive"));
    }

    let millis = match suffix {
        "ms" => value,
        "s" => value * 1_000.0,
        "m" => value * 60_000.0,
        "h" => value * 3_600_000.0,
        _ => unreachable!("suffix already validated"),
    };
    Ok(Duration::from_millis(millis.round() as u64))
}

/// Deserialize a duration field from its TOML string form.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Deserialize an optional duration field from its TOML string form.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|r| parse_duration(&r)).transpose().map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
