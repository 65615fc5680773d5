use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Competition
// ---------------------------------------------------------------------------

/// One competition as published by the WCA API.
///
/// Only the fields used for diffing and announcing are typed. Everything else
/// the API returns is kept in `extra` so the state file round-trips the full
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub country_iso2: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Competition {
    /// Inclusive number of days the competition spans. Never less than 1.
    pub fn duration_days(&self) -> i64 {
        ((self.end_date - self.start_date).num_days() + 1).max(1)
    }

    pub fn is_multi_day(&self) -> bool {
        self.end_date > self.start_date
    }

    /// Plain date range, e.g. `2025-03-01` or `2025-03-01 → 2025-03-02 (2 days)`.
    pub fn date_range(&self) -> String {
        if self.is_multi_day() {
            format!(
                "{} → {} ({} days)",
                self.start_date,
                self.end_date,
                self.duration_days()
            )
        } else {
            self.start_date.to_string()
        }
    }

    /// Markdown date line used in Discord embeds.
    pub fn date_line(&self) -> String {
        if self.is_multi_day() {
            format!("📅 **Dates:** {}", self.date_range())
        } else {
            format!("📅 **Date:** {}", self.date_range())
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn competition(id: &str, start: &str, end: &str) -> Competition {
        Competition {
            id: id.to_string(),
            name: format!("{id} Name"),
            city: "Santiago".to_string(),
            country_iso2: "CL".to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            url: format!("https://www.worldcubeassociation.org/competitions/{id}"),
            extra: serde_json::Map::new(),
        }
    }

    pub fn api_json(id: &str, start: &str, end: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": format!("{id} Name"),
            "city": "Santiago",
            "country_iso2": "CL",
            "start_date": start,
            "end_date": end,
            "url": format!("https://www.worldcubeassociation.org/competitions/{id}"),
            "venue": "Centro Cultural",
            "event_ids": ["333", "222"],
            "competitor_limit": 120
        })
    }
}
