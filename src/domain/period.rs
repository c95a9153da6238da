use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub const ALL: [Frequency; 2] = [Frequency::Daily, Frequency::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    /// Bucket key for `now`: `2024-05-01` for daily, ISO week `2024-W18` for weekly.
    pub fn period_key(&self, now: DateTime<Utc>) -> String {
        match self {
            Frequency::Daily => now.format("%Y-%m-%d").to_string(),
            Frequency::Weekly => {
                let week = now.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
        }
    }

    /// Output file name, e.g. `daily-20240501.md`
    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}.md", self.as_str(), now.format("%Y%m%d"))
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
