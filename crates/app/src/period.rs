use chrono::{Duration, NaiveDate, Utc};
use pulse_db::DateFilter;

/// Named ranking window. Every period is anchored to the current date in
/// one fixed reference timezone (UTC) so all users share the same day
/// boundary regardless of their local clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Period {
    /// Unrecognized tokens deliberately fall back to `Month` rather than
    /// erroring; the dashboard treats the period picker as best-effort.
    pub fn parse(token: Option<&str>) -> Self {
        match token.unwrap_or("month") {
            "today" => Period::Today,
            "week" => Period::Week,
            "all" => Period::All,
            _ => Period::Month,
        }
    }

    pub fn date_filter(self) -> DateFilter {
        self.date_filter_from(reference_today())
    }

    pub fn date_filter_from(self, today: NaiveDate) -> DateFilter {
        match self {
            Period::Today => DateFilter::On(format_date(today)),
            Period::Week => DateFilter::Since(format_date(today - Duration::days(7))),
            Period::Month => DateFilter::Since(format_date(today - Duration::days(30))),
            Period::All => DateFilter::All,
        }
    }
}

/// Current date in the fixed reference timezone.
pub fn reference_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
