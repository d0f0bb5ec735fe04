use chrono::{Local, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today" as an ISO calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clock {
    /// Device-local calendar date at the moment of the call.
    System,
    Fixed(String),
}

impl Clock {
    pub fn today(&self) -> String {
        match self {
            Clock::System => Local::now().date_naive().format(DATE_FORMAT).to_string(),
            Clock::Fixed(d) => d.clone(),
        }
    }
}

pub fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_configured_date() {
        assert_eq!(Clock::Fixed("2025-11-20".to_string()).today(), "2025-11-20");
    }

    #[test]
    fn system_clock_yields_iso_date() {
        assert!(is_iso_date(&Clock::System.today()));
    }

    #[test]
    fn iso_date_validation() {
        assert!(is_iso_date("2025-02-28"));
        assert!(!is_iso_date("2025-02-30"));
        assert!(!is_iso_date("2025-2-3"));
        assert!(!is_iso_date("20/11/2025"));
    }
}
