use chrono::{Datelike, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Birthday(NaiveDate);

impl Birthday {
    /// Parses a `YYYY-MM-DD` date of birth, rejecting dates after today (UTC).
    pub fn parse(s: &str) -> Result<Self, String> {
        Self::parse_relative_to(s, Utc::now().date_naive())
    }

    pub fn parse_relative_to(s: &str, today: NaiveDate) -> Result<Self, String> {
        let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| format!("{s} is not a valid date of birth: {e}"))?;
        if date > today {
            return Err(format!("{s} is in the future."));
        }
        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Date the birthday is celebrated on in `year`. People born on
    /// 29 February celebrate on 1 March in non-leap years.
    pub fn observed_in(&self, year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, self.0.month(), self.0.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
            .expect("1 March exists in every year")
    }

    /// First celebration strictly after `today`.
    pub fn next_after(&self, today: NaiveDate) -> NaiveDate {
        let this_year = self.observed_in(today.year());
        if this_year > today {
            this_year
        } else {
            self.observed_in(today.year() + 1)
        }
    }

    /// Days from `today` to the next celebration, always in `1..=366`.
    pub fn days_until_next(&self, today: NaiveDate) -> i64 {
        (self.next_after(today) - today).num_days()
    }
}

impl From<NaiveDate> for Birthday {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
