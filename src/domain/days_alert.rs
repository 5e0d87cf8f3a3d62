/// How many days ahead of a birthday the subscriber wants to be reminded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaysAlert(i32);

impl DaysAlert {
    pub const MAX: i32 = 366;

    pub fn parse(s: &str) -> Result<Self, String> {
        let days: i32 = s
            .trim()
            .parse()
            .map_err(|_| format!("{s} is not a number of days."))?;
        Self::try_from(days)
    }

    pub fn days(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for DaysAlert {
    type Error = String;

    fn try_from(days: i32) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(format!("A reminder must be between 1 and {} days ahead.", Self::MAX))
        }
    }
}
