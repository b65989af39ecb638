//! Timeframe scaling for displayed funding rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the `1day` view presents an hourly rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneDayView {
    /// Show the hourly rate unchanged (multiplier 1).
    #[default]
    HourlyRate,
    /// Project the hourly rate over 24 hours.
    DailyProjection,
}

/// Display window for aggregated funding rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Timeframe {
    #[default]
    Current,
    OneDay,
    SevenDay,
    ThirtyDay,
    OneYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::Current,
        Timeframe::OneDay,
        Timeframe::SevenDay,
        Timeframe::ThirtyDay,
        Timeframe::OneYear,
    ];

    /// Factor applied to an hourly rate.
    pub fn multiplier(&self, one_day: OneDayView) -> Decimal {
        let hours: u32 = match self {
            Timeframe::Current => 1,
            Timeframe::OneDay => match one_day {
                OneDayView::HourlyRate => 1,
                OneDayView::DailyProjection => 24,
            },
            Timeframe::SevenDay => 24 * 7,
            Timeframe::ThirtyDay => 24 * 30,
            Timeframe::OneYear => 24 * 365,
        };
        Decimal::from(hours)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Current => "current",
            Timeframe::OneDay => "1day",
            Timeframe::SevenDay => "7day",
            Timeframe::ThirtyDay => "30day",
            Timeframe::OneYear => "1year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown timeframe '{}', expected one of current, 1day, 7day, 30day, 1year",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_multiplier_table() {
        let view = OneDayView::HourlyRate;
        assert_eq!(Timeframe::Current.multiplier(view), dec!(1));
        assert_eq!(Timeframe::OneDay.multiplier(view), dec!(1));
        assert_eq!(Timeframe::SevenDay.multiplier(view), dec!(168));
        assert_eq!(Timeframe::ThirtyDay.multiplier(view), dec!(720));
        assert_eq!(Timeframe::OneYear.multiplier(view), dec!(8760));
    }

    #[test]
    fn test_daily_projection_policy() {
        assert_eq!(
            Timeframe::OneDay.multiplier(OneDayView::DailyProjection),
            dec!(24)
        );
        assert_eq!(
            Timeframe::Current.multiplier(OneDayView::DailyProjection),
            dec!(1)
        );
    }

    #[test]
    fn test_parse() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!("1DAY".parse::<Timeframe>().unwrap(), Timeframe::OneDay);
        assert!("2day".parse::<Timeframe>().is_err());
    }
}
