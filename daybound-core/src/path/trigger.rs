//! Price triggers — does a candle touch a level?

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Which side of the level the price must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchDirection {
    /// Fires when `high >= level`.
    UpwardTouch,
    /// Fires when `low <= level`.
    DownwardTouch,
}

/// A price level watched for first touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTrigger {
    pub level: f64,
    pub direction: TouchDirection,
}

impl PriceTrigger {
    pub fn upward(level: f64) -> Self {
        Self {
            level,
            direction: TouchDirection::UpwardTouch,
        }
    }

    pub fn downward(level: f64) -> Self {
        Self {
            level,
            direction: TouchDirection::DownwardTouch,
        }
    }

    /// Directional predicate over the candle's range.
    pub fn fires_on(&self, candle: &Candle) -> bool {
        match self.direction {
            TouchDirection::UpwardTouch => candle.high >= self.level,
            TouchDirection::DownwardTouch => candle.low <= self.level,
        }
    }

    /// True if the candle opened already beyond the level.
    pub fn gapped_through(&self, candle: &Candle) -> bool {
        match self.direction {
            TouchDirection::UpwardTouch => candle.open >= self.level,
            TouchDirection::DownwardTouch => candle.open <= self.level,
        }
    }
}

/// Price assumed for a fill when the trigger candle gapped through the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fill at the exact trigger level, gap or not.
    #[default]
    FillAtTrigger,
    /// Fill at the candle open when it opened beyond the level.
    FillAtOpen,
}

/// Raw fill price for a trigger that fired on `candle`.
pub fn fill_price(trigger: &PriceTrigger, candle: &Candle, policy: GapPolicy) -> f64 {
    match policy {
        GapPolicy::FillAtTrigger => trigger.level,
        GapPolicy::FillAtOpen if trigger.gapped_through(candle) => candle.open,
        GapPolicy::FillAtOpen => trigger.level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            open,
            high,
            low,
            close,
        }
    }

    #[test]
    fn upward_touch_is_inclusive() {
        let c = candle(100.0, 101.0, 99.0, 100.5);
        assert!(PriceTrigger::upward(101.0).fires_on(&c));
        assert!(!PriceTrigger::upward(101.01).fires_on(&c));
    }

    #[test]
    fn downward_touch_is_inclusive() {
        let c = candle(100.0, 101.0, 99.0, 100.5);
        assert!(PriceTrigger::downward(99.0).fires_on(&c));
        assert!(!PriceTrigger::downward(98.99).fires_on(&c));
    }

    #[test]
    fn fill_at_trigger_ignores_gap() {
        let c = candle(98.0, 99.0, 97.5, 98.5);
        let dip = PriceTrigger::downward(99.5);
        assert_eq!(fill_price(&dip, &c, GapPolicy::FillAtTrigger), 99.5);
    }

    #[test]
    fn fill_at_open_uses_open_only_on_gap() {
        let dip = PriceTrigger::downward(99.5);
        let gapped = candle(98.0, 99.0, 97.5, 98.5);
        assert_eq!(fill_price(&dip, &gapped, GapPolicy::FillAtOpen), 98.0);

        let touched = candle(100.0, 100.2, 99.4, 99.8);
        assert_eq!(fill_price(&dip, &touched, GapPolicy::FillAtOpen), 99.5);
    }
}
