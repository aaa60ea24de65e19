use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const HOURS_IN_DAY: u32 = 24;

// Hours that start each month (and end the next month), with 13 values so that the end of the
// final month is handled. E.g. Jan is hours 0-743
const MONTH_START_END_HOURS: [u32; 13] = [
    0, 744, 1416, 2160, 2880, 3624, 4344, 5088, 5832, 6552, 7296, 8016, 8760,
];

const HOURS_IN_YEAR: u32 = 8760;

/// Months (1-based) counted as summer in seasonal results.
pub const SUMMER_MONTHS: std::ops::RangeInclusive<u32> = 5..=9;

/// Calendar year used to label hours of the representative year. Not a leap year.
const NOMINAL_YEAR: i32 = 2019;

/// A representative year of fixed hourly steps. A year longer or shorter than 8760 hours wraps
/// onto the calendar of a 365 day year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTime {
    total_steps: usize,
}

impl SimulationTime {
    pub fn new(total_steps: usize) -> Self {
        Self { total_steps }
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn iter(&self) -> SimulationTimeIterator {
        SimulationTimeIterator {
            current_index: 0,
            total_steps: self.total_steps,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulationTimeIterator {
    current_index: usize,
    total_steps: usize,
}

impl Iterator for SimulationTimeIterator {
    type Item = SimulationTimeIteration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.total_steps {
            return None;
        }
        let iteration = SimulationTimeIteration {
            index: self.current_index,
        };
        self.current_index += 1;
        Some(iteration)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_steps - self.current_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SimulationTimeIterator {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    pub index: usize,
}

impl SimulationTimeIteration {
    fn hour_of_year(&self) -> u32 {
        (self.index % HOURS_IN_YEAR as usize) as u32
    }

    pub fn hour_of_day(&self) -> u32 {
        self.hour_of_year() % HOURS_IN_DAY
    }

    /// 1-based day of the year
    pub fn day_of_year(&self) -> u32 {
        self.hour_of_year() / HOURS_IN_DAY + 1
    }

    /// 0-based month index
    pub fn current_month(&self) -> usize {
        let hour = self.hour_of_year();
        MONTH_START_END_HOURS
            .iter()
            .skip(1)
            .position(|end_hour| hour < *end_hour)
            .unwrap_or(11)
    }

    pub fn current_month_start_end_hours(&self) -> (u32, u32) {
        let month_idx = self.current_month();
        (
            MONTH_START_END_HOURS[month_idx],
            MONTH_START_END_HOURS[month_idx + 1],
        )
    }

    pub fn is_summer(&self) -> bool {
        SUMMER_MONTHS.contains(&(self.current_month() as u32 + 1))
    }

    /// Start of the hour on the nominal calendar
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(NOMINAL_YEAR, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|start| start + Duration::hours(self.hour_of_year() as i64))
    }
}
