//! Burndown series over a set of work items.
//!
//! Each item contributes three calendar dates: its due date (baseline), its
//! estimated completion (forecast) and its actual completion (actuals). The
//! two optional dates fall back to the due date. For every day `D` in the
//! window, each series holds the number of items whose date is strictly
//! after `D`. Actuals are unknown for days after today and reported as
//! `None`. A window may span at most [`MAX_WINDOW_DAYS`] days.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::WorkItemType;
use super::records::WorkItem;

/// Longest date axis a series may cover, about ten years.
pub const MAX_WINDOW_DAYS: i64 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BurndownError {
    #[error("burndown window {start}..={end} spans {days} days; at most {MAX_WINDOW_DAYS} allowed")]
    WindowTooLong {
        start: NaiveDate,
        end: NaiveDate,
        days: i64,
    },
}

/// The three dates of one item, already resolved to calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDates {
    pub due: NaiveDate,
    pub estimated: Option<NaiveDate>,
    pub actual: Option<NaiveDate>,
}

impl ItemDates {
    pub fn due_only(due: NaiveDate) -> Self {
        Self {
            due,
            estimated: None,
            actual: None,
        }
    }

    fn baseline(&self) -> NaiveDate {
        self.due
    }

    fn forecast(&self) -> NaiveDate {
        self.estimated.unwrap_or(self.due)
    }

    fn actuals(&self) -> NaiveDate {
        self.actual.unwrap_or(self.due)
    }
}

impl From<&WorkItem> for ItemDates {
    fn from(item: &WorkItem) -> Self {
        Self {
            due: item.due_date.date_naive(),
            estimated: item.estimated_completion_date.map(|d| d.date_naive()),
            actual: item.actual_completion_date.map(|d| d.date_naive()),
        }
    }
}

/// Optional explicit bounds for the date axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Narrows the item set before the series is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownQuery {
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub part_number_id: Option<i64>,
    #[serde(default)]
    pub work_item_type: Option<WorkItemType>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl BurndownQuery {
    pub fn matches(&self, item: &WorkItem) -> bool {
        self.program_id.is_none_or(|id| item.program_id == id)
            && self
                .part_number_id
                .is_none_or(|id| item.part_number_ids.contains(&id))
            && self.work_item_type.is_none_or(|t| item.work_item_type == t)
    }

    pub fn window(&self) -> Result<Window, String> {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(super::dates::parse_calendar_date)
                .transpose()
        };
        Ok(Window {
            start: parse(&self.start_date)?,
            end: parse(&self.end_date)?,
        })
    }
}

/// Parallel day-indexed series. All four vectors have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurndownSeries {
    pub dates: Vec<NaiveDate>,
    pub baseline: Vec<u32>,
    pub forecast: Vec<u32>,
    pub actuals: Vec<Option<u32>>,
}

impl BurndownSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Computes the burndown series. `today` is injected so callers control
/// where the actuals stop.
pub fn compute(
    items: &[ItemDates],
    window: Window,
    today: NaiveDate,
) -> Result<BurndownSeries, BurndownError> {
    let all_dates = || {
        items
            .iter()
            .flat_map(|i| [i.baseline(), i.forecast(), i.actuals()])
    };

    let Some(start) = window.start.or_else(|| all_dates().min()) else {
        return Ok(BurndownSeries::default());
    };
    let end = window
        .end
        .or_else(|| all_dates().max())
        .unwrap_or(start)
        .max(today);
    if start > end {
        return Ok(BurndownSeries::default());
    }
    let days = end.signed_duration_since(start).num_days() + 1;
    if days > MAX_WINDOW_DAYS {
        return Err(BurndownError::WindowTooLong { start, end, days });
    }

    let remaining = |day: NaiveDate, pick: fn(&ItemDates) -> NaiveDate| {
        items.iter().filter(|i| pick(i) > day).count() as u32
    };

    let mut series = BurndownSeries::default();
    for day in start.iter_days().take_while(|d| *d <= end) {
        series.dates.push(day);
        series.baseline.push(remaining(day, ItemDates::baseline));
        series.forecast.push(remaining(day, ItemDates::forecast));
        series
            .actuals
            .push((day <= today).then(|| remaining(day, ItemDates::actuals)));
    }
    Ok(series)
}

/// Same as [`compute`] over stored work items, using the current UTC day.
pub fn for_work_items(items: &[WorkItem], window: Window) -> Result<BurndownSeries, BurndownError> {
    let dates: Vec<ItemDates> = items.iter().map(ItemDates::from).collect();
    compute(&dates, window, Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.checked_add_signed(chrono::Duration::days(n)))
            .unwrap()
    }

    fn window(start: i64, end: i64) -> Window {
        Window {
            start: Some(day(start)),
            end: Some(day(end)),
        }
    }

    #[test]
    fn baseline_steps_down_after_each_due_date() {
        let items = [
            ItemDates::due_only(day(1)),
            ItemDates::due_only(day(5)),
            ItemDates::due_only(day(10)),
        ];
        let series = compute(&items, window(0, 10), day(10)).unwrap();

        assert_eq!(series.len(), 11);
        assert_eq!(
            series.baseline,
            vec![3, 2, 2, 2, 2, 1, 1, 1, 1, 1, 0]
        );
        assert_eq!(series.forecast, series.baseline);
        let actuals: Vec<u32> = series.actuals.iter().map(|v| v.unwrap_or(99)).collect();
        assert_eq!(actuals, series.baseline);
    }

    #[test]
    fn actuals_are_absent_after_today() {
        let items = [ItemDates::due_only(day(2)), ItemDates::due_only(day(8))];
        let series = compute(&items, window(0, 8), day(4)).unwrap();

        for (date, actual) in series.dates.iter().zip(&series.actuals) {
            assert_eq!(actual.is_none(), *date > day(4), "on {date}");
        }
        assert_eq!(series.actuals[4], Some(1));
    }

    #[test]
    fn forecast_and_actuals_use_their_own_dates() {
        let items = [ItemDates {
            due: day(3),
            estimated: Some(day(5)),
            actual: Some(day(1)),
        }];
        let series = compute(&items, window(0, 6), day(6)).unwrap();

        assert_eq!(series.baseline, vec![1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(series.forecast, vec![1, 1, 1, 1, 1, 0, 0]);
        assert_eq!(
            series.actuals,
            vec![Some(1), Some(0), Some(0), Some(0), Some(0), Some(0), Some(0)]
        );
    }

    #[test]
    fn implicit_window_spans_all_dates_and_reaches_today() {
        let items = [ItemDates {
            due: day(3),
            estimated: Some(day(6)),
            actual: Some(day(2)),
        }];
        let series = compute(&items, Window::default(), day(9)).unwrap();

        assert_eq!(series.dates.first(), Some(&day(2)));
        assert_eq!(series.dates.last(), Some(&day(9)));
    }

    #[test]
    fn future_dates_are_not_clipped_to_today() {
        let items = [ItemDates::due_only(day(20))];
        let series = compute(&items, Window::default(), day(5)).unwrap();

        assert_eq!(series.dates.first(), Some(&day(20)));
        assert_eq!(series.dates.last(), Some(&day(20)));
        assert_eq!(series.actuals, vec![None]);
    }

    #[test]
    fn past_explicit_end_extends_to_today() {
        let items = [ItemDates::due_only(day(1))];
        let series = compute(&items, window(0, 2), day(4)).unwrap();
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn remaining_matches_strictly_after_count() {
        let items = [
            ItemDates::due_only(day(0)),
            ItemDates::due_only(day(3)),
            ItemDates::due_only(day(3)),
            ItemDates {
                due: day(4),
                estimated: Some(day(7)),
                actual: None,
            },
        ];
        let series = compute(&items, window(0, 8), day(8)).unwrap();
        for (idx, date) in series.dates.iter().enumerate() {
            let expected = items.iter().filter(|i| i.forecast() > *date).count() as u32;
            assert_eq!(series.forecast[idx], expected, "forecast on {date}");
        }
    }

    #[test]
    fn empty_items_without_start_yield_empty_series() {
        let series = compute(&[], Window::default(), day(0)).unwrap();
        assert!(series.is_empty());
        assert!(series.baseline.is_empty() && series.actuals.is_empty());
    }

    #[test]
    fn empty_items_with_start_yield_zero_series() {
        let series = compute(
            &[],
            Window {
                start: Some(day(0)),
                end: None,
            },
            day(2),
        )
        .unwrap();
        assert_eq!(series.baseline, vec![0, 0, 0]);
        assert_eq!(series.actuals, vec![Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn inverted_window_is_empty() {
        let items = [ItemDates::due_only(day(1))];
        let series = compute(&items, window(10, 2), day(0)).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn oversized_window_is_rejected() {
        let items = [ItemDates::due_only(day(1))];
        let ancient = Window {
            start: NaiveDate::from_ymd_opt(1, 1, 1),
            end: None,
        };
        assert!(matches!(
            compute(&items, ancient, day(0)),
            Err(BurndownError::WindowTooLong { .. })
        ));

        let query = BurndownQuery {
            start_date: Some("-200000-01-01".to_string()),
            ..Default::default()
        };
        let deep_past = query.window().unwrap();
        assert!(compute(&items, deep_past, day(0)).is_err());

        // Stored dates far apart widen the implicit window just the same.
        let spread = [ItemDates::due_only(day(0)), ItemDates::due_only(day(5000))];
        assert!(compute(&spread, Window::default(), day(0)).is_err());

        let longest = compute(&[], window(0, MAX_WINDOW_DAYS - 1), day(0)).unwrap();
        assert_eq!(longest.len(), MAX_WINDOW_DAYS as usize);
        assert!(compute(&[], window(0, MAX_WINDOW_DAYS), day(0)).is_err());
    }

    #[test]
    fn query_window_parses_dates() {
        let query = BurndownQuery {
            start_date: Some("2025-01-01".to_string()),
            end_date: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            query.window(),
            Ok(Window {
                start: Some(day(0)),
                end: None,
            })
        );

        let bad = BurndownQuery {
            start_date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(bad.window().is_err());
    }
}
