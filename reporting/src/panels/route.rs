//! Route-query synchronization.
//!
//! The query string is the dashboard's only deep-linkable state: the
//! date range, the drilled-down user or sender, and the active tab all
//! round-trip through it.

use chrono::NaiveDate;

use crate::models::time::{DateRangeSelection, RangeType, TimeError};

/// Typed view of the recognized query parameters. Unknown parameters
/// are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteQuery {
    pub range_type: Option<String>,
    /// `YYYY-MM-DD`, local.
    pub start: Option<String>,
    pub end: Option<String>,
    pub user: Option<String>,
    pub email: Option<String>,
    pub server: Option<String>,
    pub tab: Option<String>,
}

impl RouteQuery {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut q = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                "range_type" => &mut q.range_type,
                "start" => &mut q.start,
                "end" => &mut q.end,
                "user" => &mut q.user,
                "email" => &mut q.email,
                "server" => &mut q.server,
                "tab" => &mut q.tab,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        q
    }

    /// Present parameters in a stable order, for writing back to the
    /// route.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("range_type", &self.range_type),
            ("start", &self.start),
            ("end", &self.end),
            ("user", &self.user),
            ("email", &self.email),
            ("server", &self.server),
            ("tab", &self.tab),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k, v.clone())))
        .collect()
    }

    /// Write the date-range parameters. Only custom ranges carry
    /// explicit dates; named ranges are re-derived from "today" when
    /// read back.
    pub fn set_range(&mut self, selection: &DateRangeSelection) {
        self.range_type = Some(selection.range_type.as_route_str());
        if selection.range_type == RangeType::Custom {
            let (start, end) = selection.route_dates();
            self.start = Some(start);
            self.end = Some(end);
        } else {
            self.start = None;
            self.end = None;
        }
    }

    /// Reconstruct the date range, deriving named ranges from `today`.
    /// `None` when the route carries no range.
    pub fn range_selection(&self, today: NaiveDate) -> Result<Option<DateRangeSelection>, TimeError> {
        let Some(range_type) = self.range_type.as_deref() else {
            return Ok(None);
        };
        let range_type = RangeType::from_route_str(range_type)?;
        if range_type == RangeType::Custom {
            let (Some(start), Some(end)) = (self.start.as_deref(), self.end.as_deref()) else {
                return Ok(None);
            };
            let parse = |s: &str| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| TimeError::BadDate(s.to_string()))
            };
            return DateRangeSelection::custom(parse(start)?, parse(end)?).map(Some);
        }
        Ok(Some(DateRangeSelection::from_type(range_type, today)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_pairs_round_trip() {
        let q = RouteQuery {
            range_type: Some("last30days".to_string()),
            user: Some("alice@example.com".to_string()),
            tab: Some("1".to_string()),
            ..RouteQuery::default()
        };
        let pairs = q.to_pairs();
        let restored = RouteQuery::from_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        assert_eq!(restored, q);
    }

    #[test]
    fn test_unknown_parameters_dropped() {
        let q = RouteQuery::from_pairs([("utm_source", "x"), ("user", "bob@example.com")]);
        assert_eq!(q.user.as_deref(), Some("bob@example.com"));
        assert_eq!(q.to_pairs().len(), 1);
    }

    #[test]
    fn test_custom_range_carries_dates() {
        let sel = DateRangeSelection::custom(d(2024, 2, 1), d(2024, 2, 15)).unwrap();
        let mut q = RouteQuery::default();
        q.set_range(&sel);
        assert_eq!(q.start.as_deref(), Some("2024-02-01"));
        let restored = q.range_selection(d(2024, 3, 1)).unwrap().unwrap();
        assert_eq!(restored, sel);
    }

    #[test]
    fn test_named_range_rederived_from_today() {
        let sel = DateRangeSelection::from_type(RangeType::Ytd, d(2024, 1, 15));
        let mut q = RouteQuery::default();
        q.set_range(&sel);
        assert!(q.start.is_none());
        // reading the route on a later day re-derives the range
        let restored = q.range_selection(d(2024, 1, 20)).unwrap().unwrap();
        assert_eq!(restored.start, d(2024, 1, 1));
        assert_eq!(restored.end, d(2024, 1, 20));
    }

    #[test]
    fn test_bad_range_type_errors() {
        let q = RouteQuery {
            range_type: Some("fortnight".to_string()),
            ..RouteQuery::default()
        };
        assert!(q.range_selection(d(2024, 1, 1)).is_err());
    }
}
