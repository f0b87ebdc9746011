//! Filter validation: raw request strings in, typed `FilterSet` out.
//!
//! Every check is against a fixed allow-list or format rule; the first
//! failure wins and names the offending field.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ValidationError;

pub const SERVICE_CODE_MAX_LEN: usize = 50;

/// Selectable numeric measure, summed per conflict type in the breakdown.
///
/// The code doubles as the warehouse column name and the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    ShiftPrice,
    OverlapPrice,
    FullPrice,
}

impl Measure {
    pub const ALL: [Measure; 4] = [
        Measure::Count,
        Measure::ShiftPrice,
        Measure::OverlapPrice,
        Measure::FullPrice,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Measure::Count => "CO_TO",
            Measure::ShiftPrice => "CO_SP",
            Measure::OverlapPrice => "CO_OP",
            Measure::FullPrice => "CO_FP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Measure::Count => "Count",
            Measure::ShiftPrice => "Shift Price",
            Measure::OverlapPrice => "Overlap Price",
            Measure::FullPrice => "Full Price",
        }
    }

    pub fn parse(code: &str) -> Option<Measure> {
        Measure::ALL.into_iter().find(|m| m.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    U,
    D,
    R,
}

impl StatusFlag {
    pub fn as_sql(self) -> &'static str {
        match self {
            StatusFlag::U => "U",
            StatusFlag::D => "D",
            StatusFlag::R => "R",
        }
    }

    fn parse(raw: &str) -> Option<StatusFlag> {
        match raw {
            "U" => Some(StatusFlag::U),
            "D" => Some(StatusFlag::D),
            "R" => Some(StatusFlag::R),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostType {
    Avoidance,
    Recovery,
}

impl CostType {
    pub fn as_sql(self) -> &'static str {
        match self {
            CostType::Avoidance => "Avoidance",
            CostType::Recovery => "Recovery",
        }
    }

    fn parse(raw: &str) -> Option<CostType> {
        match raw {
            "Avoidance" => Some(CostType::Avoidance),
            "Recovery" => Some(CostType::Recovery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitType {
    Scheduled,
    Confirmed,
    Billed,
    Paid,
}

impl VisitType {
    pub fn as_sql(self) -> &'static str {
        match self {
            VisitType::Scheduled => "Scheduled",
            VisitType::Confirmed => "Confirmed",
            VisitType::Billed => "Billed",
            VisitType::Paid => "Paid",
        }
    }

    fn parse(raw: &str) -> Option<VisitType> {
        match raw {
            "Scheduled" => Some(VisitType::Scheduled),
            "Confirmed" => Some(VisitType::Confirmed),
            "Billed" => Some(VisitType::Billed),
            "Paid" => Some(VisitType::Paid),
            _ => None,
        }
    }
}

/// Raw, unvalidated filter strings as they arrive from the request layer.
///
/// `visit_status_filter` is the superseded alias of `visit_type_filter`; it
/// is still accepted, and the explicit field wins when both are present.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterParams {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub status_filter: Option<String>,
    pub cost_type_filter: Option<String>,
    pub visit_type_filter: Option<String>,
    pub visit_status_filter: Option<String>,
    pub billed_status_filter: Option<String>,
    pub service_code_filter: Option<String>,
}

/// Validated filter selections. Absent fields contribute no predicate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub status: Option<StatusFlag>,
    pub cost_type: Option<CostType>,
    pub visit_type: Option<VisitType>,
    pub billed: Option<bool>,
    pub service_code: Option<String>,
}

/// Validate raw filter inputs into a `FilterSet`. First failure wins.
pub fn validate(params: &FilterParams) -> Result<FilterSet, ValidationError> {
    let from_date = parse_date("from_date", params.from_date.as_deref())?;
    let to_date = parse_date("to_date", params.to_date.as_deref())?;
    if let (Some(from), Some(to)) = (from_date, to_date) {
        if from >= to {
            return Err(ValidationError::new(
                "to_date",
                "To date must be greater than from date",
            ));
        }
    }

    let status = match present(params.status_filter.as_deref()) {
        Some(raw) => Some(StatusFlag::parse(raw).ok_or_else(|| {
            ValidationError::new(
                "status_filter",
                format!("Invalid status filter '{raw}'. Valid values: U, D, R"),
            )
        })?),
        None => None,
    };

    let cost_type = match sentinel(present(params.cost_type_filter.as_deref())) {
        Some(raw) => Some(CostType::parse(raw).ok_or_else(|| {
            ValidationError::new(
                "cost_type_filter",
                format!("Invalid cost type filter '{raw}'. Valid values: Avoidance, Recovery"),
            )
        })?),
        None => None,
    };

    // The explicit visit-type field supersedes the older visit-status alias.
    let (visit_field, visit_raw) = match present(params.visit_type_filter.as_deref()) {
        Some(raw) => ("visit_type_filter", Some(raw)),
        None => (
            "visit_status_filter",
            present(params.visit_status_filter.as_deref()),
        ),
    };
    let visit_type = match sentinel(visit_raw) {
        Some(raw) => Some(VisitType::parse(raw).ok_or_else(|| {
            ValidationError::new(
                visit_field,
                format!(
                    "Invalid visit type filter '{raw}'. Valid values: Scheduled, Confirmed, Billed, Paid"
                ),
            )
        })?),
        None => None,
    };

    let billed = match sentinel(present(params.billed_status_filter.as_deref())) {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        Some(raw) => {
            return Err(ValidationError::new(
                "billed_status_filter",
                format!("Invalid billed status filter '{raw}'. Valid values: yes, no"),
            ));
        }
        None => None,
    };

    let service_code = match present(params.service_code_filter.as_deref()) {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.chars().count() > SERVICE_CODE_MAX_LEN {
                return Err(ValidationError::new(
                    "service_code_filter",
                    format!(
                        "Service code filter must be between 1 and {SERVICE_CODE_MAX_LEN} characters"
                    ),
                ));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    Ok(FilterSet {
        from_date,
        to_date,
        status,
        cost_type,
        visit_type,
        billed,
        service_code,
    })
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match present(raw) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ValidationError::new(
                    field,
                    format!("Invalid {field} '{raw}'. Expected an ISO date (YYYY-MM-DD)"),
                )
            }),
        None => Ok(None),
    }
}

// Form selects submit "" for the blank choice; treat that as absent.
fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

// "all" is the no-restriction sentinel on the enum selects.
fn sentinel(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| *s != "all")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FilterParams {
        FilterParams::default()
    }

    #[test]
    fn empty_params_validate_to_empty_set() {
        let set = validate(&params()).unwrap();
        assert_eq!(set, FilterSet::default());
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let p = FilterParams {
            from_date: Some(String::new()),
            status_filter: Some(String::new()),
            cost_type_filter: Some(String::new()),
            service_code_filter: Some(String::new()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap(), FilterSet::default());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let p = FilterParams {
            from_date: Some("2024-02-01".into()),
            to_date: Some("2024-01-01".into()),
            ..params()
        };
        let err = validate(&p).unwrap_err();
        assert_eq!(err.field, "to_date");
        assert_eq!(err.message, "To date must be greater than from date");
    }

    #[test]
    fn equal_dates_are_rejected() {
        let p = FilterParams {
            from_date: Some("2024-01-01".into()),
            to_date: Some("2024-01-01".into()),
            ..params()
        };
        assert!(validate(&p).is_err());
    }

    #[test]
    fn malformed_date_is_rejected_with_field() {
        let p = FilterParams {
            from_date: Some("01/02/2024".into()),
            ..params()
        };
        let err = validate(&p).unwrap_err();
        assert_eq!(err.field, "from_date");
        assert!(err.message.contains("ISO date"));
    }

    #[test]
    fn valid_dates_parse() {
        let p = FilterParams {
            from_date: Some("2024-01-01".into()),
            to_date: Some("2024-02-01".into()),
            ..params()
        };
        let set = validate(&p).unwrap();
        assert_eq!(set.from_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(set.to_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn status_allow_list() {
        for (raw, expected) in [
            ("U", StatusFlag::U),
            ("D", StatusFlag::D),
            ("R", StatusFlag::R),
        ] {
            let p = FilterParams {
                status_filter: Some(raw.into()),
                ..params()
            };
            assert_eq!(validate(&p).unwrap().status, Some(expected));
        }
        let p = FilterParams {
            status_filter: Some("X".into()),
            ..params()
        };
        let err = validate(&p).unwrap_err();
        assert_eq!(err.field, "status_filter");
    }

    #[test]
    fn cost_type_accepts_all_sentinel() {
        let p = FilterParams {
            cost_type_filter: Some("all".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().cost_type, None);

        let p = FilterParams {
            cost_type_filter: Some("Recovery".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().cost_type, Some(CostType::Recovery));

        let p = FilterParams {
            cost_type_filter: Some("avoidance".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "cost_type_filter");
    }

    #[test]
    fn visit_type_accepts_all_sentinel() {
        let p = FilterParams {
            visit_type_filter: Some("all".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().visit_type, None);

        let p = FilterParams {
            visit_type_filter: Some("Billed".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().visit_type, Some(VisitType::Billed));

        let p = FilterParams {
            visit_type_filter: Some("Cancelled".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "visit_type_filter");
    }

    #[test]
    fn visit_status_alias_feeds_visit_type() {
        let p = FilterParams {
            visit_status_filter: Some("Paid".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().visit_type, Some(VisitType::Paid));

        let p = FilterParams {
            visit_status_filter: Some("Bogus".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "visit_status_filter");
    }

    #[test]
    fn explicit_visit_type_wins_over_alias() {
        let p = FilterParams {
            visit_type_filter: Some("Scheduled".into()),
            visit_status_filter: Some("Paid".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().visit_type, Some(VisitType::Scheduled));
    }

    #[test]
    fn billed_status_allow_list() {
        let p = FilterParams {
            billed_status_filter: Some("yes".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().billed, Some(true));

        let p = FilterParams {
            billed_status_filter: Some("no".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().billed, Some(false));

        let p = FilterParams {
            billed_status_filter: Some("all".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().billed, None);

        let p = FilterParams {
            billed_status_filter: Some("maybe".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "billed_status_filter");
    }

    #[test]
    fn service_code_is_trimmed() {
        let p = FilterParams {
            service_code_filter: Some("  SC100  ".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap().service_code.as_deref(), Some("SC100"));
    }

    #[test]
    fn whitespace_only_service_code_is_rejected() {
        let p = FilterParams {
            service_code_filter: Some("   ".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "service_code_filter");
    }

    #[test]
    fn service_code_length_bounds() {
        let p = FilterParams {
            service_code_filter: Some("x".repeat(SERVICE_CODE_MAX_LEN)),
            ..params()
        };
        assert!(validate(&p).is_ok());

        let p = FilterParams {
            service_code_filter: Some("x".repeat(SERVICE_CODE_MAX_LEN + 1)),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "service_code_filter");
    }

    #[test]
    fn date_order_is_checked_before_allow_lists() {
        let p = FilterParams {
            from_date: Some("2024-02-01".into()),
            to_date: Some("2024-01-01".into()),
            status_filter: Some("X".into()),
            ..params()
        };
        assert_eq!(validate(&p).unwrap_err().field, "to_date");
    }

    #[test]
    fn measure_codes_round_trip() {
        for m in Measure::ALL {
            assert_eq!(Measure::parse(m.code()), Some(m));
        }
        assert_eq!(Measure::parse("XYZ"), None);
        assert_eq!(Measure::parse("co_to"), None);
    }
}
