use chrono::NaiveDate;

use crate::data::conversions::vyvanse_dex_eq_to_capsule_mg;
use crate::data::Schedule;

/// Format a decimal hour as a 12-hour clock label
///
/// Rounds to the nearest minute and wraps at 24 h: `0.0 -> "12am"`,
/// `13.5 -> "1:30pm"`, `24.0 -> "12am"`.
pub fn format_time_12h(hour: f64) -> String {
    let hour = if hour.is_finite() { hour } else { 0.0 };
    let total_min = ((hour * 60.0).round() as i64).rem_euclid(24 * 60);
    let (h24, m) = (total_min / 60, total_min % 60);
    let suffix = if h24 < 12 { "am" } else { "pm" };
    let h12 = match h24 % 12 {
        0 => 12,
        h => h,
    };
    if m == 0 {
        format!("{h12}{suffix}")
    } else {
        format!("{h12}:{m:02}{suffix}")
    }
}

/// Compact number formatting without trailing zeros
pub fn format_number(x: f64) -> String {
    let s = format!("{:.10}", x);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// File name describing a dosing schedule
///
/// `YYYY-MM-DD-<component>-[vyv-<cap>mg@<t>+...][<mg>mg@<t>+...].<ext>`.
/// Vyvanse doses are given in dex-equivalent mg and labelled by capsule size.
/// Entries are ordered by time within each drug, Vyvanse first. Without any
/// doses the name is `YYYY-MM-DD-<component>.<ext>`.
pub fn schedule_filename(
    component: &str,
    date: NaiveDate,
    vyvanse: Option<&Schedule>,
    dex: Option<&Schedule>,
    ext: &str,
) -> String {
    let mut tokens = Vec::new();
    if let Some(vyvanse) = vyvanse {
        for dose in vyvanse.sorted().doses() {
            tokens.push(format!(
                "vyv-{}mg@{}",
                format_number(vyvanse_dex_eq_to_capsule_mg(dose.amount())),
                format_number(dose.time())
            ));
        }
    }
    if let Some(dex) = dex {
        for dose in dex.sorted().doses() {
            tokens.push(format!(
                "{}mg@{}",
                format_number(dose.amount()),
                format_number(dose.time())
            ));
        }
    }

    let suffix = if tokens.is_empty() {
        String::new()
    } else {
        format!("-{}", tokens.join("+"))
    };
    format!("{}-{component}{suffix}.{ext}", date.format("%Y-%m-%d"))
}
