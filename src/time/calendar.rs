//! Display strings for the preview surface.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::time::ticks::{TickRate, Ticks};

fn device_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)
}

pub fn ticks_to_calendar(ticks: Ticks, rate: TickRate) -> Option<NaiveDateTime> {
    let nanos = i64::try_from(rate.ticks_to_nanoseconds(ticks)).ok()?;
    device_epoch()?.checked_add_signed(Duration::nanoseconds(nanos))
}

/// `YYYY-MM-DD HH:MM:SS:mmmm:uuuu`; the last two fields are the milliseconds
/// and the microseconds within that millisecond.
pub fn format_ticks(ticks: Ticks, rate: TickRate) -> Option<String> {
    let dt = ticks_to_calendar(ticks, rate)?;
    let sub = dt.nanosecond() % 1_000_000_000;
    Some(format!(
        "{}:{:04}:{:04}",
        dt.format("%Y-%m-%d %H:%M:%S"),
        sub / 1_000_000,
        (sub / 1_000) % 1_000
    ))
}

pub fn ntp_line(ticks: Option<Ticks>, rate: TickRate) -> String {
    match ticks.and_then(|t| format_ticks(t, rate)) {
        Some(text) => format!("Current NTP Time: {text}"),
        None => "Current NTP Time: N/A".to_string(),
    }
}

pub fn sys_line(ticks: Ticks, rate: TickRate) -> String {
    match format_ticks(ticks, rate) {
        Some(text) => format!("Current SYS Time: {text}"),
        None => "Current SYS Time: N/A".to_string(),
    }
}

pub fn timezone_line(offset_seconds: i32) -> String {
    format!("Timezone: {offset_seconds:+}secs")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: TickRate = TickRate::NANOSECOND;

    #[test]
    fn epoch_start() {
        assert_eq!(
            format_ticks(Ticks(0), NS).as_deref(),
            Some("2000-01-01 00:00:00:0000:0000")
        );
    }

    #[test]
    fn sub_second_fields() {
        let ticks = Ticks(86_400 * 1_000_000_000 + 1_502_000);
        assert_eq!(
            format_ticks(ticks, NS).as_deref(),
            Some("2000-01-02 00:00:00:0001:0502")
        );
    }

    #[test]
    fn known_instant() {
        // 2023-11-14 22:13:20 UTC is 1_700_000_000 unix seconds
        let since_2000 = 1_700_000_000i64 - 946_684_800;
        let ticks = NS.seconds_to_ticks(since_2000);
        assert_eq!(
            format_ticks(ticks, NS).as_deref(),
            Some("2023-11-14 22:13:20:0000:0000")
        );
    }

    #[test]
    fn lines() {
        assert_eq!(ntp_line(None, NS), "Current NTP Time: N/A");
        assert_eq!(
            ntp_line(Some(Ticks(0)), NS),
            "Current NTP Time: 2000-01-01 00:00:00:0000:0000"
        );
        assert_eq!(
            sys_line(Ticks(999_999_999), NS),
            "Current SYS Time: 2000-01-01 00:00:00:0999:0999"
        );
        assert_eq!(timezone_line(3600), "Timezone: +3600secs");
        assert_eq!(timezone_line(-18_000), "Timezone: -18000secs");
        assert_eq!(timezone_line(0), "Timezone: +0secs");
    }
}
