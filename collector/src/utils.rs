use chrono::{DateTime, Timelike, Utc};

/// Parse ISO8601 date string to a UTC timestamp
pub fn parse_iso8601_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }
    date_str.parse::<DateTime<Utc>>().ok()
}

/// Hour of day (UTC) a video was published at
pub fn publish_hour(date_str: &str) -> Option<u32> {
    parse_iso8601_timestamp(date_str).map(|dt| dt.hour())
}

/// Parse ISO8601 duration string (P1DT1H2M3S) to total seconds.
/// Year and month designators are not used by the video listing and are rejected.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> Option<f64> {
    let rest = duration_str.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, time)
        }
        None => (rest, ""),
    };

    let mut total_seconds = 0.0;
    total_seconds += sum_components(date_part, |unit| match unit {
        'W' => Some(7.0 * 86400.0),
        'D' => Some(86400.0),
        _ => None,
    })?;
    total_seconds += sum_components(time_part, |unit| match unit {
        'H' => Some(3600.0), // Hours
        'M' => Some(60.0),   // Minutes
        'S' => Some(1.0),    // Seconds
        _ => None,
    })?;

    Some(total_seconds)
}

fn sum_components(part: &str, unit_seconds: impl Fn(char) -> Option<f64>) -> Option<f64> {
    let mut total = 0.0;
    let mut current_number = String::new();

    for ch in part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
        } else {
            let num = current_number.parse::<f64>().ok()?;
            total += num * unit_seconds(ch)?;
            current_number.clear();
        }
    }

    // trailing digits without a designator
    if !current_number.is_empty() {
        return None;
    }
    Some(total)
}
