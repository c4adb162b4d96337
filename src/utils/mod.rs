/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use std::time::Instant;

/// Returns a formatted string of elapsed time, e.g. `1min 34.852s`.
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{}s", sub_sec, sub_milli)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_formats_sub_minute_durations() {
        let start = Instant::now();
        let s = get_formatted_elapsed_time(start);
        assert!(s.ends_with('s'));
        assert!(!s.contains("min"));
    }
}
