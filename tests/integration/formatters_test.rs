// Formatting helper properties over ranges of inputs

use tubegrab::ui::{format_duration, format_size, format_views};

#[test]
fn test_durations_of_an_hour_or_more_use_three_fields() {
    for d in [3600u64, 3661, 5000, 86399, 360_000] {
        let formatted = format_duration(Some(d));
        let fields: Vec<&str> = formatted.split(':').collect();
        assert_eq!(fields.len(), 3, "{} -> {}", d, formatted);
        // minutes and seconds are zero-padded to two digits
        assert_eq!(fields[1].len(), 2, "{} -> {}", d, formatted);
        assert_eq!(fields[2].len(), 2, "{} -> {}", d, formatted);
        assert!(fields[1].parse::<u64>().unwrap() < 60);
        assert!(fields[2].parse::<u64>().unwrap() < 60);
    }
}

#[test]
fn test_durations_under_an_hour_use_two_fields() {
    for d in [1u64, 59, 60, 61, 599, 3599] {
        let formatted = format_duration(Some(d));
        let fields: Vec<&str> = formatted.split(':').collect();
        assert_eq!(fields.len(), 2, "{} -> {}", d, formatted);
        assert_eq!(fields[0].len(), 2);
        assert_eq!(fields[1].len(), 2);
    }
}

#[test]
fn test_unknown_durations_render_na() {
    assert_eq!(format_duration(None), "N/A");
    assert_eq!(format_duration(Some(0)), "N/A");
}

#[test]
fn test_size_unit_ladder() {
    let kib = 1024u64;
    let cases = [
        (0, "B"),
        (1023, "B"),
        (kib, "KB"),
        (kib * kib - 1, "KB"),
        (kib * kib, "MB"),
        (kib.pow(3), "GB"),
        (kib.pow(4), "TB"),
        (kib.pow(4) * 900, "TB"),
    ];

    for (bytes, unit) in cases {
        let formatted = format_size(Some(bytes));
        assert!(
            formatted.ends_with(unit),
            "{} bytes -> {} (expected unit {})",
            bytes,
            formatted,
            unit
        );
        // one decimal place before the unit
        let number = formatted.trim_end_matches(char::is_alphabetic);
        let (_, decimals) = number.split_once('.').expect("has a decimal point");
        assert_eq!(decimals.len(), 1, "{} -> {}", bytes, formatted);
    }
}

#[test]
fn test_size_value_is_scaled_by_1024_steps() {
    assert_eq!(format_size(Some(1536)), "1.5KB");
    assert_eq!(format_size(Some(1024 * 1024 * 3 / 2)), "1.5MB");
    assert_eq!(format_size(None), "N/A");
}

#[test]
fn test_views_grouping() {
    assert_eq!(format_views(Some(7)), "7");
    assert_eq!(format_views(Some(1_000)), "1,000");
    assert_eq!(format_views(Some(12_345_678)), "12,345,678");
    assert_eq!(format_views(None), "N/A");
}
