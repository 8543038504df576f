use std::time::Duration;

use spotctl::utils::*;

#[test]
fn test_generate_state_length_and_charset() {
    for length in [8, 16, 32, 64] {
        let state = generate_state(length).unwrap();

        assert_eq!(state.len(), length);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));

        // Two generated tokens should be different
        let other = generate_state(length).unwrap();
        assert_ne!(state, other);
    }
}

#[test]
fn test_generate_state_odd_length() {
    let state = generate_state(7).unwrap();
    assert_eq!(state.len(), 7);
    assert!(generate_state(0).unwrap().is_empty());
}

#[test]
fn test_mask_string() {
    assert_eq!(mask_string(""), "");
    assert_eq!(mask_string("abcd"), "****");
    assert_eq!(mask_string("abcdefgh"), "********");
    assert_eq!(mask_string("abcdefghi"), "abcd*fghi");
    assert_eq!(mask_string("1234567890abcdef"), "1234********cdef");
}

#[test]
fn test_mask_string_keeps_char_count() {
    let masked = mask_string("äöüßäöüßäöüß");
    assert_eq!(masked.chars().count(), 12);
    assert_eq!(masked, "äöüß****äöüß");
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(&Duration::from_secs(300)), "5 minutes");
    assert_eq!(format_duration(&Duration::from_secs(60)), "1 minute");
    assert_eq!(format_duration(&Duration::from_secs(90)), "90 seconds");
    assert_eq!(format_duration(&Duration::from_secs(1)), "1 second");
    assert_eq!(format_duration(&Duration::from_millis(250)), "250 milliseconds");
}
