//! Tests for outcomes and the color table

#[cfg(test)]
mod tests {
    use super::super::outcome::*;
    use chrono::{TimeZone, Utc};

    fn outcome(number: u8) -> RoundOutcome {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        RoundOutcome::new(number, ts, "Immersive Roulette", "20250101_120000").unwrap()
    }

    #[test]
    fn color_table_matches_the_european_wheel() {
        use Color::{Black as B, Green as G, Red as R};
        // full 37-entry enumeration; this is not a parity rule
        let expected = [
            G, // 0
            R, B, R, B, R, B, R, B, R, B, // 1-10
            B, R, B, R, B, R, B, R, R, B, // 11-20
            R, B, R, B, R, B, R, B, B, R, // 21-30
            B, R, B, R, B, R, // 31-36
        ];
        for (number, want) in expected.iter().enumerate() {
            assert_eq!(
                color_of(number as i64).unwrap(),
                *want,
                "wrong color for {number}"
            );
        }
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert!(color_of(37).is_err());
        assert!(color_of(-1).is_err());
        assert!(color_of(100).is_err());
        assert!(RoundOutcome::new(37, Utc::now(), "t", "s").is_err());
    }

    #[test]
    fn zero_counts_as_even() {
        assert!(outcome(0).is_even());
        assert!(!outcome(0).is_odd());
        assert!(outcome(2).is_even());
        assert!(outcome(7).is_odd());
    }

    #[test]
    fn dozen_boundaries() {
        assert_eq!(outcome(0).dozen(), 0);
        assert_eq!(outcome(1).dozen(), 1);
        assert_eq!(outcome(12).dozen(), 1);
        assert_eq!(outcome(13).dozen(), 2);
        assert_eq!(outcome(24).dozen(), 2);
        assert_eq!(outcome(25).dozen(), 3);
        assert_eq!(outcome(36).dozen(), 3);
    }

    #[test]
    fn column_boundaries() {
        assert_eq!(outcome(0).column(), 0);
        assert_eq!(outcome(1).column(), 1);
        assert_eq!(outcome(2).column(), 2);
        assert_eq!(outcome(3).column(), 3);
        assert_eq!(outcome(4).column(), 1);
        assert_eq!(outcome(36).column(), 3);
    }

    #[test]
    fn high_low_boundaries() {
        assert_eq!(outcome(0).high_low(), HighLow::Zero);
        assert_eq!(outcome(1).high_low(), HighLow::Low);
        assert_eq!(outcome(18).high_low(), HighLow::Low);
        assert_eq!(outcome(19).high_low(), HighLow::High);
        assert_eq!(outcome(36).high_low(), HighLow::High);
    }

    #[test]
    fn record_flattens_stored_and_derived_fields() {
        let record = outcome(15).to_record();
        assert_eq!(record.number, 15);
        assert_eq!(record.color, Color::Black);
        assert_eq!(record.table_name, "Immersive Roulette");
        assert_eq!(record.session_id, "20250101_120000");
        assert!(!record.is_even);
        assert!(record.is_odd);
        assert_eq!(record.dozen, 2);
        assert_eq!(record.column, 3);
        assert_eq!(record.high_low, HighLow::Low);
    }

    #[test]
    fn record_serializes_with_flat_lowercase_fields() {
        let json = serde_json::to_value(outcome(19).to_record()).unwrap();
        assert_eq!(json["number"], 19);
        assert_eq!(json["color"], "red");
        assert_eq!(json["high_low"], "high");
        assert_eq!(json["is_odd"], true);
        assert_eq!(json["dozen"], 2);
        assert_eq!(json["column"], 1);
        assert!(json["timestamp"].is_string());
        assert_eq!(json["table_name"], "Immersive Roulette");
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = outcome(29).to_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: OutcomeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
