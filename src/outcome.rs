//! Roulette round outcomes and derived betting attributes

use crate::error::{CollectorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pocket color on a European wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Black => "black",
            Color::Green => "green",
        }
    }

    /// Discord embed accent color for this pocket
    pub fn embed_color(&self) -> u32 {
        match self {
            Color::Red => 0xff0000,
            Color::Black => 0x000000,
            Color::Green => 0x00ff00,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Color::Red => "🔴",
            Color::Black => "⚫",
            Color::Green => "🟢",
        }
    }
}

/// High/low half of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighLow {
    Zero,
    Low,
    High,
}

/// Standard European wheel color assignment, indexed by pocket number.
/// Not a parity rule: 10/28 are black while 19 is red, etc.
const WHEEL_COLORS: [Color; 37] = {
    use Color::{Black as B, Green as G, Red as R};
    [
        G, // 0
        R, B, R, B, R, B, R, B, R, B, // 1-10
        B, R, B, R, B, R, B, R, R, B, // 11-20
        R, B, R, B, R, B, R, B, B, R, // 21-30
        B, R, B, R, B, R, // 31-36
    ]
};

/// Look up the color for a pocket number.
///
/// Total over 0..=36; anything else is `InvalidNumber`.
pub fn color_of(number: i64) -> Result<Color> {
    if (0..=36).contains(&number) {
        Ok(WHEEL_COLORS[number as usize])
    } else {
        Err(CollectorError::InvalidNumber(number))
    }
}

/// One confirmed roulette round result.
///
/// Immutable once constructed; betting attributes are computed on read.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub number: u8,
    pub color: Color,
    /// Capture instant (when we saw it, not table time)
    pub timestamp: DateTime<Utc>,
    pub table_name: String,
    pub session_id: String,
}

impl RoundOutcome {
    pub fn new(
        number: u8,
        timestamp: DateTime<Utc>,
        table_name: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self> {
        let color = color_of(number as i64)?;
        Ok(Self {
            number,
            color,
            timestamp,
            table_name: table_name.into(),
            session_id: session_id.into(),
        })
    }

    /// 0 counts as even
    pub fn is_even(&self) -> bool {
        self.number % 2 == 0
    }

    pub fn is_odd(&self) -> bool {
        self.number % 2 == 1
    }

    /// Dozen 1-3, or 0 for the zero pocket
    pub fn dozen(&self) -> u8 {
        if self.number == 0 {
            0
        } else {
            (self.number - 1) / 12 + 1
        }
    }

    /// Column 1-3, or 0 for the zero pocket
    pub fn column(&self) -> u8 {
        if self.number == 0 {
            0
        } else {
            (self.number - 1) % 3 + 1
        }
    }

    pub fn high_low(&self) -> HighLow {
        match self.number {
            0 => HighLow::Zero,
            1..=18 => HighLow::Low,
            _ => HighLow::High,
        }
    }

    /// Flatten to the wire/persistence representation.
    pub fn to_record(&self) -> OutcomeRecord {
        OutcomeRecord {
            number: self.number,
            color: self.color,
            timestamp: self.timestamp,
            table_name: self.table_name.clone(),
            session_id: self.session_id.clone(),
            is_even: self.is_even(),
            is_odd: self.is_odd(),
            dozen: self.dozen(),
            column: self.column(),
            high_low: self.high_low(),
        }
    }
}

/// Flattened outcome as sent to the local sink and written to day files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub number: u8,
    pub color: Color,
    pub timestamp: DateTime<Utc>,
    pub table_name: String,
    pub session_id: String,
    pub is_even: bool,
    pub is_odd: bool,
    pub dozen: u8,
    pub column: u8,
    pub high_low: HighLow,
}
