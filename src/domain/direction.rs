use serde::{Serialize, Serializer};

/// Trend direction reported by the Share service alongside every glucose value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    NoDirection,
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    NotComputable,
    RateOutOfRange,
}

const DIRECTIONS: [(Direction, u8, &str); 10] = [
    (Direction::NoDirection, 0, "nodir"),
    (Direction::DoubleUp, 1, "DoubleUp"),
    (Direction::SingleUp, 2, "SingleUp"),
    (Direction::FortyFiveUp, 3, "FortyFiveUp"),
    (Direction::Flat, 4, "Flat"),
    (Direction::FortyFiveDown, 5, "FortyFiveDown"),
    (Direction::SingleDown, 6, "SingleDown"),
    (Direction::DoubleDown, 7, "DoubleDown"),
    (Direction::NotComputable, 8, "NOT COMPUTABLE"),
    (Direction::RateOutOfRange, 9, "RATE OUT OF RANGE"),
];

impl Direction {
    pub fn from_code(code: i64) -> Option<Self> {
        let index = usize::try_from(code).ok()?;
        DIRECTIONS.get(index).map(|(direction, _, _)| *direction)
    }

    /// Accepts the table labels and the camel-case spellings newer service
    /// versions send in place of numeric codes.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "nodir" | "None" => Some(Self::NoDirection),
            "DoubleUp" => Some(Self::DoubleUp),
            "SingleUp" => Some(Self::SingleUp),
            "FortyFiveUp" => Some(Self::FortyFiveUp),
            "Flat" => Some(Self::Flat),
            "FortyFiveDown" => Some(Self::FortyFiveDown),
            "SingleDown" => Some(Self::SingleDown),
            "DoubleDown" => Some(Self::DoubleDown),
            "NOT COMPUTABLE" | "NotComputable" => Some(Self::NotComputable),
            "RATE OUT OF RANGE" | "RateOutOfRange" => Some(Self::RateOutOfRange),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        DIRECTIONS[self as usize].1
    }

    pub fn label(self) -> &'static str {
        DIRECTIONS[self as usize].2
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
