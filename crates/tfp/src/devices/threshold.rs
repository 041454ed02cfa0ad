/// Threshold mode of a value callback
///
/// `Off` fires on every period. The others only fire while the value is
/// outside, inside, below or above the configured min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOption {
    Off,
    Outside,
    Inside,
    Smaller,
    Greater,
}

impl ThresholdOption {
    pub(crate) fn as_char(self) -> u8 {
        match self {
            ThresholdOption::Off => b'x',
            ThresholdOption::Outside => b'o',
            ThresholdOption::Inside => b'i',
            ThresholdOption::Smaller => b'<',
            ThresholdOption::Greater => b'>',
        }
    }
}
