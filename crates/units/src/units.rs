//! Length presentation for measurement cells.
//!
//! Turns a canonical millimeter value into the text shown in the host's
//! measurement panel: fixed three-decimal millimeters, or a reduced
//! imperial fraction with optional feet. Everything here is pure so the
//! cell synchronizer and the yank commands can share one formatter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// Millimeters per inch (exact by definition).
pub const MM_PER_INCH: f64 = 25.4;

/// Inches per foot.
pub const INCHES_PER_FOOT: u64 = 12;

/// Display unit for length cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "inch", alias = "in")]
    Inch,
}

impl Unit {
    /// The other unit.
    pub fn toggled(self) -> Self {
        match self {
            Self::Millimeter => Self::Inch,
            Self::Inch => Self::Millimeter,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millimeter => write!(f, "mm"),
            Self::Inch => write!(f, "inch"),
        }
    }
}

/// Smallest fraction of an inch that inch values are rounded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum Precision {
    Eighth,
    #[default]
    Sixteenth,
    ThirtySecond,
}

impl Precision {
    pub const ALL: [Precision; 3] = [Self::Eighth, Self::Sixteenth, Self::ThirtySecond];

    pub fn denominator(self) -> u64 {
        match self {
            Self::Eighth => 8,
            Self::Sixteenth => 16,
            Self::ThirtySecond => 32,
        }
    }

    /// Next precision in the 1/8 → 1/16 → 1/32 → 1/8 cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Eighth => Self::Sixteenth,
            Self::Sixteenth => Self::ThirtySecond,
            Self::ThirtySecond => Self::Eighth,
        }
    }
}

impl TryFrom<u32> for Precision {
    type Error = String;

    fn try_from(denominator: u32) -> Result<Self, Self::Error> {
        match denominator {
            8 => Ok(Self::Eighth),
            16 => Ok(Self::Sixteenth),
            32 => Ok(Self::ThirtySecond),
            other => Err(format!("precision must be 8, 16 or 32, got {other}")),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}\"", self.denominator())
    }
}

/// Session-wide presentation policy for length cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitPolicy {
    pub unit: Unit,
    pub precision: Precision,
    pub feet_enabled: bool,
}

impl UnitPolicy {
    pub const fn millimeters() -> Self {
        Self {
            unit: Unit::Millimeter,
            precision: Precision::Sixteenth,
            feet_enabled: false,
        }
    }

    pub const fn inches(precision: Precision) -> Self {
        Self {
            unit: Unit::Inch,
            precision,
            feet_enabled: false,
        }
    }

    pub fn with_feet(mut self, feet_enabled: bool) -> Self {
        self.feet_enabled = feet_enabled;
        self
    }

    pub fn is_inch(&self) -> bool {
        self.unit == Unit::Inch
    }

    /// Flip between millimeters and inches, returning the new unit.
    pub fn toggle_unit(&mut self) -> Unit {
        self.unit = self.unit.toggled();
        self.unit
    }

    /// Advance the fraction precision, returning the new precision.
    pub fn cycle_precision(&mut self) -> Precision {
        self.precision = self.precision.next();
        self.precision
    }

    /// Flip feet decomposition, returning whether it is now enabled.
    pub fn toggle_feet(&mut self) -> bool {
        self.feet_enabled = !self.feet_enabled;
        self.feet_enabled
    }
}

impl fmt::Display for UnitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Millimeter => write!(f, "mm"),
            Unit::Inch if self.feet_enabled => write!(f, "inch ({}, feet)", self.precision),
            Unit::Inch => write!(f, "inch ({})", self.precision),
        }
    }
}

/// Render `mm` under `policy`.
pub fn format(mm: f64, policy: &UnitPolicy) -> String {
    match policy.unit {
        Unit::Millimeter => format_millimeters(mm),
        Unit::Inch => InchParts::from_millimeters(mm, policy.precision, policy.feet_enabled)
            .to_string(),
    }
}

/// Plain decimal millimeters with three places, the host's native form.
pub fn format_millimeters(mm: f64) -> String {
    // Adding +0.0 folds -0.0 into 0.0 so zero never renders as "-0.000".
    format!("{:.3}", mm + 0.0)
}

/// A length decomposed into feet, whole inches and a reduced fraction.
///
/// All magnitudes come from the absolute value; the sign is carried
/// separately and rendered once in front of everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InchParts {
    pub negative: bool,
    pub feet: u64,
    pub inches: u64,
    pub numerator: u64,
    pub denominator: u64,
}

impl InchParts {
    pub fn from_millimeters(mm: f64, precision: Precision, feet_enabled: bool) -> Self {
        let step = precision.denominator();
        // Nearest multiple of 1/step inch; `as` saturates for absurd inputs.
        let steps = (mm.abs() / MM_PER_INCH * step as f64).round() as u64;
        let whole = steps / step;
        let (numerator, denominator) = reduce(steps % step, step);
        let (feet, inches) = if feet_enabled {
            (whole / INCHES_PER_FOOT, whole % INCHES_PER_FOOT)
        } else {
            (0, whole)
        };

        Self {
            negative: mm < 0.0,
            feet,
            inches,
            numerator,
            denominator,
        }
    }
}

impl fmt::Display for InchParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.feet > 0 {
            write!(f, "{}' ", self.feet)?;
        }
        match (self.inches, self.numerator) {
            (0, 0) => f.write_str("0\""),
            (whole, 0) => write!(f, "{whole}\""),
            (0, numerator) => write!(f, "{numerator}/{}\"", self.denominator),
            (whole, numerator) => write!(f, "{whole} {numerator}/{}\"", self.denominator),
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduce `numerator/denominator`; a zero numerator reduces to `0/1`.
fn reduce(numerator: u64, denominator: u64) -> (u64, u64) {
    let divisor = gcd(numerator, denominator).max(1);
    (numerator / divisor, denominator / divisor)
}

/// A plain decimal, optionally followed by "mm". Inch text, angles
/// ("45°") and labels deliberately do not match.
static DISPLAY_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*(?:mm)?\s*$")
        .expect("display number pattern is valid")
});

/// Parse a host-rendered millimeter value such as `"12.7"`, `"-3.000 mm"`
/// or `"−4.5"` (unicode minus). Returns `None` for anything else.
pub fn parse_millimeters(text: &str) -> Option<f64> {
    let normalized = text.replace('\u{2212}', "-");
    let captures = DISPLAY_NUMBER.captures(&normalized)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}
