use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Reasons an index-range string fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericRangeError {
    #[error("index range is empty")]
    Empty,
    #[error("index range dimension '{0}' is not a number")]
    NotANumber(String),
    #[error("index range lower bound {lo} exceeds upper bound {hi}")]
    Inverted { lo: u32, hi: u32 },
}

/// One dimension of a numeric range: a single index or an inclusive span.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeDimension {
    Index(u32),
    Span { lo: u32, hi: u32 },
}

/// A parsed OPC UA index range ("3", "1:4", "0:2,1:3").
///
/// Only validity matters to the subscription engine; the range is applied
/// to values by the sampler, which is outside this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    pub dimensions: Vec<RangeDimension>,
}

impl NumericRange {
    pub fn parse(input: &str) -> Result<Self, NumericRangeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(NumericRangeError::Empty);
        }

        let mut dimensions = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            match part.split_once(':') {
                None => {
                    let idx = parse_bound(part)?;
                    dimensions.push(RangeDimension::Index(idx));
                }
                Some((lo, hi)) => {
                    let lo = parse_bound(lo)?;
                    let hi = parse_bound(hi)?;
                    // Part 4: a span must name at least two elements.
                    if lo >= hi {
                        return Err(NumericRangeError::Inverted { lo, hi });
                    }
                    dimensions.push(RangeDimension::Span { lo, hi });
                }
            }
        }
        Ok(Self { dimensions })
    }
}

fn parse_bound(s: &str) -> Result<u32, NumericRangeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NumericRangeError::Empty);
    }
    s.parse::<u32>()
        .map_err(|_| NumericRangeError::NotANumber(s.to_string()))
}

impl FromStr for NumericRange {
    type Err = NumericRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for NumericRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, dim) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match dim {
                RangeDimension::Index(v) => write!(f, "{v}")?,
                RangeDimension::Span { lo, hi } => write!(f, "{lo}:{hi}")?,
            }
        }
        Ok(())
    }
}
