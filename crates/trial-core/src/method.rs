use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TrialError};

/// Ordering used to traverse the conditions of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Method {
    /// Conditions in list order, every repetition alike.
    Sequential,
    /// Independent shuffle of the condition list for each repetition.
    #[default]
    Random,
    /// One shuffle over all repetitions, sliced back into repetitions.
    FullRandom,
}

impl Method {
    /// All supported methods, in declaration order.
    pub const ALL: [Method; 3] = [Method::Sequential, Method::Random, Method::FullRandom];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Sequential => "sequential",
            Method::Random => "random",
            Method::FullRandom => "full_random",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Method {
    type Error = TrialError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl FromStr for Method {
    type Err = TrialError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "sequential" => Ok(Method::Sequential),
            "random" => Ok(Method::Random),
            "fullrandom" => Ok(Method::FullRandom),
            _ => Err(TrialError::Configuration(
                ErrorInfo::new("unknown-method", "unknown trial ordering method")
                    .with_context("method", raw)
                    .with_hint("expected one of: sequential, random, full_random"),
            )),
        }
    }
}
