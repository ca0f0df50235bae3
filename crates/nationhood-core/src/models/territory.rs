//! Territories: the fifty U.S. states a nation can claim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NationError;

macro_rules! territories {
    ($($variant:ident => $name:literal,)+) => {
        /// A claimable territory.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Territory {
            $($variant,)+
        }

        impl Territory {
            /// Every territory, in alphabetical order.
            pub const ALL: &'static [Territory] = &[$(Territory::$variant,)+];

            /// Canonical display name (e.g. `"New York"`).
            pub fn name(&self) -> &'static str {
                match self {
                    $(Territory::$variant => $name,)+
                }
            }
        }
    };
}

territories! {
    Alabama => "Alabama",
    Alaska => "Alaska",
    Arizona => "Arizona",
    Arkansas => "Arkansas",
    California => "California",
    Colorado => "Colorado",
    Connecticut => "Connecticut",
    Delaware => "Delaware",
    Florida => "Florida",
    Georgia => "Georgia",
    Hawaii => "Hawaii",
    Idaho => "Idaho",
    Illinois => "Illinois",
    Indiana => "Indiana",
    Iowa => "Iowa",
    Kansas => "Kansas",
    Kentucky => "Kentucky",
    Louisiana => "Louisiana",
    Maine => "Maine",
    Maryland => "Maryland",
    Massachusetts => "Massachusetts",
    Michigan => "Michigan",
    Minnesota => "Minnesota",
    Mississippi => "Mississippi",
    Missouri => "Missouri",
    Montana => "Montana",
    Nebraska => "Nebraska",
    Nevada => "Nevada",
    NewHampshire => "New Hampshire",
    NewJersey => "New Jersey",
    NewMexico => "New Mexico",
    NewYork => "New York",
    NorthCarolina => "North Carolina",
    NorthDakota => "North Dakota",
    Ohio => "Ohio",
    Oklahoma => "Oklahoma",
    Oregon => "Oregon",
    Pennsylvania => "Pennsylvania",
    RhodeIsland => "Rhode Island",
    SouthCarolina => "South Carolina",
    SouthDakota => "South Dakota",
    Tennessee => "Tennessee",
    Texas => "Texas",
    Utah => "Utah",
    Vermont => "Vermont",
    Virginia => "Virginia",
    Washington => "Washington",
    WestVirginia => "West Virginia",
    Wisconsin => "Wisconsin",
    Wyoming => "Wyoming",
}

impl Territory {
    /// Resolve a state name case-insensitively, ignoring surrounding
    /// whitespace.
    pub fn from_name(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Territory::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Territory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Territory {
    type Err = NationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Territory::from_name(s)
            .ok_or_else(|| NationError::validation(format!("Unknown territory: {}", s.trim())))
    }
}

impl TryFrom<String> for Territory {
    type Error = NationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Territory> for String {
    fn from(value: Territory) -> Self {
        value.name().to_string()
    }
}
