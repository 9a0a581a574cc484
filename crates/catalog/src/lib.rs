//! Closed vocabularies shared by every marketplace crate: the tradable
//! products, planting seasons, demand periods and user roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Estimated units of supply contributed by one planting record.
pub const UNITS_PER_FARM: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseCatalogError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, all = $all:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const $all: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseCatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(ParseCatalogError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

catalog_enum! {
    /// A tradable product. Declaration order is the catalog order used by
    /// every per-product report.
    Product, "product", all = ALL {
        Wheat => "Wheat",
        Barley => "Barley",
        Dates => "Dates",
        Tomatoes => "Tomatoes",
        Cucumber => "Cucumber",
        Carrot => "Carrot",
        Onion => "Onion",
        Potato => "Potato",
    }
}

catalog_enum! {
    /// Planting season of a farm record.
    Season, "season", all = ALL {
        Spring => "Spring",
        Summer => "Summer",
        Fall => "Fall",
        Winter => "Winter",
    }
}

catalog_enum! {
    /// Delivery period of a trader's demand.
    Period, "period", all = ALL {
        Daily => "Daily",
        Weekly => "Weekly",
        Monthly => "Monthly",
        Seasonal => "Seasonal",
    }
}

catalog_enum! {
    Role, "role", all = ALL {
        Farmer => "farmer",
        Trader => "trader",
        Admin => "admin",
    }
}

impl Season {
    /// Market outlook shown next to the seasonal summary.
    pub fn outlook(self) -> &'static str {
        match self {
            Season::Spring => "Peak planting season - high demand",
            Season::Summer => "Harvesting season - supply increases",
            Season::Fall => "Transition period - moderate activity",
            Season::Winter => "Low season - reduced activity",
        }
    }
}
