//! The planetary body an instrument observes: a sphere of fixed radius.
//!
//! PDSC does not support dynamic body shapes (spec §1 Non-goals) — each
//! instrument pins exactly one body and one radius for its lifetime.

use serde::{Deserialize, Deserializer, Serialize};

/// A spherical approximation of a planetary body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Body {
    pub name: &'static str,
    pub radius_m: f64,
}

// `name` is `&'static str`, which the derived `Deserialize` cannot express
// (it would require `'de: 'static`). Deserialize into an owned copy and leak
// it, preserving the field's type and the struct's round-trip behavior.
impl<'de> Deserialize<'de> for Body {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BodyOwned {
            name: String,
            radius_m: f64,
        }
        let BodyOwned { name, radius_m } = BodyOwned::deserialize(deserializer)?;
        Ok(Body {
            name: Box::leak(name.into_boxed_str()),
            radius_m,
        })
    }
}

impl Body {
    /// Mean radius of Mars, used by HiRISE, CTX, MOC, and THEMIS.
    pub const MARS: Body = Body {
        name: "Mars",
        radius_m: 3_389_500.0,
    };

    /// Mean radius of the Moon.
    pub const MOON: Body = Body {
        name: "Moon",
        radius_m: 1_737_400.0,
    };
}
