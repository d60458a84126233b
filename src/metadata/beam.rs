use serde::{Deserialize, Serialize};

/// Photon energy times wavelength, in keV·Å
const HC_KEV_ANGSTROM: f64 = 12.398_419_843_320_026;

/// Incident beam facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamMetadata {
    /// Incident wavelength in Ångström
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wavelength: Option<f64>,
}

impl BeamMetadata {
    /// Create an empty beam description
    pub fn new() -> Self {
        Self::default()
    }

    /// Photon energy in keV, derived from the wavelength
    pub fn energy_kev(&self) -> Option<f64> {
        self.wavelength
            .filter(|w| *w > 0.0)
            .map(|w| HC_KEV_ANGSTROM / w)
    }
}
