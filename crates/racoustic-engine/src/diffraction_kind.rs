//! The `update_diffraction_model` ABI call takes an enum, not a concrete
//! filter type; this maps each enumerated kind onto a freshly constructed
//! [`DiffractionModel`](racoustic_diffraction::DiffractionModel).

use racoustic_diffraction::{Attenuate, Btm, DiffractionModel, Lpf, Udfa, Utd};

/// Every diffraction filter variant the engine can switch a slot to at
/// runtime. `Udfa` is the two-term Pierce approximation, `Udfai` the
/// single-term variant, matching the reference engine's `UDFA`/`UDFAI`
/// split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffractionModelKind {
    /// Binary shadow-gated gain.
    Attenuate,
    /// 1-pole lowpass gated on shadow validity.
    Lpf,
    /// Kirsch-Ewert universal filter approximation, two terms.
    Udfa,
    /// Kirsch-Ewert universal filter approximation, one term.
    Udfai,
    /// Kouyoumjian-Pathak filter as a 4-band gain bank.
    Utd,
    /// Svensson boundary time-domain convolution model.
    Btm,
}

impl DiffractionModelKind {
    /// Build a fresh filter instance of this kind.
    pub fn build(self, sample_rate: f32) -> Box<dyn DiffractionModel> {
        match self {
            DiffractionModelKind::Attenuate => Box::<Attenuate>::default(),
            DiffractionModelKind::Lpf => Box::new(Lpf::new(sample_rate)),
            DiffractionModelKind::Udfa => Box::new(Udfa::new(sample_rate, 2)),
            DiffractionModelKind::Udfai => Box::new(Udfa::new(sample_rate, 1)),
            DiffractionModelKind::Utd => Box::new(Utd::new(sample_rate)),
            DiffractionModelKind::Btm => Box::new(Btm::new(sample_rate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_builds_without_panicking() {
        for kind in [
            DiffractionModelKind::Attenuate,
            DiffractionModelKind::Lpf,
            DiffractionModelKind::Udfa,
            DiffractionModelKind::Udfai,
            DiffractionModelKind::Utd,
            DiffractionModelKind::Btm,
        ] {
            let _ = kind.build(48000.0);
        }
    }
}
