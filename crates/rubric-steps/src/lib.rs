//! rubric-steps: catálogo de steps de calificación listos para registrar.
//!
//! Tres familias: `common` (steps neutrales), `gradescope` (metadata de la
//! plataforma, atraso, velocidad, reporte) y `assessment` (puntaje por
//! piezas ponderadas). `builtin_steps` devuelve el catálogo completo en el
//! orden de registro habitual.

pub mod assessment;
pub mod common;
pub mod exec;
pub mod gradescope;

use rubric_core::{StepAdapter, StepDefinition, StepRegistry};

/// Catálogo completo de steps incluidos.
pub fn builtin_steps() -> Vec<Box<dyn StepDefinition>> {
    vec![
        StepAdapter::boxed(gradescope::ReadSubMetadata),
        StepAdapter::boxed(gradescope::Lateness),
        StepAdapter::boxed(gradescope::LimitVelocity),
        StepAdapter::boxed(gradescope::Motd),
        StepAdapter::boxed(gradescope::WriteResults),
        StepAdapter::boxed(common::DisplayMessage),
        StepAdapter::boxed(common::RunCommand),
        StepAdapter::boxed(assessment::CheckFiles),
        StepAdapter::boxed(assessment::FinalScore),
    ]
}

/// Registry con el catálogo completo ya cargado.
pub fn builtin_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register(builtin_steps());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_lands_in_the_registry() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), builtin_steps().len());
        for name in [
            "gradescope.sub_info",
            "gradescope.lateness",
            "gradescope.limit_velocity",
            "gradescope.motd",
            "gradescope.results",
            "display_message",
            "common.run_command",
            "assessment.check_files",
            "assessment.final_score",
        ] {
            assert!(registry.lookup(name).is_ok(), "missing {name}");
        }
    }
}
