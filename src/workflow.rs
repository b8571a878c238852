//! Institutional derivation routes ("Rutas de derivación condicional").
//!
//! Routing is a one-time triage decision taken when a case is opened; edits
//! to the case afterwards never re-run it.

use serde::{Deserialize, Serialize};

use crate::classify::Typology;
use crate::model::{ProtocolTrack, RiskLevel};

/// Protocol assignment produced for a freshly opened case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteAssignment {
    pub protocol: ProtocolTrack,
    pub assigned_to: String,
    pub route_description: String,
}

/// Maps a risk level (and the self-harm flag of the typology) to the
/// responsible protocol track. Total over both enums; there is no error path.
pub fn route(risk: RiskLevel, typology: Typology) -> RouteAssignment {
    match risk {
        RiskLevel::Low => RouteAssignment {
            protocol: ProtocolTrack::Tutoring,
            assigned_to: "DECE (Psicólogo Educativo)".into(),
            route_description: "Ruta: DECE + Seguimiento interno".into(),
        },
        RiskLevel::Medium => RouteAssignment {
            protocol: ProtocolTrack::Direction,
            assigned_to: "DECE y Dirección Académica".into(),
            route_description: "Ruta: DECE + Dirección Institucional".into(),
        },
        RiskLevel::High => RouteAssignment {
            protocol: ProtocolTrack::ExternalAuthorities,
            assigned_to: "DECE y Fiscalía".into(),
            route_description: "Ruta: DECE + Denuncia en Fiscalía".into(),
        },
        RiskLevel::Critical => {
            let additional = if typology.involves_self_harm() {
                " + Salud Pública"
            } else {
                ""
            };
            RouteAssignment {
                protocol: ProtocolTrack::ExternalAuthorities,
                assigned_to: "Equipo Integral de Crisis".into(),
                route_description: format!("Ruta: DECE + Fiscalía + UDAI{additional}"),
            }
        }
    }
}
