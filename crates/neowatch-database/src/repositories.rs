//! Entity-specific repository aliases.

use neowatch_entity::{Asteroid, CloseApproach, ThreatAssessment};

use crate::repository::Repository;

pub type AsteroidRepository<'t> = Repository<'t, Asteroid>;
pub type CloseApproachRepository<'t> = Repository<'t, CloseApproach>;
pub type ThreatAssessmentRepository<'t> = Repository<'t, ThreatAssessment>;
