pub mod dissolution_service;
pub mod inactivity_sweep_service;
pub mod match_creation_service;
pub mod resurfacing_service;
pub mod reveal_query_service;

pub use dissolution_service::DissolutionService;
pub use inactivity_sweep_service::{InactivitySweepService, SweepReport};
pub use match_creation_service::{MatchCreation, MatchCreationService, MatchWithReveals};
pub use resurfacing_service::ResurfacingService;
pub use reveal_query_service::RevealQueryService;
