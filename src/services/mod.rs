/// OpenAPI documentation generation.
pub mod documentation;
/// Guess submission and lookup.
pub mod guess_service;
/// Health check service.
pub mod health_service;
/// Party lifecycle: creation, joining, starting and stepping through rounds.
pub mod party_service;
/// Leaderboards and owner reveals.
pub mod results_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
