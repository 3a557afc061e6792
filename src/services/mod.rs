/// Operator console: grid selection, question presentation and judge challenges.
pub mod console_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Judge panel management.
pub mod judge_service;
/// Question bank management, grids and resets.
pub mod question_service;
/// Operator login, full resets and export.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Team registry and random team pick.
pub mod team_service;
