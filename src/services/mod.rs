/// OpenAPI documentation generation.
pub mod documentation;
/// Persistence gateway keyed by external video id.
pub mod gateway;
/// Health check service.
pub mod health_service;
/// Debounced persistence jobs.
pub mod save_scheduler;
/// Setup draft operations and the tracking gate.
pub mod setup_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Match store connection supervision.
pub mod storage_supervisor;
/// Tracking session operations and synchronisation.
pub mod tracking_service;
