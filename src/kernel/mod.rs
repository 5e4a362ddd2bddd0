pub mod action;
pub mod dispatcher;
pub mod engine;
pub mod event;
pub mod normalizer;
pub mod reactor;
pub mod router;
pub mod state;
pub mod telemetry;
pub mod time;
