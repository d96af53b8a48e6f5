//! Test suites for the scenelink server.

mod server_behaviour;
pub(crate) mod support;
