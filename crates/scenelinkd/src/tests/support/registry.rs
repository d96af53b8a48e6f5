//! Small operation table used across the dispatch and server tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::registry::{FnOperation, InputSchema, OperationError, OperationRegistry};

/// Registers `echo`, `fail`, and `boom`, in that order.
///
/// `echo` returns its `text` argument, `fail` always reports
/// `No world available`, and `boom` panics.
pub fn test_registry() -> OperationRegistry {
    OperationRegistry::builder()
        .register(FnOperation::new(
            "echo",
            "Returns its text argument",
            InputSchema::object().required("text", "string", "Text to echo"),
            |arguments| arguments.required_str("text").map(str::to_owned),
        ))
        .and_then(|builder| {
            builder.register(FnOperation::new(
                "fail",
                "Always fails",
                InputSchema::object(),
                |_| Err(OperationError::failed("No world available")),
            ))
        })
        .and_then(|builder| {
            builder.register(FnOperation::new(
                "boom",
                "Always panics",
                InputSchema::object(),
                |_| panic!("kaboom"),
            ))
        })
        .expect("test operations have unique names")
        .build()
}

/// How long the `pause` operation in [`paced_registry`] holds the host.
pub const PAUSE: Duration = Duration::from_millis(300);

/// Registers `pause`, which blocks the host for [`PAUSE`], and `tally`,
/// which bumps `tally` and returns the new count.
pub fn paced_registry(tally: Arc<AtomicUsize>) -> OperationRegistry {
    OperationRegistry::builder()
        .register(FnOperation::new(
            "pause",
            "Blocks the host briefly",
            InputSchema::object(),
            |_| {
                thread::sleep(PAUSE);
                Ok(String::from("paused"))
            },
        ))
        .and_then(|builder| {
            builder.register(FnOperation::new(
                "tally",
                "Counts its invocations",
                InputSchema::object(),
                move |_| Ok((tally.fetch_add(1, Ordering::SeqCst) + 1).to_string()),
            ))
        })
        .expect("paced operations have unique names")
        .build()
}
