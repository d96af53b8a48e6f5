//! Behavioural tests driving the automation server over real sockets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use crate::bridge::{ExecutionBridge, TaskPump, WorkerContext, task_queue};
use crate::server::{BridgeServer, ServerHandle};
use crate::tests::support::{
    HealthEvent, PAUSE, RecordingHealthReporter, TestClient, loopback_config, paced_registry,
    test_registry,
};

type StepResult = Result<(), String>;

const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#;
const LIST: &str = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;
const UNKNOWN: &str =
    r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"does_not_exist"}}"#;
const PANIC: &str = r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"boom"}}"#;
const ECHO: &str = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"echo","arguments":{"text":"split"}}}"#;
const ECHO_FIRST: &str = r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"echo","arguments":{"text":"first"}}}"#;
const ECHO_SECOND: &str = r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"echo","arguments":{"text":"second"}}}"#;
const PAUSE_CALL: &str = r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"pause"}}"#;
const TALLY: &str = r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"tally"}}"#;
const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

/// How the host side of a scenario server behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Host {
    /// A worker thread running the standard test operations.
    Worker,
    /// A queue nobody drains until the scenario resumes it.
    Stalled,
    /// A worker thread running `pause` and `tally`.
    Paced,
}

/// Scenario state: one server plus any number of named clients.
pub struct ServerWorld {
    reporter: Arc<RecordingHealthReporter>,
    server: Option<ServerHandle>,
    worker: Option<WorkerContext>,
    stalled_pump: Option<TaskPump>,
    resumed_pump: Option<thread::JoinHandle<()>>,
    tally: Arc<AtomicUsize>,
    clients: HashMap<String, TestClient>,
    replies: HashMap<String, Value>,
    pipelined: HashMap<String, (Value, Value)>,
}

impl ServerWorld {
    fn new() -> Self {
        Self {
            reporter: Arc::new(RecordingHealthReporter::default()),
            server: None,
            worker: None,
            stalled_pump: None,
            resumed_pump: None,
            tally: Arc::new(AtomicUsize::new(0)),
            clients: HashMap::new(),
            replies: HashMap::new(),
            pipelined: HashMap::new(),
        }
    }

    fn start(&mut self, host: Host) -> StepResult {
        let mut config = loopback_config();
        let bridge = if host == Host::Stalled {
            config.invocation_timeout_ms = 50;
            let (queue, pump) = task_queue();
            self.stalled_pump = Some(pump);
            ExecutionBridge::new(
                Arc::new(test_registry()),
                Arc::new(queue),
                config.invocation_timeout(),
            )
        } else {
            let registry = if host == Host::Paced {
                config.invocation_timeout_ms = 5_000;
                paced_registry(Arc::clone(&self.tally))
            } else {
                test_registry()
            };
            let worker = WorkerContext::spawn("scenelink-test-host")
                .map_err(|error| format!("worker failed to start: {error}"))?;
            let bridge = ExecutionBridge::new(
                Arc::new(registry),
                Arc::new(worker.queue()),
                config.invocation_timeout(),
            );
            self.worker = Some(worker);
            bridge
        };
        let handle = BridgeServer::new(&config, bridge, self.reporter.clone())
            .start()
            .map_err(|error| format!("server failed to start: {error}"))?;
        self.server = Some(handle);
        Ok(())
    }

    fn resume_host(&mut self) -> StepResult {
        let pump = self
            .stalled_pump
            .take()
            .ok_or("the host is not stalled")?;
        self.resumed_pump = Some(thread::spawn(move || pump.run_until_closed()));
        Ok(())
    }

    fn client(&mut self, name: &str) -> Result<&mut TestClient, String> {
        self.clients
            .get_mut(name)
            .ok_or_else(|| format!("client {name} has not connected"))
    }

    fn call(&mut self, name: &str, line: &str) -> StepResult {
        let reply = self.client(name)?.call(line);
        self.replies.insert(name.to_owned(), reply);
        Ok(())
    }

    fn reply(&self, name: &str) -> Result<&Value, String> {
        self.replies
            .get(name)
            .ok_or_else(|| format!("client {name} has no reply"))
    }

    fn call_text(&self, name: &str) -> Result<&str, String> {
        self.reply(name)?["result"]["content"][0]["text"]
            .as_str()
            .ok_or_else(|| format!("reply is not a text result: {:?}", self.reply(name)))
    }
}

impl Drop for ServerWorld {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.shutdown();
            server.join().expect("server thread exits cleanly");
        }
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
        // The server held the last queue handle, so the pump has returned.
        if let Some(pump) = self.resumed_pump.take() {
            pump.join().expect("resumed pump exits cleanly");
        }
    }
}

#[fixture]
fn world() -> RefCell<ServerWorld> {
    RefCell::new(ServerWorld::new())
}

#[given("a running automation server")]
fn given_running_server(world: &RefCell<ServerWorld>) -> StepResult {
    world.borrow_mut().start(Host::Worker)
}

#[given("a running automation server with a stalled host")]
fn given_stalled_server(world: &RefCell<ServerWorld>) -> StepResult {
    world.borrow_mut().start(Host::Stalled)
}

#[given("a running automation server with a paced host")]
fn given_paced_server(world: &RefCell<ServerWorld>) -> StepResult {
    world.borrow_mut().start(Host::Paced)
}

#[when("the stalled host resumes")]
fn when_host_resumes(world: &RefCell<ServerWorld>) -> StepResult {
    world.borrow_mut().resume_host()
}

#[when("client {name} connects")]
fn when_client_connects(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    let addr = world
        .server
        .as_ref()
        .map(ServerHandle::local_addr)
        .ok_or("server is not running")?;
    world.clients.insert(name, TestClient::connect(addr));
    Ok(())
}

#[when("client {name} sends the initialize request")]
fn when_initialize(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, INITIALIZE)
}

#[when("client {name} sends the list request")]
fn when_list(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, LIST)
}

#[when("client {name} sends the unknown operation request")]
fn when_unknown(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, UNKNOWN)
}

#[when("client {name} sends the panicking operation request")]
fn when_panicking(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, PANIC)
}

#[when("client {name} sends the echo request")]
fn when_echo(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, ECHO)
}

#[when("client {name} sends a malformed frame")]
fn when_malformed(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, r#"{"jsonrpc":"2.0","id":9,"method":"#)
}

#[when("client {name} sends the initialized notification")]
fn when_initialized(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().client(&name)?.send_line(INITIALIZED);
    Ok(())
}

#[when("client {name} sends an echo request in two pieces")]
fn when_split_echo(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    let (head, tail) = ECHO.split_at(ECHO.len() / 2);
    let client = world.client(&name)?;
    client.send_raw(head.as_bytes());
    thread::sleep(Duration::from_millis(20));
    client.send_line(tail);
    let reply = client.read_response();
    world.replies.insert(name, reply);
    Ok(())
}

#[when("client {name} sends two calls in one write")]
fn when_pipelined(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    let client = world.client(&name)?;
    client.send_raw(format!("{ECHO_FIRST}\n{ECHO_SECOND}\n").as_bytes());
    let first = client.read_response();
    let second = client.read_response();
    world.pipelined.insert(name, (first, second));
    Ok(())
}

#[when("client {name} queues a pause and a tally in one write")]
fn when_pause_then_tally(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    world
        .client(&name)?
        .send_raw(format!("{PAUSE_CALL}\n{TALLY}\n").as_bytes());
    // Let the server pick up both frames and start pausing.
    thread::sleep(PAUSE / 6);
    Ok(())
}

#[when("client {name} sends the list request and stops sending")]
fn when_list_then_half_close(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    let client = world.client(&name)?;
    client.send_line(LIST);
    client.finish_sending();
    let reply = client.read_response();
    world.replies.insert(name, reply);
    Ok(())
}

#[when("client {name} sends the tally request")]
fn when_tally(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().call(&name, TALLY)
}

#[then("client {name} receives the pause reply")]
fn then_pause_reply(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let mut world = world.borrow_mut();
    let reply = world.client(&name)?.read_response();
    assert_eq!(reply["id"], 8, "unexpected reply: {reply}");
    assert_eq!(reply["result"]["content"][0]["text"], "paused");
    Ok(())
}

#[then("client {name} receives tally {count}")]
fn then_tally(world: &RefCell<ServerWorld>, name: String, count: usize) -> StepResult {
    let world = world.borrow();
    assert_eq!(world.call_text(&name)?, count.to_string());
    assert_eq!(world.tally.load(Ordering::SeqCst), count);
    Ok(())
}

#[then("client {name} receives the server identity")]
fn then_server_identity(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let world = world.borrow();
    let reply = world.reply(&name)?;
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["serverInfo"]["name"], "scenelink");
    assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
    Ok(())
}

#[then("client {name} receives the registered operations")]
fn then_registered_operations(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let world = world.borrow();
    let reply = world.reply(&name)?;
    assert_eq!(reply["id"], 2, "unexpected reply: {reply}");
    let names: Vec<_> = reply["result"]["tools"]
        .as_array()
        .ok_or("tools is not an array")?
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert_eq!(names, ["echo", "fail", "boom"]);
    Ok(())
}

#[then("client {name} receives an unknown operation notice")]
fn then_unknown_notice(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    assert_eq!(
        world.borrow().call_text(&name)?,
        "Unknown tool: does_not_exist"
    );
    Ok(())
}

#[then("client {name} receives a panic notice")]
fn then_panic_notice(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    assert_eq!(
        world.borrow().call_text(&name)?,
        "Error: operation 'boom' panicked: kaboom"
    );
    Ok(())
}

#[then("client {name} receives the echoed text")]
fn then_echoed_text(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let world = world.borrow();
    assert_eq!(world.reply(&name)?["id"], 5);
    assert_eq!(world.call_text(&name)?, "split");
    Ok(())
}

#[then("client {name} receives error code {code}")]
fn then_error_code(world: &RefCell<ServerWorld>, name: String, code: i64) -> StepResult {
    let world = world.borrow();
    let reply = world.reply(&name)?;
    assert_eq!(reply["error"]["code"], code, "unexpected reply: {reply}");
    Ok(())
}

#[then("client {name} has been disconnected")]
fn then_disconnected(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    world.borrow_mut().client(&name)?.expect_closed();
    Ok(())
}

#[then("client {name} receives both replies in request order")]
fn then_pipelined_order(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let world = world.borrow();
    let (first, second) = world
        .pipelined
        .get(&name)
        .ok_or_else(|| format!("client {name} sent no pipelined requests"))?;
    assert_eq!(first["id"], 6);
    assert_eq!(first["result"]["content"][0]["text"], "first");
    assert_eq!(second["id"], 7);
    assert_eq!(second["result"]["content"][0]["text"], "second");
    Ok(())
}

#[then("the reporter recorded a displacement")]
fn then_displacement_recorded(world: &RefCell<ServerWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::ClientDisplaced(_))),
        "displacement event missing: {events:?}"
    );
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A client completes the handshake"
)]
fn handshake(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Operations are listed in registration order"
)]
fn listing(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Unknown operations are reported as text"
)]
fn unknown_operation(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Malformed frames leave the connection usable"
)]
fn malformed_frame(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A request split across writes is answered once"
)]
fn split_request(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Notifications are not answered"
)]
fn silent_notification(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A newer client displaces the current one"
)]
fn displacement(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Queued requests from a displaced client never run"
)]
fn displaced_requests_abandoned(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A client that stops sending still gets its last reply"
)]
fn half_closed_client(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A panicking operation does not take the host down"
)]
fn panicking_operation(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "A stalled host yields an internal error and then recovers"
)]
fn stalled_host(world: RefCell<ServerWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/automation_server.feature",
    name = "Pipelined requests are answered in order"
)]
fn pipelined_requests(world: RefCell<ServerWorld>) {
    drop(world);
}
