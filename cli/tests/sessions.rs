use clap::Parser;
use qmpctl::mock::{MockPeer, MockScript};
use qmpctl::{Endpoint, Error, ErrorKind};
use qmpctl_cli::{exec::{self, ExecCli}, query::{self, QueryCli}};

const CHARDEV_REPLY: &str = r#"{"return":[{"label":"serial0","filename":"pty:/dev/pts/4"},{"label":"serial1","filename":"/dev/ttyS1"}]}"#;

fn argv(endpoint: &Endpoint, rest: &[&str]) -> Vec<String> {
    let mut argv = vec!["prog".to_owned(), endpoint.host.clone(), endpoint.port.to_string()];
    argv.extend(rest.iter().map(|s| s.to_string()));
    argv
}

fn run_query(script: MockScript, rest: &[&str]) -> (qmpctl::Result<()>, String, MockPeer) {
    let peer = MockPeer::start(script).unwrap();
    let cli = QueryCli::try_parse_from(argv(&peer.endpoint(), rest)).unwrap();
    let mut out = Vec::new();
    let result = query::run(&cli, &mut out);
    (result, String::from_utf8(out).unwrap(), peer)
}

fn run_exec(script: MockScript, rest: &[&str]) -> (qmpctl::Result<()>, String, Vec<String>) {
    let peer = MockPeer::start(script).unwrap();
    let cli = ExecCli::try_parse_from(argv(&peer.endpoint(), rest)).unwrap();
    let mut out = Vec::new();
    let result = exec::run(&cli, &mut out);
    (result, String::from_utf8(out).unwrap(), peer.finish().unwrap())
}

fn cont_script() -> MockScript {
    MockScript::new()
        .greeting("QEMU 2.0 monitor")
        .reply(r#"{"return": {}}"#)
        .reply(r#"{"return": {}}"#)
}

#[test]
fn cont_prints_request_then_reply() {
    let (result, stdout, peer) = run_query(cont_script(), &["cont"]);
    result.unwrap();
    assert_eq!(stdout, "{\"execute\": \"cont\"}\n{\"return\": {}}\n");
    assert_eq!(peer.finish().unwrap(), [r#"{"execute": "qmp_capabilities"}"#, r#"{"execute": "cont"}"#]);
}

#[test]
fn cont_ignores_labels_and_quiet_prints_nothing() {
    let (result, stdout, peer) = run_query(cont_script(), &["cont", "serial0", "--quiet"]);
    result.unwrap();
    assert_eq!(stdout, "");
    peer.finish().unwrap();
}

#[test]
fn query_chardev_resolves_labels() {
    let script = MockScript::negotiated().reply(CHARDEV_REPLY);
    let (result, stdout, peer) = run_query(script, &["query-chardev", "serial0", "serial1"]);
    result.unwrap();
    assert_eq!(stdout, format!("{{\"execute\": \"query-chardev\"}}\n{}\n/dev/pts/4 /dev/ttyS1\n", CHARDEV_REPLY));
    peer.finish().unwrap();
}

#[test]
fn query_chardev_quiet_prints_only_paths() {
    let script = MockScript::negotiated().reply(CHARDEV_REPLY);
    let (result, stdout, peer) = run_query(script, &["-q", "query-chardev", "serial0"]);
    result.unwrap();
    assert_eq!(stdout, "/dev/pts/4\n");
    peer.finish().unwrap();
}

#[test]
fn query_chardev_missing_label() {
    let script = MockScript::negotiated().reply(CHARDEV_REPLY);
    let (result, stdout, peer) = run_query(script, &["query-chardev", "serial0", "serial9"]);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
    assert!(err.to_string().contains("serial9"));
    // The echo was already written; no partial path output follows it.
    assert!(stdout.ends_with(&format!("{}\n", CHARDEV_REPLY)), "{}", stdout);
    peer.finish().unwrap();
}

#[test]
fn query_chardev_malformed_reply() {
    let script = MockScript::negotiated().reply(r#"{"return": {}}"#);
    let (result, _, peer) = run_query(script, &["-q", "query-chardev", "serial0"]);
    assert!(matches!(result, Err(Error::Protocol { .. })));
    peer.finish().unwrap();
}

#[test]
fn unsupported_command_never_reaches_the_peer() {
    let (result, stdout, peer) = run_query(MockScript::negotiated(), &["migrate"]);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCommand);
    assert!(stdout.is_empty());
    assert_eq!(peer.connections(), 0);
}

#[test]
fn strict_rejection_never_reaches_the_peer() {
    let peer = MockPeer::start(MockScript::negotiated()).unwrap();
    let cli = ExecCli::try_parse_from(argv(&peer.endpoint(), &["--strict", "drive_del", "id=disk0"])).unwrap();
    let mut out = Vec::new();
    let err = exec::run(&cli, &mut out).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert!(out.is_empty());
    assert_eq!(peer.connections(), 0);
}

#[test]
fn same_invocation_is_reproducible() {
    let (first, first_out, _) = run_query(cont_script(), &["cont"]);
    let (second, second_out, _) = run_query(cont_script(), &["cont"]);
    first.unwrap();
    second.unwrap();
    assert_eq!(first_out, second_out);
}

#[test]
fn exec_sends_argument_form() {
    let script = MockScript::negotiated().reply(r#"{"return": {}}"#);
    let (result, stdout, received) = run_exec(script, &["device_del", "id=\"nic0\"", "addr=0x1F"]);
    result.unwrap();

    let request = concat!(
        "{\n",
        "  \"execute\": \"device_del\",\n",
        "  \"arguments\": {\n",
        "    \"id\": \"nic0\",\n",
        "    \"addr\": 31\n",
        "  }\n",
        "}",
    );
    assert_eq!(received.len(), 2);
    assert_eq!(received[1], request);
    assert_eq!(stdout, format!("{}\n{{\"return\": {{}}}}\n", request));

    let parsed: serde_json::Value = serde_json::from_str(&received[1]).unwrap();
    assert_eq!(parsed["arguments"]["addr"], 31);
}

#[test]
fn exec_without_arguments_uses_simple_form() {
    let script = MockScript::negotiated().reply(r#"{"return": {"status": "running"}}"#);
    let (result, stdout, received) = run_exec(script, &["query-status"]);
    result.unwrap();
    assert_eq!(received[1], r#"{"execute": "query-status"}"#);
    assert_eq!(stdout, "{\"execute\": \"query-status\"}\n{\"return\": {\"status\": \"running\"}}\n");
}

#[test]
fn exec_prints_error_replies_verbatim() {
    let script = MockScript::negotiated().reply_error("CommandNotFound", "The command migrate-nope has not been found");
    let (result, stdout, _) = run_exec(script, &["migrate-nope"]);
    result.unwrap();
    assert!(stdout.ends_with("{\"error\": {\"class\": \"CommandNotFound\", \"desc\": \"The command migrate-nope has not been found\"}}\n"), "{}", stdout);
}

#[test]
fn exec_quiet_prints_nothing() {
    let script = MockScript::negotiated().reply(r#"{"return": {}}"#);
    let (result, stdout, received) = run_exec(script, &["-q", "stop"]);
    result.unwrap();
    assert_eq!(stdout, "");
    assert_eq!(received.len(), 2);
}

#[test]
fn exec_passes_bad_literals_through() {
    let script = MockScript::negotiated().reply(r#"{"error": {"class": "GenericError", "desc": "JSON parse error"}}"#);
    let (result, _, received) = run_exec(script, &["-q", "drive_del", "id=disk0"]);
    result.unwrap();
    assert!(received[1].contains("\"id\": disk0"));
}

#[test]
fn timeout_on_silent_peer() {
    let script = MockScript::negotiated().silent();
    let (result, stdout, received) = run_exec(script, &["--timeout", "1", "cont"]);
    assert!(matches!(result, Err(Error::Timeout { .. })));
    assert_eq!(stdout, "{\"execute\": \"cont\"}\n");
    assert_eq!(received.len(), 2);
}

#[test]
fn peer_hangs_up_before_reply() {
    let script = MockScript::negotiated().hang_up();
    let (result, _, _) = run_exec(script, &["cont"]);
    assert!(matches!(result, Err(Error::Disconnected)));
}

#[test]
fn unreachable_endpoint() {
    let port = {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        listener.local_addr().unwrap().port()
    };
    let port = port.to_string();
    let cli = QueryCli::try_parse_from(["qmp-query", "127.0.0.1", port.as_str(), "cont"]).unwrap();
    let err = query::run(&cli, &mut Vec::<u8>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}
