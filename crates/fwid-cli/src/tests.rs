//! Unit tests for the CLI runtime.

use std::thread::{self, JoinHandle};

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use fwid_api::{INVALID_MESSAGE, Message, MessageType, Server};

use super::*;

struct FakeAgent {
    _dir: TempDir,
    socket: Utf8PathBuf,
    server: Server,
    consumer: Option<JoinHandle<()>>,
}

impl FakeAgent {
    fn stop(&mut self) {
        self.server.stop().expect("stop server");
        if let Some(consumer) = self.consumer.take() {
            consumer.join().expect("consumer thread");
        }
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.stop();
    }
}

#[fixture]
fn agent() -> FakeAgent {
    let dir = tempfile::tempdir().expect("temp dir");
    let socket = Utf8PathBuf::from_path_buf(dir.path().join("agent.sock")).expect("utf8 path");
    let mut server = Server::new(socket.clone());
    server.start().expect("start server");
    let requests = server.requests();
    let consumer = thread::spawn(move || {
        for request in requests.iter() {
            let (message, mut connection) = request.into_parts();
            let reply = match message.kind() {
                MessageType::QUERY => Message::query_result(r#"{"relogin_requests":0}"#),
                MessageType::RELOGIN => Message::ok(),
                _ => Message::error(INVALID_MESSAGE),
            };
            connection.reply(&reply).expect("reply");
        }
    });
    FakeAgent {
        _dir: dir,
        socket,
        server,
        consumer: Some(consumer),
    }
}

fn invoke(args: &[&str]) -> (ExitCode, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let args = std::iter::once("fwid")
        .chain(args.iter().copied())
        .map(OsString::from);
    let code = run(args, &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf8 stdout"),
        String::from_utf8(stderr).expect("utf8 stderr"),
    )
}

#[rstest]
fn status_prints_document(agent: FakeAgent) {
    let (code, stdout, stderr) = invoke(&["--socket", agent.socket.as_str(), "status"]);

    assert_eq!(code, ExitCode::SUCCESS, "stderr: {stderr}");
    assert_eq!(stdout, "{\"relogin_requests\":0}\n");
}

#[rstest]
fn relogin_prints_confirmation(agent: FakeAgent) {
    let (code, stdout, _) = invoke(&["--socket", agent.socket.as_str(), "relogin"]);

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(stdout, format!("{RELOGIN_REQUESTED}\n"));
}

#[rstest]
fn stopped_agent_is_reported(mut agent: FakeAgent) {
    agent.stop();

    let (code, stdout, stderr) = invoke(&["--socket", agent.socket.as_str(), "status"]);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("agent is not running"), "stderr: {stderr}");
}

#[rstest]
#[case(&[])]
#[case(&["unknown"])]
#[case(&["--timeout", "soon", "status"])]
fn usage_errors_fail(#[case] args: &[&str]) {
    let (code, stdout, stderr) = invoke(args);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}

#[rstest]
fn help_goes_to_stdout() {
    let (code, stdout, _) = invoke(&["--help"]);

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("relogin"));
}
