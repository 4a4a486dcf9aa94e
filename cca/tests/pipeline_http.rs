//! End-to-end pipeline tests over HTTP.
//!
//! A throw-away TCP server plays the Ollama `/api/generate` endpoint with
//! queued answers, so the real client, prompts, pipeline and filesystem
//! writes are exercised together.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use cca::agent::Agent;
use cca::core::scaffold::IGNORE_FILE;
use cca::core::types::RunResult;
use cca::infer::infer_with_service;
use cca::io::completion::{OllamaClient, Strategy};
use cca::io::workspace::{Repository, Workspace};
use serde_json::{Value, json};

/// Serves one queued answer per connection, recording each request body.
struct MockOllama {
    url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl MockOllama {
    fn start(replies: Vec<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let replies: Vec<String> = replies.into_iter().map(str::to_string).collect();
        let seen = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for reply in replies {
                let (mut stream, _) = listener.accept().expect("accept");
                let body = read_request_body(&mut stream);
                seen.lock()
                    .expect("lock")
                    .push(serde_json::from_str(&body).expect("request json"));
                let payload = json!({ "model": "mock", "response": reply, "done": true }).to_string();
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                )
                .expect("write response");
            }
        });
        Self {
            url,
            requests,
            handle,
        }
    }

    /// Wait for every queued answer to be served and return the requests.
    fn finish(self) -> Vec<Value> {
        self.handle.join().expect("server thread");
        let requests = self.requests.lock().expect("lock");
        requests.clone()
    }
}

fn read_request_body(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        match line.split_once(':') {
            Some((name, value)) if name.eq_ignore_ascii_case("content-length") => {
                content_length = value.trim().parse().expect("content length");
            }
            _ => {}
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("read body");
    String::from_utf8(body).expect("utf-8 body")
}

fn prompt_of(request: &Value) -> &str {
    request["prompt"].as_str().expect("prompt string")
}

#[test]
fn existing_module_is_rewritten_from_reviewed_code() {
    let server = MockOllama::start(vec![
        "1. add numbers\n2. print sum",
        "```python\nprint(1 + 1)\n```",
        "```python\nprint(1 + 2)\n```",
    ]);
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(temp.path());
    workspace.write("src/main.py", "print(0)\n").expect("seed");

    let client = OllamaClient::new("mock", &server.url, 0.2).expect("client");
    let agent = Agent::new(client, workspace);
    let result = agent.create_program("adder", "src/main.py").expect("run");

    assert_eq!(result, RunResult::success("Wrote module: src/main.py"));
    assert_eq!(
        agent.repo().read("src/main.py").expect("read"),
        "print(1 + 2)\n"
    );
    assert!(!temp.path().join(".gitignore").exists(), "no scaffold for existing module");

    let requests = server.finish();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request["model"], "mock");
        assert_eq!(request["stream"], false);
    }
    assert!(prompt_of(&requests[0]).contains("print(0)"));
    assert!(prompt_of(&requests[2]).contains("print(1 + 1)"));
}

#[test]
fn new_project_gets_scaffold_and_module_through_chain_strategy() {
    let server = MockOllama::start(vec![
        "streamlit>=1.30",
        "# Weather Dashboard\n\nShows the weather.",
        "1. layout\n2. fetch data",
        "import streamlit as st",
        "import streamlit as st\n\nst.title('Weather')\n",
    ]);
    let temp = tempfile::tempdir().expect("tempdir");
    let client = OllamaClient::new("mock", &server.url, 0.0).expect("client");
    let agent = Agent::new(Strategy::Chain.wrap(client), Workspace::new(temp.path()));

    let result = agent
        .create_program("streamlit weather dashboard", "src/app.py")
        .expect("run");
    assert!(result.ok, "{result}");

    let read = |rel: &str| std::fs::read_to_string(temp.path().join(rel)).expect("read file");
    assert_eq!(read("requirements.txt"), "streamlit>=1.30\n");
    assert!(read("README.md").starts_with("# Weather Dashboard"));
    assert_eq!(read(".gitignore"), IGNORE_FILE);
    assert_eq!(read("src/app.py"), "import streamlit as st\n\nst.title('Weather')\n");

    let requests = server.finish();
    assert_eq!(requests.len(), 5);
    assert!(prompt_of(&requests[0]).contains("requirements.txt"));
    assert!(prompt_of(&requests[1]).contains("README.md"));
}

#[test]
fn structure_inference_reads_fenced_json_from_service() {
    let server = MockOllama::start(vec![
        "```json\n{\"project_name\": \"Weather Dash\", \"module_path\": \"app\"}\n```",
    ]);
    let outcome = infer_with_service("mock", &server.url, Strategy::Direct, "weather dashboard");
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.structure().project_name, "weather_dash");
    assert_eq!(outcome.structure().module_path, "src/app.py");

    let requests = server.finish();
    assert_eq!(requests[0]["options"]["temperature"], 0.0);
}
