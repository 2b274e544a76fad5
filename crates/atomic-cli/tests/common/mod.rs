#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

use tempfile::TempDir;

pub fn project_with_config(content: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(dir.path().join("Atomic.toml"), content).expect("write Atomic.toml");
    dir
}

/// Base URL of a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));
    drop(listener);
    url
}

/// Answers each incoming request with the next canned `(status line, body)`.
pub fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));

    thread::spawn(move || {
        for (status_line, body) in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut request_body = vec![0; length];
            let _ = reader.read_exact(&mut request_body);

            let mut stream = stream;
            let _ = write!(
                stream,
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
        }
    });

    base
}

pub fn create_user_config(base: &str) -> String {
    format!(
        r#"[transforms.userCreate]
require = ["name", "email"]
pick = ["name", "email"]

[transforms.grantCredits]
rename = {{ userId = "id", amount = "credits" }}
defaults = {{ amount = 100 }}

[[transactions.CreateUser.steps]]
key = "CreateDBUser"
transform = "userCreate"
execute = {{ method = "POST", url = "{base}/mock/users" }}
rollback = {{ method = "DELETE", url = "{base}/mock/users/:id" }}

[[transactions.CreateUser.steps]]
key = "GrantWelcomeCredits"
transform = "grantCredits"
execute = {{ method = "POST", url = "{base}/mock/credits" }}
rollback = {{ method = "POST", url = "{base}/mock/credits/revoke" }}
"#
    )
}
