//! In-memory stand-ins for the user and credits services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use atomic_saga::{
    ApiCallDef, Engine, Fields, HttpMethod, MemoryAuditSink, RemoteCall, RemoteCallError,
    RemoteInvoker, StepDefinition, TransactionDefinition, TransformError,
};
use serde_json::{Value, json};

pub const USERS: &str = "http://localhost:3001/mock/users";
pub const CREDITS: &str = "http://localhost:3001/mock/credits";
pub const NOWHERE: &str = "http://localhost:3999/nowhere";

#[derive(Default)]
struct ServiceState {
    next_id: u32,
    users: HashMap<String, Value>,
    ledger: Vec<(String, Value)>,
}

/// Scripted remote services that record every call they receive.
#[derive(Default)]
pub struct MockServices {
    state: Mutex<ServiceState>,
    calls: Mutex<Vec<RemoteCall>>,
    failing: Mutex<Vec<(HttpMethod, String)>>,
}

impl MockServices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every call with this method and exact URL answer 500.
    pub fn fail(&self, method: HttpMethod, url: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .push((method, url.to_string()));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| format!("{} {}", call.method, call.url))
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().expect("state lock").users.len()
    }

    pub fn ledger(&self) -> Vec<(String, Value)> {
        self.state.lock().expect("state lock").ledger.clone()
    }

    fn route(&self, call: &RemoteCall) -> Result<Value, u16> {
        let mut state = self.state.lock().expect("state lock");
        let body = call.body.clone().unwrap_or(Value::Null);
        let path = call
            .url
            .strip_prefix("http://localhost:3001/mock/")
            .ok_or(0_u16)?;
        let segments: Vec<&str> = path.split('/').collect();

        match (call.method, segments.as_slice()) {
            (HttpMethod::Post, ["users"]) => {
                let (Some(name), Some(email)) = (body.get("name"), body.get("email")) else {
                    return Err(400);
                };
                state.next_id += 1;
                let id = format!("u{}", state.next_id);
                let user = json!({"id": id, "name": name, "email": email});
                state.users.insert(id, user.clone());
                Ok(user)
            }
            (HttpMethod::Delete, ["users", id]) => {
                state.users.remove(*id);
                Ok(json!({"ok": true, "deleted": id}))
            }
            (HttpMethod::Get, ["users", id, "profile"]) => state
                .users
                .contains_key(*id)
                .then(|| json!({"id": id, "tier": "gold", "country": "US"}))
                .ok_or(404),
            (HttpMethod::Get, ["users", id, "recs"]) => state
                .users
                .contains_key(*id)
                .then(|| json!({"id": id, "interests": ["coding", "music", "gaming"]}))
                .ok_or(404),
            (HttpMethod::Post, ["credits"]) => {
                if body.get("userId").is_none() || !body["amount"].is_number() {
                    return Err(400);
                }
                state.ledger.push(("grant".to_string(), body.clone()));
                Ok(json!({"ok": true, "userId": body["userId"], "amount": body["amount"]}))
            }
            (HttpMethod::Post, ["credits", "revoke"]) => {
                state.ledger.push(("revoke".to_string(), body.clone()));
                Ok(json!({"ok": true}))
            }
            _ => Err(404),
        }
    }
}

impl RemoteInvoker for MockServices {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError> {
        self.calls.lock().expect("calls lock").push(call.clone());

        let forced = self
            .failing
            .lock()
            .expect("failing lock")
            .iter()
            .any(|(method, url)| *method == call.method && *url == call.url);
        if forced {
            return Err(RemoteCallError::Status {
                method: call.method,
                url: call.url.clone(),
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }

        match self.route(call) {
            Ok(value) => Ok(value),
            Err(0) => Err(RemoteCallError::Transport {
                method: call.method,
                url: call.url.clone(),
                message: "connection refused".to_string(),
            }),
            Err(status) => Err(RemoteCallError::Status {
                method: call.method,
                url: call.url.clone(),
                status,
                body: String::new(),
            }),
        }
    }
}

pub fn step(
    key: &str,
    execute: (HttpMethod, &str),
    rollback: (HttpMethod, &str),
    transform: &str,
) -> StepDefinition {
    StepDefinition::new(
        key,
        ApiCallDef::new(execute.0, execute.1),
        ApiCallDef::new(rollback.0, rollback.1),
        transform,
    )
}

fn users_url(suffix: &str) -> String {
    format!("{USERS}{suffix}")
}

pub fn create_db_user() -> StepDefinition {
    step(
        "CreateDBUser",
        (HttpMethod::Post, USERS),
        (HttpMethod::Delete, &users_url("/:id")),
        "userCreate",
    )
}

pub fn grant_welcome_credits(url: &str) -> StepDefinition {
    step(
        "GrantWelcomeCredits",
        (HttpMethod::Post, url),
        (HttpMethod::Post, &format!("{CREDITS}/revoke")),
        "grantCredits",
    )
}

pub fn create_user() -> TransactionDefinition {
    TransactionDefinition::new(vec![create_db_user(), grant_welcome_credits(CREDITS)])
        .expect("valid CreateUser")
}

pub fn create_user_fail() -> TransactionDefinition {
    TransactionDefinition::new(vec![create_db_user(), grant_welcome_credits(NOWHERE)])
        .expect("valid CreateUserFail")
}

pub fn create_user_everywhere() -> TransactionDefinition {
    let revoke = format!("{CREDITS}/revoke");
    TransactionDefinition::new(vec![
        step(
            "CreateInServiceA",
            (HttpMethod::Post, USERS),
            (HttpMethod::Delete, &users_url("/:id")),
            "createA",
        ),
        step(
            "FetchAProfile",
            (HttpMethod::Get, &users_url("/:id/profile")),
            (HttpMethod::Post, &revoke),
            "fetchAProfile",
        ),
        step(
            "FetchARecommendations",
            (HttpMethod::Get, &users_url("/:id/recs")),
            (HttpMethod::Post, &revoke),
            "fetchARecs",
        ),
        step(
            "CreateInServiceB",
            (HttpMethod::Post, USERS),
            (HttpMethod::Delete, &users_url("/:id")),
            "createB",
        ),
    ])
    .expect("valid CreateUserEverywhere")
}

fn name_and_email(input: &Fields) -> Result<Value, TransformError> {
    let name = input
        .get("name")
        .cloned()
        .ok_or_else(|| TransformError::new("name is required"))?;
    let email = input
        .get("email")
        .cloned()
        .ok_or_else(|| TransformError::new("email is required"))?;
    Ok(json!({"name": name, "email": email}))
}

/// An engine with the three sample transactions and their transforms.
pub fn sample_engine(services: &Arc<MockServices>, audit: &Arc<MemoryAuditSink>) -> Engine {
    Engine::builder()
        .transaction("CreateUser", create_user())
        .transaction("CreateUserFail", create_user_fail())
        .transaction("CreateUserEverywhere", create_user_everywhere())
        .transform_fn("userCreate", |input, _ctx| name_and_email(&input))
        .transform_fn("createA", |input, _ctx| name_and_email(&input))
        .transform_fn("grantCredits", |input, ctx| {
            let user_id = input
                .get("id")
                .or_else(|| ctx.chain.get("id"))
                .cloned()
                .unwrap_or(Value::Null);
            let amount = input
                .get("credits")
                .filter(|credits| credits.is_number())
                .cloned()
                .unwrap_or_else(|| json!(100));
            Ok(json!({"userId": user_id, "amount": amount}))
        })
        .transform_fn("fetchAProfile", |_input, _ctx| Ok(json!({})))
        .transform_fn("fetchARecs", |_input, _ctx| Ok(json!({})))
        .transform_fn("createB", |input, ctx| {
            let a_user_id = input
                .get("id")
                .or_else(|| ctx.chain.get("id"))
                .cloned()
                .unwrap_or_else(|| json!(""));
            Ok(json!({
                "aUserId": a_user_id,
                "name": input.get("name"),
                "email": input.get("email"),
                "profile": {"tier": input.get("tier"), "country": input.get("country")},
                "interests": input.get("interests"),
            }))
        })
        .audit_sink(Arc::clone(audit))
        .invoker(Arc::clone(services))
        .build()
        .expect("sample engine builds")
}

/// Answers calls from a fixed table keyed by method and URL.
#[derive(Default)]
pub struct ScriptedInvoker {
    responses: HashMap<(HttpMethod, String), Value>,
    failing: Vec<(HttpMethod, String)>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: HttpMethod, url: &str, value: Value) -> Self {
        self.responses.insert((method, url.to_string()), value);
        self
    }

    pub fn fail(mut self, method: HttpMethod, url: &str) -> Self {
        self.failing.push((method, url.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| format!("{} {}", call.method, call.url))
            .collect()
    }
}

impl RemoteInvoker for ScriptedInvoker {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError> {
        self.calls.lock().expect("calls lock").push(call.clone());
        let key = (call.method, call.url.clone());
        if self.failing.contains(&key) {
            return Err(RemoteCallError::Status {
                method: call.method,
                url: call.url.clone(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.responses.get(&key).cloned().unwrap_or(Value::Null))
    }
}
