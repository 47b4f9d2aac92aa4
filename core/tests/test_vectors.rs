//! Verify every client operation against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector names an operation and its input, the request the client must
//! send, a simulated response and either the expected result or the expected
//! error kind. Results are compared as parsed JSON so field ordering does not
//! matter.

use std::sync::Mutex;

use serde_json::Value;
use spamwatch_core::{
    AddBan, Client, Error, HttpMethod, HttpRequest, HttpResponse, Permission, Transport,
    TransportError,
};

const BASE_URL: &str = "http://localhost:3000";
const TOKEN: &str = "test-token";

/// Replies with the vector's simulated response and keeps the request.
struct VectorTransport {
    response: HttpResponse,
    seen: Mutex<Option<HttpRequest>>,
}

impl Transport for VectorTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.seen.lock().unwrap() = Some(request);
        Ok(self.response.clone())
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Run the named operation and render its result as JSON.
fn call(client: &Client<VectorTransport>, operation: &str, input: &Value) -> Result<Value, Error> {
    let id = || input.as_i64().unwrap();
    let result = match operation {
        "get_version" => serde_json::to_value(client.get_version()?),
        "get_stats" => serde_json::to_value(client.get_stats()?),
        "add_ban" => {
            let ban: AddBan = serde_json::from_value(input.clone()).unwrap();
            serde_json::to_value(client.add_ban(&ban)?)
        }
        "delete_ban" => serde_json::to_value(client.delete_ban(id())?),
        "get_ban" => serde_json::to_value(client.get_ban(id())?),
        "get_ban_ids" => serde_json::to_value(client.get_ban_ids()?),
        "get_bans" => serde_json::to_value(client.get_bans()?),
        "get_tokens" => serde_json::to_value(client.get_tokens(input.as_bool().unwrap())?),
        "create_token" => {
            let permission: Permission = serde_json::from_value(input["permission"].clone()).unwrap();
            serde_json::to_value(client.create_token(input["id"].as_i64().unwrap(), permission)?)
        }
        "get_token" => serde_json::to_value(client.get_token(id())?),
        "get_token_user" => serde_json::to_value(client.get_token_user(
            input["userid"].as_i64().unwrap(),
            input["include_retired"].as_bool().unwrap(),
        )?),
        "delete_token" => serde_json::to_value(client.delete_token(id())?),
        other => panic!("unknown operation: {other}"),
    };
    Ok(result.unwrap())
}

fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let transport = VectorTransport {
            response: HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            },
            seen: Mutex::new(None),
        };
        let client = Client::with_transport(TOKEN, BASE_URL, transport);

        let result = call(&client, case["operation"].as_str().unwrap(), &case["input"]);

        // Verify request
        let expected_req = &case["expected_request"];
        let req = client_request(&client);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let req_body: Value = serde_json::from_str(body).unwrap();
                assert_eq!(req_body, expected_req["body"], "{name}: body");
            }
            None => assert!(expected_req["body"].is_null(), "{name}: body should be present"),
        }

        // Verify outcome
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(format!("{:?}", err.kind()), expected_error.as_str().unwrap(), "{name}: error kind");
        } else {
            let value = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
            assert_eq!(value, case["expected_result"], "{name}: result");
        }
    }
}

fn client_request(client: &Client<VectorTransport>) -> HttpRequest {
    client.transport().seen.lock().unwrap().clone().unwrap()
}

#[test]
fn meta_test_vectors() {
    run_vectors(include_str!("../../test-vectors/meta.json"));
}

#[test]
fn banlist_test_vectors() {
    run_vectors(include_str!("../../test-vectors/banlist.json"));
}

#[test]
fn tokens_test_vectors() {
    run_vectors(include_str!("../../test-vectors/tokens.json"));
}
