//! Simple Calculator JSON-RPC Example
//!
//! Registers `add` and `subtract` on a router and pushes a handful of raw
//! payloads (single calls, a notification, a mixed batch and broken input)
//! through the request handler, printing the body each one produces.

use async_trait::async_trait;
use json_rpc_dispatch::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};

/// Operands for both operations, by name (`{"a": 1, "b": 2}`) or by
/// position (`[1, 2]`)
#[derive(Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

/// Context created for every call
struct RequestContext {
    verbose: bool,
}

struct Subtract;

#[async_trait]
impl CallHandler<RequestContext> for Subtract {
    type Error = RpcError;

    async fn handle(&self, context: RequestContext, call: &Call) -> Result<Value, RpcError> {
        let Operands { a, b } = call.params().parse()?;
        if context.verbose {
            println!("  subtract: {} - {} = {}", a, b, a - b);
        }
        Ok(json!(a - b))
    }
}

#[tokio::main]
async fn main() -> Result<(), RpcError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "json_rpc_dispatch=debug".into()),
        )
        .init();

    println!("🧮 Simple Calculator JSON-RPC Example");
    println!("=====================================");

    let mut routes: RouterBuilder<RequestContext> = Router::builder();
    routes
        .add(
            "add",
            FunctionHandler::new(|context: RequestContext, call: Call| async move {
                let Operands { a, b } = call.params().parse()?;
                if context.verbose {
                    println!("  add: {} + {} = {}", a, b, a + b);
                }
                Ok::<_, RpcError>(json!(a + b))
            }),
        )?
        .add("subtract", Subtract)?;

    let handler = JsonRequestHandler::with_config(
        routes.build(),
        || RequestContext { verbose: true },
        HandlerConfig::default().with_concurrent_batches(true),
    );
    println!("Registered methods: {:?}", handler.router().methods());

    let payloads = [
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": 5, "b": 3}, "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": [10, 4], "id": "two"}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": 1, "b": 1}}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": {"a": 2, "b": 3}, "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": "invalid", "b": 5}, "id": 4}"#,
        r#"[
            {"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 5},
            {"jsonrpc": "2.0", "method": "subtract", "params": [1, 2]},
            {"foo": "bar"},
            {"jsonrpc": "2.0", "method": "subtract", "params": [7, 2], "id": 6}
        ]"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": "#,
        "[]",
    ];

    for (i, payload) in payloads.iter().enumerate() {
        println!("\n--- Payload {} ---", i + 1);
        println!("Request: {}", payload);

        let body = handler.handle_str(payload).await;
        if body.is_empty() {
            println!("Response: <no body>");
        } else {
            println!("Response: {}", body);
        }
    }

    println!("\n🎉 Calculator example completed!");
    Ok(())
}
