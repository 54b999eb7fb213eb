use flowlink::client::{ApiClient, CancelHandle, RequestOptions, ResponseBody};
use flowlink::config::ClientConfig;
use flowlink::error::ClientError;
use flowlink::sse::payloads::{TextChunkPayload, WorkflowPayload};
use flowlink::sse::{DataInfo, EventSink};

use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use std::io::{self, Write};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: flowlink [--public <share-code>] <command>

Commands:
  stream <path> <json>      POST <json> and print stream events as they arrive
  get <path>                GET <path> and print the body
  post <path> <json>        POST <json> and print the body
  login <access> [refresh]  Store credentials (refresh is required without --public)

Environment:
  FLOWLINK_API_PREFIX, FLOWLINK_PUBLIC_API_PREFIX, FLOWLINK_STORE_DIR,
  FLOWLINK_TIMEOUT_MS, RUST_LOG";

#[derive(Debug, PartialEq)]
enum Command {
    Stream { path: String, body: String },
    Get { path: String },
    Post { path: String, body: String },
    Login { access: String, refresh: Option<String> },
}

#[derive(Debug, PartialEq)]
struct Invocation {
    share_code: Option<String>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut share_code = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--public" {
            let code = iter
                .next()
                .ok_or_else(|| eyre!("--public needs a share code"))?;
            share_code = Some(code.clone());
        } else {
            rest.push(arg.as_str());
        }
    }

    let command = match rest.as_slice() {
        ["stream", path, body] => Command::Stream {
            path: path.to_string(),
            body: body.to_string(),
        },
        ["get", path] => Command::Get {
            path: path.to_string(),
        },
        ["post", path, body] => Command::Post {
            path: path.to_string(),
            body: body.to_string(),
        },
        ["login", access] => Command::Login {
            access: access.to_string(),
            refresh: None,
        },
        ["login", access, refresh] => Command::Login {
            access: access.to_string(),
            refresh: Some(refresh.to_string()),
        },
        [] => bail!("Missing command"),
        [other, ..] => bail!("Unknown or incomplete command: {}", other),
    };

    Ok(Invocation {
        share_code,
        command,
    })
}

/// Prints answer text to stdout and progress to stderr.
struct PrintSink {
    stdout: io::Stdout,
}

impl PrintSink {
    fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    fn write(&mut self, text: &str) {
        let _ = self.stdout.write_all(text.as_bytes());
        let _ = self.stdout.flush();
    }
}

fn node_title(payload: &WorkflowPayload) -> &str {
    payload
        .data
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("node")
}

impl EventSink for PrintSink {
    fn on_data(&mut self, content: &str, _is_first_message: bool, info: &DataInfo) {
        if let Some(message) = &info.error_message {
            eprintln!("\n[error] {}", message);
        }
        self.write(content);
    }

    fn on_completed(&mut self, has_error: bool, message: Option<&str>) {
        self.write("\n");
        if has_error {
            eprintln!("[failed] {}", message.unwrap_or("stream ended with an error"));
        }
    }

    fn on_error(&mut self, error: &ClientError) {
        if !error.is_cancellation() {
            eprintln!("[error] {}", error.user_message());
        }
    }

    fn on_workflow_started(&mut self, _payload: &WorkflowPayload) {
        eprintln!("[workflow] started");
    }

    fn on_workflow_finished(&mut self, payload: &WorkflowPayload) {
        let status = payload
            .data
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("finished");
        eprintln!("[workflow] {}", status);
    }

    fn on_node_started(&mut self, payload: &WorkflowPayload) {
        eprintln!("[node] {} started", node_title(payload));
    }

    fn on_node_finished(&mut self, payload: &WorkflowPayload) {
        eprintln!("[node] {} finished", node_title(payload));
    }

    fn on_text_chunk(&mut self, chunk: &TextChunkPayload) {
        self.write(&chunk.data.text);
    }
}

fn print_body(body: ResponseBody) -> Result<()> {
    match body {
        ResponseBody::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        ResponseBody::Binary { bytes, .. } => {
            let mut stdout = io::stdout();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn run(invocation: Invocation) -> Result<()> {
    let client = ApiClient::from_config(ClientConfig::from_env())?;
    let scoped = |options: RequestOptions| match &invocation.share_code {
        Some(code) => options.public(code.clone()),
        None => options,
    };

    match &invocation.command {
        Command::Login { access, refresh } => match (&invocation.share_code, refresh) {
            (Some(code), _) => client.credentials().set_public(code, access)?,
            (None, Some(refresh)) => client.credentials().set_tokens(access, refresh)?,
            (None, None) => bail!("login needs a refresh token for console sessions"),
        },
        Command::Get { path } => {
            let body = client.request(path, scoped(RequestOptions::get())).await?;
            print_body(body)?;
        }
        Command::Post { path, body } => {
            let json = serde_json::from_str(body)?;
            let body = client
                .request(path, scoped(RequestOptions::post(json)))
                .await?;
            print_body(body)?;
        }
        Command::Stream { path, body } => {
            let json = serde_json::from_str(body)?;
            let cancel = CancelHandle::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let options = scoped(RequestOptions::post(json)).with_cancel(cancel);
            let mut sink = PrintSink::new();
            client.stream(path, options, &mut sink).await?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--version") {
        println!("flowlink {}", VERSION);
        return Ok(());
    }
    if args.is_empty() || args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    color_eyre::install()?;
    flowlink::logging::init_tracing();

    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(e) = runtime.block_on(run(invocation)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
