//! Counter demo: one page, a shared counter cell, and a few API routes.
//!
//! Run with `cargo run --example counter`, then open http://127.0.0.1:8080.
//! Every browser tab shares the same counter (cells are process-wide).

use std::io::{self, Read};

use anyhow::Result;
use ripple::{ApiResponse, App, AppConfig, EventHandler, Method, Node, Ui, deps, log};
use serde_json::json;

fn main() -> Result<()> {
    ripple::logger::set_verbose(std::env::var_os("RIPPLE_VERBOSE").is_some());

    let config = AppConfig::load_or_default()?;

    App::builder()
        .config(config)
        .page("/", counter_page)
        .api("/get", &[Method::Get], |_req| {
            ApiResponse::json(&json!({"method": "GET"}))
        })
        .api("/post", &[Method::Post], |_req| {
            ApiResponse::json(&json!({"method": "POST"}))
        })
        .api("/stream", &[Method::Get], |_req| {
            Ok(ApiResponse::stream(TickStream::new(10)))
        })
        .build()
        .run()
}

async fn counter_page(ui: Ui) -> Result<Node> {
    ui.console().log("Hello World")?;

    let (count, set_count) = ui.use_state("counter", 0_i64)?;

    ui.use_memo("count_changed", &deps![count], move || {
        log!("demo"; "counter is now {}", count);
        None
    });

    Ok(Node::new("div").child(
        Node::new("h1").child(format!("Counter: {count}")).child(
            Node::new("button")
                .on(
                    "onclick",
                    EventHandler::sync(move || {
                        set_count.set(count + 1);
                        Ok(())
                    }),
                )
                .child("Click Me"),
        ),
    ))
}

/// Emits one numbered line roughly every 300ms, then EOF.
struct TickStream {
    remaining: u32,
    total: u32,
}

impl TickStream {
    fn new(total: u32) -> Self {
        Self {
            remaining: total,
            total,
        }
    }
}

impl Read for TickStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        std::thread::sleep(std::time::Duration::from_millis(300));

        let line = format!("Hello World {}\n", self.total - self.remaining);
        self.remaining -= 1;

        let n = line.len().min(buf.len());
        buf[..n].copy_from_slice(&line.as_bytes()[..n]);
        Ok(n)
    }
}
