//! Line protocol that exposes an [`ExportHost`] to a driver in another
//! process over stdin/stdout.
//!
//! ```text
//! set <ms>   -> {"t_ms":<ms>,"intensities":[...9 values]}
//! loop       -> {"loop_ms":<ms>}
//! quit       -> (stream ends)
//! ```
//!
//! Every request gets exactly one reply line, and a `set` reply is only
//! written once the frame for that time has been sampled, so a driver that
//! waits for each reply can never race ahead of the view.

use std::io::{BufRead, Write};

use glowgrid_core::{ExportHost, GlowGridError, GridView, Result};
use serde_json::{json, Value};

pub fn serve<R, W>(host: &ExportHost, view: &GridView, input: R, mut output: W) -> Result<u64>
where
    R: BufRead,
    W: Write,
{
    if !host.drives(view.source())? {
        return Err(GlowGridError::HostMismatch);
    }

    let mut handled = 0;

    for line in input.lines() {
        let line = line?;
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if request == "quit" {
            break;
        }

        let reply = handle(host, view, request);
        serde_json::to_writer(&mut output, &reply)?;
        output.write_all(b"\n")?;
        output.flush()?;
        handled += 1;
    }

    Ok(handled)
}

fn handle(host: &ExportHost, view: &GridView, request: &str) -> Value {
    let mut parts = request.split_whitespace();
    let result = match (parts.next(), parts.next(), parts.next()) {
        (Some("set"), Some(ms), None) => set_time(host, view, ms),
        (Some("loop"), None, None) => host
            .loop_duration()
            .map(|loop_ms| json!({ "loop_ms": loop_ms })),
        _ => Ok(json!({ "error": format!("unknown request `{request}`") })),
    };

    result.unwrap_or_else(|err| json!({ "error": err.to_string() }))
}

fn set_time(host: &ExportHost, view: &GridView, ms: &str) -> Result<Value> {
    let Ok(t_ms) = ms.parse::<f64>() else {
        return Ok(json!({ "error": format!("`{ms}` is not a number of milliseconds") }));
    };

    host.set_export_time(t_ms)?;
    let frame = view.sample()?;
    tracing::debug!(t_ms, "frame served");
    Ok(json!({ "t_ms": t_ms, "intensities": frame }))
}
