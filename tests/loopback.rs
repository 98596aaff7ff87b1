//! Full runs against a bridge stand-in on a loopback socket

use balancebot_e2e::{Harness, HarnessConfig, HarnessError, JsonSink, ReportSink, StopReason, TextSink};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

fn config(port: u16) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.target.port = port;
    config.sequence.delay_ms = 10;
    config.collect.window_ms = 2000;
    config
}

/// Accepts one client, reads the five commands, answers with twelve frames
/// and closes.
async fn spawn_bridge() -> anyhow::Result<(u16, tokio::task::JoinHandle<std::io::Result<Vec<String>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let bridge = tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let mut commands = Vec::new();
        while commands.len() < 5 {
            match lines.next_line().await? {
                Some(line) => commands.push(line),
                None => break,
            }
        }

        let frames: String = (0..12).map(|i| format!("R:{i}\n")).collect();
        write.write_all(b"OK\n").await?;
        write.write_all(frames.as_bytes()).await?;
        write.shutdown().await?;
        Ok(commands)
    });

    Ok((port, bridge))
}

#[tokio::test]
async fn run_against_loopback_bridge() -> anyhow::Result<()> {
    let (port, bridge) = spawn_bridge().await?;

    let outcome = Harness::new(config(port)).run().await?;
    let commands = bridge.await??;

    assert_eq!(commands, ["START", "ARM", "MODE:9", "DISARM", "STOP"]);
    assert_eq!(outcome.capture.stop_reason, StopReason::PeerClosed);
    assert_eq!(outcome.report.count(), 12);

    let mut sink = TextSink::new(Vec::new());
    sink.emit(&outcome.report)?;
    let text = String::from_utf8(sink.into_inner())?;
    assert_eq!(
        text,
        "telemetry_lines: 12\nR:0\nR:1\nR:2\nR:3\nR:4\n...\nR:7\nR:8\nR:9\nR:10\nR:11\n"
    );
    Ok(())
}

#[tokio::test]
async fn json_report_from_loopback_run() -> anyhow::Result<()> {
    let (port, bridge) = spawn_bridge().await?;

    let outcome = Harness::new(config(port)).run().await?;
    bridge.await??;

    let mut sink = JsonSink::new(Vec::new());
    sink.emit(&outcome.report)?;
    let value: serde_json::Value = serde_json::from_slice(&sink.into_inner())?;
    assert_eq!(value["telemetry_lines"], 12);
    assert_eq!(value["elided"], true);
    assert_eq!(value["stop_reason"], "peer_closed");
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_a_connect_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let err = Harness::new(config(port)).run().await.unwrap_err();
    assert!(matches!(err, HarnessError::Connect(_)), "{err}");
    Ok(())
}
