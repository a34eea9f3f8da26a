//! Benchmark worker binary.
//!
//! Speaks newline-delimited JSON: requests on stdin, `log` and
//! terminal messages on stdout. Tracing diagnostics go to stderr so
//! stdout stays a clean protocol channel. The computation module is
//! loaded before the first request is accepted; a load failure is
//! fatal and exits non-zero.

use std::sync::Arc;

use msmbench_compute::ComputeModule;
use msmbench_worker::{Dispatcher, WorkerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "msmbench_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::from_env();

    // One-time module load; must complete before the dispatcher
    // accepts its first message.
    let module = match ComputeModule::load(config.module_config()).await {
        Ok(module) => module,
        Err(e) => {
            tracing::error!(error = %e, "Computation module failed to load");
            return Err(e.into());
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(config.inbound_capacity);
    let cancel = CancellationToken::new();

    // Outbound writer: one JSON object per line on stdout.
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = outbound_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(mut line) => {
                    line.push('\n');
                    if stdout.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                    let _ = stdout.flush().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize outbound message");
                }
            }
        }
    });

    // Inbound reader: requests arriving while a job runs queue here
    // in arrival order. EOF closes the channel and drains the loop.
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if inbound_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read inbound message");
                    break;
                }
            }
        }
    });

    let dispatcher = Dispatcher::new(Arc::new(module), outbound_tx.clone());
    let mut dispatch_task = tokio::spawn(dispatcher.run(inbound_rx, cancel.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            cancel.cancel();
            let _ = (&mut dispatch_task).await;
        }
        _ = &mut dispatch_task => {}
    }

    // Close the outbound channel so the writer drains and exits.
    drop(outbound_tx);
    let _ = writer.await;
    reader.abort();

    Ok(())
}
