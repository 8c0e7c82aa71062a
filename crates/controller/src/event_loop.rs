use std::future;
use std::sync::Arc;

use host::{Clipboard, ClipboardError, Host};
use sequence::{DeadlineToken, KeyEvent};
use settings::Config;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{Controller, CopyJob};

fn reconcile_ticker(period: std::time::Duration) -> time::Interval {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn spawn_copy<C: Clipboard>(
    clipboard: &Arc<C>,
    job: CopyJob,
    done: &mpsc::UnboundedSender<(String, Result<(), ClipboardError>)>,
) {
    let clipboard = clipboard.clone();
    let done = done.clone();
    tokio::spawn(async move {
        let result = clipboard.write_text(job.text).await;
        let _ = done.send((job.what, result));
    });
}

/// Drive `controller` until the key stream ends.
///
/// Each branch runs to completion before the next is polled, so a key is
/// never interleaved with a reconcile pass. Clipboard writes run as
/// separate tasks and report back through a channel; the ones still in
/// flight when keys run out are awaited before returning.
pub async fn run<H, C>(
    mut controller: Controller<H>,
    clipboard: Arc<C>,
    mut keys: mpsc::UnboundedReceiver<KeyEvent>,
    mut configs: mpsc::UnboundedReceiver<Config>,
) -> Controller<H>
where
    H: Host,
    C: Clipboard,
{
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(String, Result<(), ClipboardError>)>();
    let mut ticker = reconcile_ticker(controller.reconcile_interval());
    let mut configs_open = true;

    loop {
        let deadline = controller.pending_deadline();
        let expiry = async move {
            match deadline {
                Some(token) => {
                    time::sleep_until(Instant::from_std(token.at)).await;
                    token
                }
                None => future::pending::<DeadlineToken>().await,
            }
        };

        tokio::select! {
            key = keys.recv() => match key {
                Some(event) => {
                    let consumed = controller.handle_key(&event, Instant::now().into_std());
                    debug!(%event, consumed, "key handled");
                }
                None => break,
            },
            token = expiry => {
                controller.handle_deadline(token, Instant::now().into_std());
            }
            Some((what, result)) = done_rx.recv() => {
                controller.copy_finished(&what, result);
            }
            _ = ticker.tick() => {
                controller.tick();
            }
            config = configs.recv(), if configs_open => match config {
                Some(config) => {
                    let previous = controller.reconcile_interval();
                    controller.apply_config(&config);
                    if controller.reconcile_interval() != previous {
                        ticker = reconcile_ticker(controller.reconcile_interval());
                    }
                }
                None => configs_open = false,
            },
        }

        for job in controller.take_copies() {
            spawn_copy(&clipboard, job, &done_tx);
        }
    }

    drop(done_tx);
    while let Some((what, result)) = done_rx.recv().await {
        controller.copy_finished(&what, result);
    }
    info!("key stream closed");
    controller
}
