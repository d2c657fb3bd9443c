use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::engine::EngineActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::EngineMsg;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run all actors until the engine stops.
///
/// The engine stops on `EngineMsg::Shutdown`, sent either by a handle or by
/// this loop once the shutdown signal fires. The watcher follows it.
pub(super) async fn run_actors(
    engine: EngineActor,
    fs: Option<FsActor>,
    engine_tx: mpsc::Sender<EngineMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let watcher = async {
        if let Some(fs) = fs {
            fs.run().await;
        }
    };

    let signal = async move {
        let Some(rx) = shutdown_rx else {
            return;
        };
        while !engine_tx.is_closed() {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                let _ = engine_tx.send(EngineMsg::Shutdown).await;
                return;
            }
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }
    };

    tokio::join!(engine.run(), watcher, signal);
}
