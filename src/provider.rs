use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::farm_fetch;
use crate::state::{Delta, ProviderCommand};

/// Runs fetches off the UI thread. Commands queued behind a slow fetch are
/// coalesced so only the newest one goes out.
pub fn spawn_fetch_worker(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    let base = farm_fetch::api_base();
    thread::spawn(move || {
        while let Ok(mut cmd) = cmd_rx.recv() {
            while let Ok(newer) = cmd_rx.try_recv() {
                let ProviderCommand::Fetch { seq, .. } = &cmd;
                let _ = tx.send(Delta::Log(format!("[INFO] Fetch #{seq} superseded")));
                cmd = newer;
            }

            let ProviderCommand::Fetch { seq, api_key } = cmd;
            let delta = match farm_fetch::fetch_snapshot_from(&base, &api_key) {
                Ok(snapshot) => Delta::SnapshotReady { seq, snapshot },
                Err(error) => Delta::FetchFailed { seq, error },
            };
            if tx.send(delta).is_err() {
                break;
            }
        }
    });
}
