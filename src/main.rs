//! Entry point for the **i3dist** daemon.
//!
//! Runs the [`Distributor`](i3dist::distributor::Distributor) on the main
//! thread.  The i3 event subscription feeds it through a shared
//! [`Trigger`]; the control socket forwards its commands to the same loop,
//! so manual commands never interleave with a redistribution pass.

use crossbeam_channel::Receiver;
use i3dist::command::Command;
use i3dist::config::Config;
use i3dist::distributor::Distributor;
use i3dist::i3::events::I3EventSource;
use i3dist::i3::wm::I3Wm;
use i3dist::ipc::listener::UnixSocketListener;
use i3dist::traits::{CommandSource, Trigger, TriggerSource};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Delay before re-subscribing after the event connection drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Default socket path for the control listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/i3dist.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/i3dist`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("i3dist")
}

/// Try to load the config from `$XDG_CONFIG_HOME/i3dist/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let wm = match I3Wm::from_config(&config.ipc) {
        Ok(wm) => wm,
        Err(e) => {
            error!("cannot locate the window manager: {}", e);
            std::process::exit(1);
        }
    };
    info!("using IPC socket {}", wm.socket().display());

    let (trigger, triggers) = Trigger::channel();
    spawn_event_source(wm.socket().to_path_buf(), trigger.clone());
    let commands = spawn_control_socket();

    // Fix up whatever state we start in instead of waiting a full interval.
    trigger.pulse();
    drop(trigger);

    let distributor = Distributor::new(wm, triggers, config.distributor).with_commands(commands);
    if let Err(e) = distributor.start() {
        error!("{}", e);
        std::process::exit(1);
    }
}

//  Helpers

/// Keep an i3 event subscription alive, re-subscribing after failures.
fn spawn_event_source(socket: PathBuf, trigger: Trigger) {
    std::thread::spawn(move || loop {
        let mut source = I3EventSource::new(&socket);
        match source.run(trigger.clone()) {
            Ok(()) => break,
            Err(e) => {
                warn!(
                    "event subscription lost ({}), retrying in {:?}",
                    e, RECONNECT_DELAY
                );
                std::thread::sleep(RECONNECT_DELAY);
                // Events may have been missed while disconnected.
                if !trigger.pulse() {
                    break;
                }
            }
        }
    });
}

/// Serve the control socket; its commands arrive on the returned receiver.
fn spawn_control_socket() -> Receiver<Command> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();

    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(cmd_tx) {
            error!("control socket error: {}", e);
        }
    });

    cmd_rx
}
