//! Latchkey simulator.
//!
//! Runs the access engine against mock hardware. Keypad, card reader and
//! door are driven by lines on stdin (see `help`), engine events are
//! printed to stdout as JSON lines, and logs go to stderr. Credentials and
//! cards persist in the data directory like on the device.

mod input;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use latchkey_core::{LockConfig, SystemClock};
use latchkey_engine::{AccessEngine, ChannelSink, CommandSender, EngineEvent, Peripherals};
use latchkey_hardware::mock::{
    MockContactSensor, MockContactSensorHandle, MockIndicator, MockKeypad, MockKeypadHandle,
    MockLockActuator, MockRfid, MockRfidHandle,
};
use latchkey_hardware::{DoorContact, DoorHardware, LockModule};
use latchkey_storage::{CardRegistry, CredentialStore, FileRecord};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::input::{HELP, SimInput, parse_line};

const CREDENTIALS_FILE: &str = "passcodes.json";
const CARDS_FILE: &str = "cards.json";
const EVENT_BUFFER: usize = 256;
const STATUS_TRANSITIONS: usize = 5;

type SimEngine = AccessEngine<SystemClock, ChannelSink>;

#[derive(Parser, Debug)]
#[command(name = "latchkey")]
#[command(about = "Simulated keypad and card door lock", long_about = None)]
#[command(version)]
struct Args {
    /// Lock configuration file (JSON). Defaults apply if it does not exist.
    #[arg(short, long, env = "LATCHKEY_CONFIG", default_value = "latchkey.json")]
    config: PathBuf,

    /// Directory holding the credential and card records
    #[arg(short, long, env = "LATCHKEY_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Control loop period in milliseconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=1000))]
    tick_ms: u64,

    /// Start with the door open
    #[arg(long)]
    door_open: bool,
}

/// Handles of the simulated peripherals.
struct Bench {
    keys: MockKeypadHandle,
    card: MockRfidHandle,
    door: MockContactSensorHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let (config, found) = LockConfig::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if found {
        info!(path = %args.config.display(), "Loaded configuration");
    } else {
        info!(path = %args.config.display(), "No configuration file, using defaults");
    }

    let (sink, events) = ChannelSink::new(EVENT_BUFFER);
    let printer = tokio::spawn(print_events(events));

    let (mut engine, bench) = build_engine(config, sink, &args.data_dir, args.door_open)?;
    engine.init().context("lock hardware failed to start")?;

    let (input_tx, mut input_rx) = mpsc::channel(32);
    tokio::spawn(read_stdin(engine.sender(), input_tx));

    info!(tick_ms = args.tick_ms, "Simulator running, type 'help' for commands");

    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => engine.tick(),
            next = input_rx.recv(), if input_open => match next {
                Some(SimInput::Quit) => break,
                Some(input) => apply(&engine, &bench, input),
                None => {
                    info!("Input closed, running until interrupted");
                    input_open = false;
                }
            },
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }
    }

    if let Err(e) = engine.flush() {
        warn!(error = %e, "Records could not be written before exit");
    }
    // Dropping the engine closes the event channel.
    drop(engine);
    printer.await.context("event printer failed")?;
    info!("Shut down");
    Ok(())
}

fn build_engine(
    config: LockConfig,
    sink: ChannelSink,
    data_dir: &Path,
    door_open: bool,
) -> Result<(SimEngine, Bench)> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let credentials =
        CredentialStore::new(Box::new(FileRecord::new(data_dir.join(CREDENTIALS_FILE))));
    let cards = CardRegistry::new(Box::new(FileRecord::new(data_dir.join(CARDS_FILE))));

    let (keypad, keys) = MockKeypad::new();
    let (reader, card) = MockRfid::new();
    let (actuator, _) = MockLockActuator::new();
    let (led, _) = MockIndicator::new();
    let (sensor, door) = MockContactSensor::new(door_open);

    let contact = DoorContact::new(Box::new(sensor), config.contact_debounce_ms);
    let engine = AccessEngine::new(
        config,
        SystemClock::new(),
        sink,
        credentials,
        cards,
        Peripherals {
            keypad: Box::new(keypad),
            reader: Box::new(reader),
            door: DoorHardware::new(LockModule::new(Box::new(actuator), Box::new(led)), contact),
        },
    );
    Ok((engine, Bench { keys, card, door }))
}

/// Apply one local input to the bench.
fn apply(engine: &SimEngine, bench: &Bench, input: SimInput) {
    match input {
        SimInput::Keys(keys) => {
            if let Err(e) = bench.keys.type_keys(&keys) {
                warn!(error = %e, "Key presses dropped");
            }
        }
        SimInput::Card(uid) => {
            debug!(bytes = uid.len(), "Card placed in the field");
            bench.card.present_card(uid);
        }
        SimInput::RemoveCard => bench.card.remove_card(),
        SimInput::Door { open } => bench.door.set_open(open),
        SimInput::Status => println!("{}", status_line(engine)),
        SimInput::Help => eprintln!("{}", HELP),
        // Remote commands go through the queue; quit is handled by the loop.
        SimInput::Remote(_) | SimInput::Quit => {}
    }
}

fn status_line(engine: &SimEngine) -> serde_json::Value {
    serde_json::json!({
        "type": "status",
        "state": engine.lock_status(),
        "door_open": engine.is_door_open(),
        "locked_out": engine.is_locked_out(),
        "failed_attempts": engine.failed_attempts(),
        "enrolling": engine.is_enrolling(),
        "has_master": engine.credentials().has_master(),
        "temporary_codes": engine.credentials().list().len(),
        "cards": engine.cards().len(),
        "pending_commands": engine.pending_commands(),
        "recent": engine.lock_state().last_transitions(STATUS_TRANSITIONS),
    })
}

/// Read stdin until EOF. Remote commands are queued on the engine directly;
/// everything else is forwarded to the control loop.
async fn read_stdin(sender: CommandSender, inputs: mpsc::Sender<SimInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(SimInput::Remote(command))) => {
                let kind = command.kind;
                if let Err(e) = sender.send(command).await {
                    warn!(%kind, error = %e, "Command not queued");
                }
            }
            Ok(Some(input)) => {
                if inputs.send(input).await.is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("error: {:#}", e),
        }
    }
}

async fn print_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "Event not serializable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_core::LockReason;

    #[tokio::test]
    async fn test_status_line_lists_recent_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, _events) = ChannelSink::new(EVENT_BUFFER);
        let (mut engine, _bench) =
            build_engine(LockConfig::default(), sink, dir.path(), false).unwrap();
        engine.init().unwrap();

        engine.request_unlock(LockReason::Remote);
        engine.request_lock(LockReason::Remote);

        let status = status_line(&engine);
        assert_eq!(status["state"], "locked");
        let recent = status["recent"].as_array().unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0]["to"], "locked");
        assert_eq!(recent[1]["to"], "unlocked");
        assert_eq!(recent[1]["reason"], "remote");
        assert_eq!(recent[2]["reason"], "startup");
    }

    #[tokio::test]
    async fn test_status_line_caps_recent_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, _events) = ChannelSink::new(EVENT_BUFFER);
        let (mut engine, _bench) =
            build_engine(LockConfig::default(), sink, dir.path(), false).unwrap();
        engine.init().unwrap();

        for _ in 0..(STATUS_TRANSITIONS + 3) {
            engine.request_unlock(LockReason::Remote);
        }
        let status = status_line(&engine);
        assert_eq!(status["recent"].as_array().map(Vec::len), Some(STATUS_TRANSITIONS));
    }
}
