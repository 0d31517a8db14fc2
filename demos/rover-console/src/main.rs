//! A line-oriented operator console.
//!
//! ```text
//! ROVER_HOST=rover.local ROVER_PORT=9000 RUST_LOG=info cargo run -p rover-console
//! ```
//!
//! Type `help` for the command list.

use roverlink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// Prints notifications and the blocked dialog to stderr.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show_notification(&mut self, notification: &Notification) {
        eprintln!("{notification}");
    }

    fn show_blocked_dialog(&mut self, message: &str) {
        eprintln!("*** {message} ***");
    }

    fn hide_blocked_dialog(&mut self) {
        eprintln!("*** you have been unblocked ***");
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

const HELP: &str = "\
w/s        drive forward/backward
a/d        turn left/right
x          stop
i/k/j/l    camera up/down/left/right
c          camera reset
drive      enter driver mode (switches to the driving view)
leave      exit driver mode
ping       ping the backend
uptime     ask for the rover uptime
snap       request a camera snapshot
logs       fetch all log entries
kill <msg> enable the killswitch
unkill     disable the killswitch
alert <m>  broadcast an alert
status     print the session state
q          quit";

async fn run_command(client: &RoverClient, line: &str) -> Result<bool, RoverError> {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "w" => {
            client.drive_forward().await?;
        }
        "s" => {
            client.drive_backward().await?;
        }
        "a" => {
            client.turn_left().await?;
        }
        "d" => {
            client.turn_right().await?;
        }
        "x" => {
            client.stop().await?;
        }
        "i" => {
            client.camera_move_up().await?;
        }
        "k" => {
            client.camera_move_down().await?;
        }
        "j" => {
            client.camera_move_left().await?;
        }
        "l" => {
            client.camera_move_right().await?;
        }
        "c" => {
            client.camera_reset_position().await?;
        }
        "drive" => {
            client.set_view(View::Driving).await?;
            let identity = client.enter_driver_mode().await?;
            tokio::spawn(async move {
                match identity.wait().await {
                    Ok(id) => eprintln!("driver mode requested as {id}"),
                    Err(e) => eprintln!("cannot request driver mode: {e}"),
                }
            });
        }
        "leave" => {
            client.set_view(View::Elsewhere).await?;
            client.exit_driver_mode().await?;
        }
        "ping" => {
            let id = client.send_ping().await?;
            eprintln!("ping sent as {id}");
        }
        "uptime" => {
            client
                .get_system_up_time(|uptime| eprintln!("uptime: {uptime}"))
                .await?;
        }
        "snap" => {
            client
                .get_camera_snapshot(|image| {
                    let size = image.as_str().map(str::len).unwrap_or_default();
                    eprintln!("snapshot received ({size} bytes)");
                })
                .await?;
        }
        "logs" => {
            client
                .get_logging_entries(None, |entries| {
                    let count = entries.as_array().map(Vec::len).unwrap_or_default();
                    eprintln!("{count} log entries");
                })
                .await?;
        }
        "kill" => {
            client.set_killswitch(true, rest).await?;
        }
        "unkill" => {
            client.set_killswitch(false, "").await?;
        }
        "alert" => {
            client.send_alert_notification(rest).await?;
        }
        "status" => print_status(&client.store()),
        "help" => eprintln!("{HELP}"),
        "q" | "quit" => return Ok(false),
        "" => {}
        other => eprintln!("unknown command {other:?}, try help"),
    }
    Ok(true)
}

fn print_status(store: &SessionStore) {
    let driver = store.driver();
    let collisions = store.collisions();
    eprintln!("connected:   {}", store.is_connected());
    eprintln!("client id:   {}", store.client_id());
    eprintln!(
        "driver:      available={} killswitch={}",
        driver.is_driver_available, driver.is_killswitch_enabled
    );
    eprintln!(
        "collisions:  FL={} FR={} BL={} BR={}{}",
        collisions.collision_front_left,
        collisions.collision_front_right,
        collisions.collision_back_left,
        collisions.collision_back_right,
        if collisions.tainted_readings { " (tainted)" } else { "" },
    );
    eprintln!(
        "users:       {} connected, {} blocked",
        store.roster().connected_users.len(),
        store.roster().blocked_users.len()
    );
    if let Some(error) = store.last_error() {
        eprintln!("last error:  {}", error.error);
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn endpoint_from_env() -> Result<Endpoint, Box<dyn std::error::Error>> {
    if let Ok(url) = std::env::var("ROVER_URL") {
        return Ok(Endpoint::parse(&url)?);
    }
    let host = std::env::var("ROVER_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port = match std::env::var("ROVER_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => 9000,
    };
    Ok(Endpoint::new(host, port))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let endpoint = endpoint_from_env()?;
    eprintln!("connecting to {endpoint}");

    let client = RoverClient::builder()
        .heartbeat_interval(std::time::Duration::from_secs(5))
        .presenter(ConsolePresenter)
        .connect(&endpoint)
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&client, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown().await?;
    Ok(())
}
