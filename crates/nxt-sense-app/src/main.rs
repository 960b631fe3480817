//! Command line tool for the GumstixNXT sensor board.
//!
//! Builds the full board stack for one invocation: level-shifter bank,
//! ADC transaction engine, and the four-port sensor registry, wired over
//! either the in-process simulator or the real Linux character devices.
//! The `--ports` option applies an initial port configuration before the
//! command runs.
//!
//! # Usage
//!
//! ```bash
//! # Status word of the four ports against the simulated board
//! nxt status
//! nxt status --json
//!
//! # Attach touch on port 0 and light on port 2, then read them
//! nxt --ports "1 0 2 0" read port 0
//! nxt --ports "1 0 2 0" read port 2
//!
//! # Reconfigure a populated board and print the resulting status word
//! nxt --ports "2 0 0 0" configure 1 0 2 0
//!
//! # Raw ADC channels, supply voltage, level-shifter diagnostics
//! nxt read adc 3
//! nxt read voltage
//! nxt shifter
//!
//! # Poll a touch sensor on real hardware
//! nxt --backend linux --ports "1 0 0 0" watch 0 --interval-ms 250
//! ```

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nxt_sense::{status_line, AdcNode, PortConfig, PortRegistry, Sensor, VoltageMonitor};
use nxt_sense_board::sim::{SimBus, SimGpio};
use nxt_sense_board::{AdcEngine, AnalogPath, GpioProvider, ShifterBank};
use nxt_sense_core::types::{AdcChannel, Port, ShifterId};

#[derive(Parser)]
#[command(name = "nxt")]
#[command(author, version, about = "GumstixNXT sensor board control", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Board backend: "sim" or "linux" (the latter needs the linux-hw feature)
    #[arg(short, long, default_value = "sim")]
    backend: String,

    /// Initial port configuration, four sensor codes
    #[arg(short, long, default_value = "0 0 0 0")]
    ports: String,

    /// SPI character device for the linux backend
    #[arg(long, default_value = "/dev/spidev1.0")]
    spidev: String,

    /// GPIO character device for the linux backend
    #[arg(long, default_value = "/dev/gpiochip0")]
    gpiochip: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of the four sensor ports
    Status {
        /// Emit machine-readable JSON instead of the status word
        #[arg(long)]
        json: bool,
    },

    /// Apply a new port configuration and print the resulting status word
    Configure {
        /// Four sensor codes, as one quoted word or separate arguments
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Clear a failed port back to empty
    Reset {
        /// Port index (0-3)
        port: u8,
    },

    /// Read one value from a sensor port, a raw ADC channel, or the supply voltage
    Read {
        /// What to read: "port", "adc" or "voltage"
        source: String,

        /// Port index for "port", channel number for "adc"
        index: Option<u8>,
    },

    /// Poll the sensor on a port and print each readout
    Watch {
        /// Port index (0-3)
        port: u8,

        /// Delay between readouts in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Number of readouts, 0 to run until interrupted
        #[arg(long, default_value_t = 0)]
        count: u64,
    },

    /// Show or set the trigger threshold of a touch sensor
    Threshold {
        /// Port index (0-3), must have a touch sensor attached
        port: u8,

        /// New threshold; omit to print the current one
        value: Option<u16>,
    },

    /// Print the raw analog reading of a touch sensor
    Raw {
        /// Port index (0-3), must have a touch sensor attached
        port: u8,
    },

    /// Show or set the floodlight LED of a light sensor
    Led {
        /// Port index (0-3), must have a light sensor attached
        port: u8,

        /// "on" or "off"; omit to print the current state
        state: Option<String>,
    },

    /// Show level-shifter reference counts
    Shifter,
}

/// Everything a command needs, wired over the selected backend.
struct Board {
    bank: Arc<ShifterBank>,
    registry: PortRegistry,
    voltage: VoltageMonitor,
    nodes: Vec<AdcNode>,
    _analog: AnalogPath,
}

/// One row of `status --json` output.
#[derive(Serialize)]
struct PortReport {
    port: usize,
    status: &'static str,
    code: i32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("NXT sensor board tool v{}", env!("CARGO_PKG_VERSION"));

    let board = build_board(&cli)?;

    match cli.command {
        None => show_status(&board, false)?,
        Some(Commands::Status { json }) => show_status(&board, json)?,
        Some(Commands::Configure { codes }) => run_configure(&board, &codes)?,
        Some(Commands::Reset { port }) => run_reset(&board, port)?,
        Some(Commands::Read { source, index }) => run_read(&board, &source, index)?,
        Some(Commands::Watch {
            port,
            interval_ms,
            count,
        }) => run_watch(&board, port, interval_ms, count)?,
        Some(Commands::Threshold { port, value }) => run_threshold(&board, port, value)?,
        Some(Commands::Raw { port }) => run_raw(&board, port)?,
        Some(Commands::Led { port, state }) => run_led(&board, port, state.as_deref())?,
        Some(Commands::Shifter) => show_shifters(&board)?,
    }

    Ok(())
}

// ============================================================================
// Board Construction
// ============================================================================

fn build_board(cli: &Cli) -> anyhow::Result<Board> {
    let engine = Arc::new(AdcEngine::new());
    let provider = match cli.backend.to_lowercase().as_str() {
        "sim" => open_sim_backend(&engine)?,
        "linux" => open_linux_backend(&engine, &cli.spidev, &cli.gpiochip)?,
        other => anyhow::bail!("unknown backend '{}' (expected \"sim\" or \"linux\")", other),
    };

    let bank = Arc::new(ShifterBank::new(Arc::clone(&provider)));
    let analog = AnalogPath::enable(Arc::clone(&bank))?;
    let registry = PortRegistry::new(Arc::clone(&engine), provider.as_ref())?;

    let config: PortConfig = cli.ports.parse()?;
    registry.configure(&config)?;

    Ok(Board {
        bank,
        registry,
        voltage: VoltageMonitor::new(Arc::clone(&engine)),
        nodes: AdcNode::wired(&engine),
        _analog: analog,
    })
}

fn open_sim_backend(engine: &Arc<AdcEngine>) -> anyhow::Result<Arc<dyn GpioProvider>> {
    let bus = SimBus::new();
    // Demo readings: a pressed touch sensor on input 0, ambient light on
    // inputs 1-3, a charged battery pack on the voltage divider.
    bus.set_channel(AdcChannel::In0, 183);
    bus.set_channel(AdcChannel::In1, 1847);
    bus.set_channel(AdcChannel::In2, 960);
    bus.set_channel(AdcChannel::In3, 2411);
    bus.set_channel(AdcChannel::VOLTAGE, 3187);
    engine
        .bind(Box::new(bus))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("using the simulated board backend");
    Ok(Arc::new(SimGpio::new()))
}

fn open_linux_backend(
    engine: &Arc<AdcEngine>,
    spidev: &str,
    gpiochip: &str,
) -> anyhow::Result<Arc<dyn GpioProvider>> {
    #[cfg(feature = "linux-hw")]
    {
        use nxt_sense_board::linux::{LinuxGpio, LinuxSpi};

        let spi = LinuxSpi::open(spidev)?;
        engine
            .bind(Box::new(spi))
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let chip = LinuxGpio::open(gpiochip)?;

        info!("using the Linux backend on {} and {}", spidev, gpiochip);
        Ok(Arc::new(chip))
    }
    #[cfg(not(feature = "linux-hw"))]
    {
        let _ = (engine, spidev, gpiochip);
        anyhow::bail!(
            "linux backend not enabled. Rebuild with --features linux-hw:\n  cargo run -p nxt-sense-app --features linux-hw -- --backend linux"
        )
    }
}

// ============================================================================
// Commands
// ============================================================================

fn show_status(board: &Board, json: bool) -> anyhow::Result<()> {
    let status = board.registry.status()?;
    if json {
        let report: Vec<PortReport> = status
            .iter()
            .enumerate()
            .map(|(port, s)| PortReport {
                port,
                status: s.name(),
                code: s.code(),
            })
            .collect();
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", status_line(&status));
    }
    Ok(())
}

fn run_configure(board: &Board, codes: &[String]) -> anyhow::Result<()> {
    let config: PortConfig = codes.join(" ").parse()?;
    board.registry.configure(&config)?;
    println!("{}", status_line(&board.registry.status()?));
    Ok(())
}

fn run_reset(board: &Board, port: u8) -> anyhow::Result<()> {
    let port = port_arg(port)?;
    board.registry.reset_port(port)?;
    println!("{}", status_line(&board.registry.status()?));
    Ok(())
}

fn run_read(board: &Board, source: &str, index: Option<u8>) -> anyhow::Result<()> {
    match source.to_lowercase().as_str() {
        "port" => {
            let index = index.ok_or_else(|| anyhow::anyhow!("read port needs a port index"))?;
            let sensor = attached_sensor(board, port_arg(index)?)?;
            let mut file = sensor.open()?;
            print_readout(&mut file)
        }
        "adc" => {
            let number = index.ok_or_else(|| anyhow::anyhow!("read adc needs a channel number"))?;
            let node = board
                .nodes
                .iter()
                .find(|node| node.channel().number() == number)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "channel must be between 0 and {}, got {}",
                        board.nodes.len() - 1,
                        number
                    )
                })?;
            print_readout(&mut node.open())
        }
        "voltage" => print_readout(&mut board.voltage.open()),
        other => anyhow::bail!(
            "unknown read source '{}' (expected \"port\", \"adc\" or \"voltage\")",
            other
        ),
    }
}

fn run_watch(board: &Board, port: u8, interval_ms: u64, count: u64) -> anyhow::Result<()> {
    let port = port_arg(port)?;
    let sensor = attached_sensor(board, port)?;
    info!(
        "polling the {} sensor on {} every {} ms",
        sensor.kind().name(),
        port.name(),
        interval_ms
    );

    let mut remaining = count;
    loop {
        let mut out = String::new();
        sensor.open()?.read_to_string(&mut out)?;
        print!("{out}");
        io::stdout().flush()?;

        if count != 0 {
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
        thread::sleep(Duration::from_millis(interval_ms));
    }
    Ok(())
}

fn run_threshold(board: &Board, port: u8, value: Option<u16>) -> anyhow::Result<()> {
    let port = port_arg(port)?;
    let sensor = attached_sensor(board, port)?;
    match sensor.as_ref() {
        Sensor::Touch(touch) => match value {
            Some(threshold) => touch.set_threshold(threshold)?,
            None => println!("{}", touch.threshold()?),
        },
        Sensor::Light(_) => anyhow::bail!("{} has a light sensor attached, not touch", port.name()),
    }
    Ok(())
}

fn run_raw(board: &Board, port: u8) -> anyhow::Result<()> {
    let port = port_arg(port)?;
    let sensor = attached_sensor(board, port)?;
    match sensor.as_ref() {
        Sensor::Touch(touch) => println!("{}", touch.raw_sample()?),
        Sensor::Light(_) => anyhow::bail!("{} has a light sensor attached, not touch", port.name()),
    }
    Ok(())
}

fn run_led(board: &Board, port: u8, state: Option<&str>) -> anyhow::Result<()> {
    let port = port_arg(port)?;
    let sensor = attached_sensor(board, port)?;
    let light = match sensor.as_ref() {
        Sensor::Light(light) => light,
        Sensor::Touch(_) => {
            anyhow::bail!("{} has a touch sensor attached, not light", port.name())
        }
    };

    match state {
        None => println!("{}", u8::from(light.led()?)),
        Some(word) => {
            let on = match word.to_lowercase().as_str() {
                "on" | "1" => true,
                "off" | "0" => false,
                other => anyhow::bail!("LED state must be \"on\" or \"off\", got '{}'", other),
            };
            light.set_led(on)?;
        }
    }
    Ok(())
}

fn show_shifters(board: &Board) -> anyhow::Result<()> {
    for id in ShifterId::ALL {
        let refs = board.bank.refs(id)?;
        let active = board.bank.is_active(id)?;
        println!(
            "{} (tag {}, gpio {}): {} reference(s), {}",
            id.label(),
            id.tag(),
            id.gpio_line(),
            refs,
            if active { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn port_arg(index: u8) -> anyhow::Result<Port> {
    Port::from_index(usize::from(index))
        .ok_or_else(|| anyhow::anyhow!("port must be between 0 and 3, got {}", index))
}

fn attached_sensor(board: &Board, port: Port) -> anyhow::Result<Arc<Sensor>> {
    board
        .registry
        .sensor(port)?
        .ok_or_else(|| anyhow::anyhow!("no sensor attached to {} (set one with --ports)", port.name()))
}

fn print_readout<R: Read>(file: &mut R) -> anyhow::Result<()> {
    let mut out = String::new();
    file.read_to_string(&mut out)?;
    print!("{out}");
    Ok(())
}
