//! Operator command handlers
//!
//! One console line in, text out. Each line is a command name (short or
//! long form) followed by whitespace-separated arguments. Handlers write
//! their reply into the caller's buffer and report how the session should
//! continue.

use core::fmt::{self, Write};

use crate::backend::{IoBackend, LiveState, TriggerAction};
use crate::config::{
    BusConfig, BusRole, ConfigStore, CounterConfig, Indicator, MemoryStore, OutputConfig,
    PinConfig, PinFlag, PinMode, PwmConfig, StorePersistence, TimerConfig, TimerDirection,
};
use crate::dump::DumpFormat;
use crate::error::{IoError, Parameter};
use crate::io::{Io, PinAddress};

/// Outcome of one command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppAction {
    Normal,
    Error,
    /// Close the console session
    Disconnect,
    /// Restart the node
    Reset,
}

/// Tokenized command line; argument 0 is the command name
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    line: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line }
    }

    pub fn string(&self, index: usize) -> Option<&'a str> {
        self.line.split_whitespace().nth(index)
    }

    /// Integer argument, decimal or `0x` hexadecimal
    ///
    /// `None` when absent, `Usage` when present but not a number.
    pub fn int(&self, index: usize) -> Result<Option<i64>, IoError> {
        let Some(text) = self.string(index) else {
            return Ok(None);
        };
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (radix, digits) = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => (16, hex),
            None => (10, digits),
        };
        // the sign was taken above, a second one is malformed
        if !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(IoError::Usage);
        }
        let value = i64::from_str_radix(digits, radix).map_err(|_| IoError::Usage)?;
        Ok(Some(if negative { -value } else { value }))
    }

    /// Integer argument that must be present
    pub fn required(&self, index: usize) -> Result<i64, IoError> {
        self.int(index)?.ok_or(IoError::Usage)
    }

    fn flag(&self, index: usize) -> Result<bool, IoError> {
        Ok(self.required(index)? != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    IoMode,
    IoRead,
    IoWrite,
    IoTrigger,
    IoSetFlag,
    IoClearFlag,
    IoDump,
    AnalogRead,
    PwmPeriod,
    StatusSet,
    AssociationSet,
    Quit,
    Reset,
    Help,
}

struct CommandInfo {
    short: &'static str,
    long: &'static str,
    command: Command,
    help: &'static str,
}

static COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        short: "im",
        long: "io-mode",
        command: Command::IoMode,
        help: "config i/o pin <io> <pin> <mode> [params]",
    },
    CommandInfo {
        short: "ir",
        long: "io-read",
        command: Command::IoRead,
        help: "read from i/o pin <io> <pin>",
    },
    CommandInfo {
        short: "iw",
        long: "io-write",
        command: Command::IoWrite,
        help: "write to i/o pin <io> <pin> [value] [max duty] [delay]",
    },
    CommandInfo {
        short: "it",
        long: "io-trigger",
        command: Command::IoTrigger,
        help: "trigger i/o pin <io> <pin> [on|off|up|down]",
    },
    CommandInfo {
        short: "isf",
        long: "io-set-flag",
        command: Command::IoSetFlag,
        help: "set i/o pin flag <io> <pin> <flag>",
    },
    CommandInfo {
        short: "icf",
        long: "io-clear-flag",
        command: Command::IoClearFlag,
        help: "clear i/o pin flag <io> <pin> <flag>",
    },
    CommandInfo {
        short: "id",
        long: "io-dump",
        command: Command::IoDump,
        help: "dump i/o pins [<io> <pin>] [html]",
    },
    CommandInfo {
        short: "ar",
        long: "analog-read",
        command: Command::AnalogRead,
        help: "read analog input",
    },
    CommandInfo {
        short: "pp",
        long: "pwm-period",
        command: Command::PwmPeriod,
        help: "show or set pwm period [us]",
    },
    CommandInfo {
        short: "gss",
        long: "gpio-status-set",
        command: Command::StatusSet,
        help: "set pin to trigger on status update <io> <pin>",
    },
    CommandInfo {
        short: "gas",
        long: "gpio-association-set",
        command: Command::AssociationSet,
        help: "set pin to trigger on association <io> <pin>",
    },
    CommandInfo {
        short: "q",
        long: "quit",
        command: Command::Quit,
        help: "close the session",
    },
    CommandInfo {
        short: "r",
        long: "reset",
        command: Command::Reset,
        help: "restart the node",
    },
    CommandInfo {
        short: "?",
        long: "help",
        command: Command::Help,
        help: "help [command]",
    },
];

fn find(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .iter()
        .find(|info| info.short == name || info.long == name)
}

enum Failure {
    Io(IoError),
    Format,
}

impl From<IoError> for Failure {
    fn from(error: IoError) -> Self {
        Self::Io(error)
    }
}

impl From<fmt::Error> for Failure {
    fn from(_: fmt::Error) -> Self {
        Self::Format
    }
}

type Outcome = Result<AppAction, Failure>;

/// Run one command line against `io`
pub fn dispatch<N, E, S, W>(io: &mut Io<N, E>, store: &mut S, line: &str, out: &mut W) -> AppAction
where
    N: IoBackend,
    E: IoBackend,
    S: ConfigStore,
    W: Write,
{
    let args = Args::new(line);
    let Some(name) = args.string(0) else {
        return AppAction::Normal;
    };
    let Some(info) = find(name) else {
        writeln!(out, "{}: command unknown", name).ok();
        return AppAction::Error;
    };

    let outcome = match info.command {
        Command::IoMode => io_mode(io, store, &args, out),
        Command::IoRead => io_read(io, &args, out),
        Command::IoWrite => io_write(io, &args, out),
        Command::IoTrigger => io_trigger(io, &args, out),
        Command::IoSetFlag => io_flag(io, store, &args, out, info.long, true),
        Command::IoClearFlag => io_flag(io, store, &args, out, info.long, false),
        Command::IoDump => io_dump(io, &args, out),
        Command::AnalogRead => analog_read(io, out),
        Command::PwmPeriod => pwm_period(io, store, &args, out),
        Command::StatusSet => indicator_set(io, store, &args, out, Indicator::Status),
        Command::AssociationSet => indicator_set(io, store, &args, out, Indicator::Association),
        Command::Quit => Ok(AppAction::Disconnect),
        Command::Reset => Ok(AppAction::Reset),
        Command::Help => help(&args, out),
    };

    match outcome {
        Ok(action) => action,
        Err(Failure::Io(error)) => {
            io_debug!("{}: {}", info.long, error);
            writeln!(out, "{}: {}", info.long, error).ok();
            AppAction::Error
        }
        Err(Failure::Format) => AppAction::Error,
    }
}

/// Run one command line and persist whatever it committed
///
/// A failed save rolls the store back to its last persisted entries, puts
/// the store-backed live settings back in line with them and reports the
/// line as failed.
pub async fn execute<N, E, P, W, const M: usize>(
    io: &mut Io<N, E>,
    store: &mut MemoryStore<M>,
    persistence: &mut P,
    line: &str,
    out: &mut W,
) -> AppAction
where
    N: IoBackend,
    E: IoBackend,
    P: StorePersistence<M>,
    W: Write,
{
    let action = dispatch(io, store, line, out);
    if !store.take_dirty() {
        return action;
    }

    match persistence.save(store).await {
        Ok(()) => {
            store.persisted();
            action
        }
        Err(_) => {
            io_warn!("config: save failed, change reverted");
            store.revert();
            io.reload_settings(&*store);
            writeln!(out, "! config: flash write failed, change reverted").ok();
            match action {
                AppAction::Normal => AppAction::Error,
                other => other,
            }
        }
    }
}

fn address<N: IoBackend, E: IoBackend>(
    io: &Io<N, E>,
    args: &Args<'_>,
) -> Result<PinAddress, IoError> {
    io.resolve(args.required(1)?, args.required(2)?)
}

fn format_of(word: Option<&str>) -> DumpFormat {
    match word {
        Some("html") => DumpFormat::Markup,
        _ => DumpFormat::Plain,
    }
}

/// Build the config `io-mode` stages from `<mode> [params]` at argument 3
fn parse_mode(args: &Args<'_>) -> Result<PinConfig, IoError> {
    let mode = args
        .string(3)
        .and_then(PinMode::from_name)
        .ok_or(IoError::InvalidModeName)?;

    let config = match mode {
        PinMode::Disabled | PinMode::Input => PinConfig::for_mode(mode),
        PinMode::Counter => {
            PinConfig::Counter(CounterConfig::new(args.flag(4)?, args.required(5)?)?)
        }
        PinMode::Output => PinConfig::Output(OutputConfig {
            startup_state: args.flag(4)?,
        }),
        PinMode::Timer => {
            let direction = args.string(4).ok_or(IoError::Usage)?;
            let direction =
                TimerDirection::from_name(direction).ok_or(IoError::InvalidDirection)?;
            PinConfig::Timer(TimerConfig::new(
                direction,
                args.required(5)?,
                args.flag(6)?,
                args.flag(7)?,
            )?)
        }
        PinMode::Pwm => {
            let defaults = PwmConfig::default();
            PinConfig::Pwm(PwmConfig::new(
                args.int(4)?.unwrap_or(i64::from(defaults.min_duty)),
                args.int(5)?.unwrap_or(i64::from(defaults.max_duty)),
                args.int(6)?.unwrap_or(i64::from(defaults.delay)),
            )?)
        }
        PinMode::Bus => {
            let role = args
                .string(4)
                .and_then(BusRole::from_name)
                .ok_or(IoError::InvalidBusRole)?;
            PinConfig::Bus(BusConfig { role })
        }
    };
    Ok(config)
}

fn io_mode<N, E, S, W>(io: &mut Io<N, E>, store: &mut S, args: &Args<'_>, out: &mut W) -> Outcome
where
    N: IoBackend,
    E: IoBackend,
    S: ConfigStore,
    W: Write,
{
    if args.string(1).is_none() {
        io.dump(out, DumpFormat::Plain)?;
        return Ok(AppAction::Normal);
    }

    let address = address(io, args)?;
    if args.string(3).is_none() {
        io.dump_pin(out, DumpFormat::Plain, address, None)?;
        return Ok(AppAction::Normal);
    }

    let config = parse_mode(args)?;
    io.stage_config(store, address, &config)?;
    io_info!(
        "io {}/{}: staged mode {}",
        address.backend().as_u8(),
        address.number(),
        config.mode().name()
    );

    io.dump_pin(out, DumpFormat::Plain, address, Some(&config))?;
    writeln!(out, "! io-mode: restart to activate new mode")?;
    Ok(AppAction::Normal)
}

fn io_read<N: IoBackend, E: IoBackend, W: Write>(
    io: &mut Io<N, E>,
    args: &Args<'_>,
    out: &mut W,
) -> Outcome {
    let address = address(io, args)?;
    let value = io.read_pin(address)?;
    writeln!(
        out,
        "io-read: io {}/{}: {}",
        address.backend().as_u8(),
        address.number(),
        value
    )?;
    Ok(AppAction::Normal)
}

fn io_write<N: IoBackend, E: IoBackend, W: Write>(
    io: &mut Io<N, E>,
    args: &Args<'_>,
    out: &mut W,
) -> Outcome {
    let address = address(io, args)?;
    let Some(value) = args.int(3)? else {
        // no value toggles a timer pulse
        let LiveState::Timer { remaining_ms } = io.pin_info(address)?.live else {
            return Err(IoError::Usage.into());
        };
        io.write_pin(address, u32::from(remaining_ms == 0))?;
        return report_write(io, address, out);
    };

    if let Some(max_duty) = args.int(4)? {
        let ramp = PwmConfig::new(value, max_duty, args.int(5)?.unwrap_or(0))?;
        io.set_pwm_ramp(address, ramp)?;
    } else {
        let value = u32::try_from(value).map_err(|_| IoError::OutOfRange(Parameter::Value))?;
        io.write_pin(address, value)?;
    }
    report_write(io, address, out)
}

fn report_write<N: IoBackend, E: IoBackend, W: Write>(
    io: &mut Io<N, E>,
    address: PinAddress,
    out: &mut W,
) -> Outcome {
    let value = io.read_pin(address)?;
    writeln!(
        out,
        "io-write: io {}/{}: {}",
        address.backend().as_u8(),
        address.number(),
        value
    )?;
    Ok(AppAction::Normal)
}

fn io_trigger<N: IoBackend, E: IoBackend, W: Write>(
    io: &mut Io<N, E>,
    args: &Args<'_>,
    out: &mut W,
) -> Outcome {
    let address = address(io, args)?;
    let action = match args.string(3) {
        Some(name) => TriggerAction::from_name(name).ok_or(IoError::InvalidAction)?,
        None => TriggerAction::default(),
    };
    io.trigger_pin(address, action)?;
    writeln!(
        out,
        "io-trigger: io {}/{}: trigger {}",
        address.backend().as_u8(),
        address.number(),
        args.string(3).unwrap_or("on")
    )?;
    Ok(AppAction::Normal)
}

fn io_flag<N, E, S, W>(
    io: &mut Io<N, E>,
    store: &mut S,
    args: &Args<'_>,
    out: &mut W,
    name: &str,
    value: bool,
) -> Outcome
where
    N: IoBackend,
    E: IoBackend,
    S: ConfigStore,
    W: Write,
{
    let address = address(io, args)?;
    let flag = args
        .string(3)
        .ok_or(IoError::Usage)?;
    let flag = PinFlag::from_name(flag).ok_or(IoError::InvalidFlag)?;

    let mut config = io.staged_config(&*store, address);
    config.set_flag(flag, value)?;
    io.stage_config(store, address, &config)?;

    io.dump_pin(out, DumpFormat::Plain, address, Some(&config))?;
    writeln!(out, "! {}: restart to activate new flags", name)?;
    Ok(AppAction::Normal)
}

fn io_dump<N: IoBackend, E: IoBackend, W: Write>(
    io: &Io<N, E>,
    args: &Args<'_>,
    out: &mut W,
) -> Outcome {
    match args.string(1) {
        None | Some("html") => io.dump(out, format_of(args.string(1)))?,
        Some(_) => {
            let address = address(io, args)?;
            io.dump_pin(out, format_of(args.string(3)), address, None)?;
        }
    }
    Ok(AppAction::Normal)
}

fn analog_read<N: IoBackend, E: IoBackend, W: Write>(io: &Io<N, E>, out: &mut W) -> Outcome {
    writeln!(out, "analog-read: value: [{}]", io.analog_value())?;
    Ok(AppAction::Normal)
}

fn pwm_period<N, E, S, W>(io: &mut Io<N, E>, store: &mut S, args: &Args<'_>, out: &mut W) -> Outcome
where
    N: IoBackend,
    E: IoBackend,
    S: ConfigStore,
    W: Write,
{
    if let Some(period) = args.int(1)? {
        let period = u32::try_from(period).map_err(|_| IoError::OutOfRange(Parameter::Period))?;
        io.set_pwm_period(store, period)?;
    }
    writeln!(
        out,
        "pwm-period: {} us",
        crate::config::schema::load_pwm_period(&*store)
    )?;
    Ok(AppAction::Normal)
}

fn indicator_set<N, E, S, W>(
    io: &mut Io<N, E>,
    store: &mut S,
    args: &Args<'_>,
    out: &mut W,
    indicator: Indicator,
) -> Outcome
where
    N: IoBackend,
    E: IoBackend,
    S: ConfigStore,
    W: Write,
{
    if let (Some(backend), Some(pin)) = (args.int(1)?, args.int(2)?) {
        let target = match backend < 0 || pin < 0 {
            true => None,
            false => Some(io.resolve(backend, pin)?),
        };
        io.set_indicator(store, indicator, target)?;
    }

    let label = match indicator {
        Indicator::Status => "status",
        Indicator::Association => "association",
    };
    match io.indicator(indicator) {
        Some(address) => writeln!(
            out,
            "{} trigger at io {}/{}",
            label,
            address.backend().as_u8(),
            address.number()
        )?,
        None => writeln!(out, "{} trigger disabled", label)?,
    }
    Ok(AppAction::Normal)
}

fn help<W: Write>(args: &Args<'_>, out: &mut W) -> Outcome {
    if let Some(name) = args.string(1) {
        let info = find(name).ok_or(IoError::Usage)?;
        writeln!(out, "{}/{}: {}", info.short, info.long, info.help)?;
        return Ok(AppAction::Normal);
    }

    for info in COMMANDS {
        writeln!(out, "{}/{}: {}", info.short, info.long, info.help)?;
    }
    Ok(AppAction::Normal)
}
