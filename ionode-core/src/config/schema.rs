//! Mapping between pin configuration records and store keys
//!
//! Every pin setting lives under an `io.*` path indexed by backend id and
//! pin number. Absent keys fall back to the record defaults; a persisted
//! value that no longer validates loads as [`PinConfig::Disabled`].

use super::mode::{
    BusConfig, BusRole, CounterConfig, InputConfig, OutputConfig, PinConfig, PinMode, PwmConfig,
    TimerConfig, TimerDirection,
};
use super::store::{ConfigStore, Key, StoreError};
use crate::error::IoError;
use ionode_hal::DEFAULT_PERIOD_US;

const MODE: &str = "io.mode";
const PIN_PREFIX: &str = "io.";
const COUNTER_DEBOUNCE: &str = "io.counter.debounce";
const COUNTER_RESET: &str = "io.counter.reset";
const PULLUP: &str = "io.pullup";
const OUTPUT_STARTUP: &str = "io.output.startup";
const TIMER_DIRECTION: &str = "io.timer.direction";
const TIMER_DELAY: &str = "io.timer.delay";
const TIMER_REPEAT: &str = "io.timer.repeat";
const TIMER_AUTOTRIGGER: &str = "io.timer.autotrigger";
const PWM_MIN: &str = "io.pwm.min";
const PWM_MAX: &str = "io.pwm.max";
const PWM_DELAY: &str = "io.pwm.delay";
const BUS_ROLE: &str = "io.bus.role";

const PWM_PERIOD: &str = "pwm.period";

/// Pin that gets triggered on a system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Fired whenever a counter pin registers an edge
    Status,
    /// Fired when a client associates with the node
    Association,
}

impl Indicator {
    const fn keys(self) -> (&'static str, &'static str) {
        match self {
            Self::Status => ("trigger.status.io", "trigger.status.pin"),
            Self::Association => ("trigger.assoc.io", "trigger.assoc.pin"),
        }
    }
}

impl From<StoreError> for IoError {
    fn from(_: StoreError) -> Self {
        IoError::Persistence
    }
}

/// Read one pin's persisted configuration
pub fn load_pin(store: &impl ConfigStore, backend: u8, pin: u8) -> PinConfig {
    let get = |path| store.get_int(&Key::indexed(path, backend, pin));
    let flag = |path, default: bool| get(path).map_or(default, |value| value != 0);

    let mode = get(MODE)
        .and_then(|value| u8::try_from(value).ok())
        .and_then(PinMode::from_u8)
        .unwrap_or(PinMode::Disabled);

    let loaded = match mode {
        PinMode::Disabled => Ok(PinConfig::Disabled),
        PinMode::Input => Ok(PinConfig::Input(InputConfig {
            pullup: flag(PULLUP, false),
        })),
        PinMode::Counter => {
            let defaults = CounterConfig::default();
            let debounce = get(COUNTER_DEBOUNCE).map_or(i64::from(defaults.debounce_ms), i64::from);
            CounterConfig::new(flag(COUNTER_RESET, defaults.reset_on_get), debounce).map(
                |counter| {
                    PinConfig::Counter(CounterConfig {
                        pullup: flag(PULLUP, false),
                        ..counter
                    })
                },
            )
        }
        PinMode::Output => Ok(PinConfig::Output(OutputConfig {
            startup_state: flag(OUTPUT_STARTUP, false),
        })),
        PinMode::Timer => {
            let defaults = TimerConfig::default();
            let direction = match store.get_string(&Key::indexed(TIMER_DIRECTION, backend, pin)) {
                Some(name) => TimerDirection::from_name(name).ok_or(IoError::InvalidDirection),
                None => Ok(defaults.direction),
            };
            direction.and_then(|direction| {
                TimerConfig::new(
                    direction,
                    get(TIMER_DELAY).map_or(i64::from(defaults.delay_ms), i64::from),
                    flag(TIMER_REPEAT, defaults.repeat),
                    flag(TIMER_AUTOTRIGGER, defaults.autotrigger),
                )
                .map(PinConfig::Timer)
            })
        }
        PinMode::Pwm => {
            let defaults = PwmConfig::default();
            PwmConfig::new(
                get(PWM_MIN).map_or(i64::from(defaults.min_duty), i64::from),
                get(PWM_MAX).map_or(i64::from(defaults.max_duty), i64::from),
                get(PWM_DELAY).map_or(i64::from(defaults.delay), i64::from),
            )
            .map(PinConfig::Pwm)
        }
        PinMode::Bus => match store.get_string(&Key::indexed(BUS_ROLE, backend, pin)) {
            Some(name) => BusRole::from_name(name)
                .map(|role| PinConfig::Bus(BusConfig { role }))
                .ok_or(IoError::InvalidBusRole),
            None => Ok(PinConfig::Bus(BusConfig::default())),
        },
    };

    loaded.unwrap_or_else(|_error| {
        io_warn!(
            "io {}/{}: persisted {} config invalid, disabling",
            backend,
            pin,
            mode.name()
        );
        PinConfig::Disabled
    })
}

/// Replace one pin's persisted configuration with `config`
///
/// Writes are staged only; the caller flushes on success and discards on
/// failure.
pub fn stage_pin(
    store: &mut impl ConfigStore,
    backend: u8,
    pin: u8,
    config: &PinConfig,
) -> Result<(), IoError> {
    store.delete(&Key::indexed(PIN_PREFIX, backend, pin), true);

    let mut set_int = |path, value: i32| store.set_int(&Key::indexed(path, backend, pin), value);
    set_int(MODE, i32::from(config.mode().as_u8()))?;

    match config {
        PinConfig::Disabled => {}
        PinConfig::Input(input) => set_int(PULLUP, i32::from(input.pullup))?,
        PinConfig::Counter(counter) => {
            set_int(COUNTER_DEBOUNCE, counter.debounce_ms as i32)?;
            set_int(COUNTER_RESET, i32::from(counter.reset_on_get))?;
            set_int(PULLUP, i32::from(counter.pullup))?;
        }
        PinConfig::Output(output) => set_int(OUTPUT_STARTUP, i32::from(output.startup_state))?,
        PinConfig::Timer(timer) => {
            set_int(TIMER_DELAY, timer.delay_ms as i32)?;
            set_int(TIMER_REPEAT, i32::from(timer.repeat))?;
            set_int(TIMER_AUTOTRIGGER, i32::from(timer.autotrigger))?;
            store.set_string(
                &Key::indexed(TIMER_DIRECTION, backend, pin),
                timer.direction.name(),
            )?;
        }
        PinConfig::Pwm(pwm) => {
            set_int(PWM_MIN, i32::from(pwm.min_duty))?;
            set_int(PWM_MAX, i32::from(pwm.max_duty))?;
            set_int(PWM_DELAY, i32::from(pwm.delay))?;
        }
        PinConfig::Bus(bus) => {
            store.set_string(&Key::indexed(BUS_ROLE, backend, pin), bus.role.name())?;
        }
    }

    Ok(())
}

/// Read an indicator target as raw (backend, pin) numbers
pub fn load_indicator(store: &impl ConfigStore, indicator: Indicator) -> Option<(u8, u8)> {
    let (io_key, pin_key) = indicator.keys();
    let backend = store.get_int(&Key::new(io_key))?;
    let pin = store.get_int(&Key::new(pin_key))?;
    Some((u8::try_from(backend).ok()?, u8::try_from(pin).ok()?))
}

/// Stage an indicator target; `None` disables it
pub fn stage_indicator(
    store: &mut impl ConfigStore,
    indicator: Indicator,
    target: Option<(u8, u8)>,
) -> Result<(), IoError> {
    let (io_key, pin_key) = indicator.keys();
    let (backend, pin) = target.map_or((-1, -1), |(backend, pin)| {
        (i32::from(backend), i32::from(pin))
    });
    store.set_int(&Key::new(io_key), backend)?;
    store.set_int(&Key::new(pin_key), pin)?;
    Ok(())
}

/// Persisted PWM period in microseconds
pub fn load_pwm_period(store: &impl ConfigStore) -> u32 {
    store
        .get_int(&Key::new(PWM_PERIOD))
        .and_then(|period| u32::try_from(period).ok())
        .filter(|period| *period > 0)
        .unwrap_or(DEFAULT_PERIOD_US)
}

pub fn stage_pwm_period(store: &mut impl ConfigStore, period_us: u32) -> Result<(), IoError> {
    let period = i32::try_from(period_us).map_err(|_| IoError::Persistence)?;
    store.set_int(&Key::new(PWM_PERIOD), period)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::MemoryStore;

    #[test]
    fn test_missing_pin_loads_disabled() {
        let store: MemoryStore<16> = MemoryStore::new();
        assert_eq!(load_pin(&store, 0, 4), PinConfig::Disabled);
    }

    #[test]
    fn test_staged_config_loads_back() {
        let mut store: MemoryStore<32> = MemoryStore::new();
        let timer = PinConfig::Timer(TimerConfig {
            direction: TimerDirection::Down,
            delay_ms: 500,
            repeat: true,
            autotrigger: false,
        });
        stage_pin(&mut store, 0, 5, &timer).unwrap();
        assert_eq!(load_pin(&store, 0, 5), timer);

        let bus = PinConfig::Bus(BusConfig {
            role: BusRole::Clock,
        });
        stage_pin(&mut store, 1, 5, &bus).unwrap();
        assert_eq!(load_pin(&store, 1, 5), bus);
        assert_eq!(load_pin(&store, 0, 5), timer);
    }

    #[test]
    fn test_restaging_drops_stale_keys() {
        let mut store: MemoryStore<32> = MemoryStore::new();
        let pwm = PinConfig::Pwm(PwmConfig {
            min_duty: 10,
            max_duty: 20_000,
            delay: 5,
        });
        stage_pin(&mut store, 0, 12, &pwm).unwrap();
        stage_pin(&mut store, 0, 12, &PinConfig::Disabled).unwrap();

        assert_eq!(store.get_int(&Key::indexed(PWM_MIN, 0, 12)), None);
        assert_eq!(load_pin(&store, 0, 12), PinConfig::Disabled);
    }

    #[test]
    fn test_invalid_persisted_value_disables() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        store
            .set_int(&Key::indexed(MODE, 0, 2), i32::from(PinMode::Pwm.as_u8()))
            .unwrap();
        store.set_int(&Key::indexed(PWM_MIN, 0, 2), 70_000).unwrap();
        assert_eq!(load_pin(&store, 0, 2), PinConfig::Disabled);

        store.set_int(&Key::indexed(MODE, 0, 3), 42).unwrap();
        assert_eq!(load_pin(&store, 0, 3), PinConfig::Disabled);
    }

    #[test]
    fn test_indicator_disabled_by_negative_index() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        assert_eq!(load_indicator(&store, Indicator::Status), None);

        stage_indicator(&mut store, Indicator::Status, Some((0, 2))).unwrap();
        assert_eq!(load_indicator(&store, Indicator::Status), Some((0, 2)));
        assert_eq!(load_indicator(&store, Indicator::Association), None);

        stage_indicator(&mut store, Indicator::Status, None).unwrap();
        assert_eq!(load_indicator(&store, Indicator::Status), None);
    }

    #[test]
    fn test_pwm_period_default() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        assert_eq!(load_pwm_period(&store), DEFAULT_PERIOD_US);
        stage_pwm_period(&mut store, 1000).unwrap();
        assert_eq!(load_pwm_period(&store), 1000);
    }
}
