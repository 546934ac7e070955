//! Pin dispatch and periodic scheduler
//!
//! [`Io`] owns every backend, resolves operator `(io, pin)` numbers into
//! validated [`PinAddress`]es, forwards pin operations and runs the fixed
//! 10 ms tick. Mode changes go to the config store only and take effect on
//! the next boot.

use core::fmt::{self, Write};

use ionode_hal::AnalogInput;

use crate::analog::AnalogSampler;
use crate::backend::{BackendId, IoBackend, PinSnapshot, TriggerAction};
use crate::config::{schema, ConfigStore, Indicator, PinConfig, PwmConfig};
use crate::dump::{self, DumpFormat};
use crate::error::{IoError, Parameter};
use crate::registry::PinId;

/// Scheduler tick length
pub const TICK_MS: u32 = 10;

/// Shortest accepted PWM period
pub const MIN_PWM_PERIOD_US: u32 = 100;

/// Longest accepted PWM period
pub const MAX_PWM_PERIOD_US: u32 = 100_000;

/// Validated pin address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAddress {
    backend: BackendId,
    pin: PinId,
    number: u8,
}

impl PinAddress {
    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Operator-visible pin number
    pub fn number(&self) -> u8 {
        self.number
    }
}

/// All pin backends plus the shared scheduler state
pub struct Io<N, E> {
    native: N,
    expander: Option<E>,
    sampler: AnalogSampler,
    status: Option<PinAddress>,
    association: Option<PinAddress>,
}

impl<N: IoBackend, E: IoBackend> Io<N, E> {
    pub fn new(native: N, expander: Option<E>) -> Self {
        Self {
            native,
            expander,
            sampler: AnalogSampler::new(),
            status: None,
            association: None,
        }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn expander(&self) -> Option<&E> {
        self.expander.as_ref()
    }

    pub fn expander_mut(&mut self) -> Option<&mut E> {
        self.expander.as_mut()
    }

    pub fn backend(&self, id: BackendId) -> Option<&dyn IoBackend> {
        match id {
            BackendId::Native => Some(&self.native),
            BackendId::Expander => self
                .expander
                .as_ref()
                .map(|expander| expander as &dyn IoBackend),
        }
    }

    pub fn backend_mut(&mut self, id: BackendId) -> Option<&mut dyn IoBackend> {
        match id {
            BackendId::Native => Some(&mut self.native),
            BackendId::Expander => self
                .expander
                .as_mut()
                .map(|expander| expander as &mut dyn IoBackend),
        }
    }

    /// Turn operator numbers into an address
    pub fn resolve(&self, backend: i64, pin: i64) -> Result<PinAddress, IoError> {
        let id = BackendId::from_index(backend).ok_or(IoError::InvalidBackend)?;
        let driver = self.backend(id).ok_or(IoError::InvalidBackend)?;
        let number = u8::try_from(pin).map_err(|_| IoError::InvalidPin)?;
        let pin = driver.registry().lookup(number).ok_or(IoError::InvalidPin)?;
        Ok(PinAddress {
            backend: id,
            pin,
            number,
        })
    }

    /// Every pin of every present backend, in dump order
    pub fn addresses(&self) -> impl Iterator<Item = PinAddress> + '_ {
        BackendId::ALL
            .into_iter()
            .filter_map(move |id| self.backend(id).map(|backend| (id, *backend.registry())))
            .flat_map(|(id, registry)| {
                registry.iter().map(move |(pin, physical)| PinAddress {
                    backend: id,
                    pin,
                    number: physical.index,
                })
            })
    }

    /// Load persisted pin configs and bring up all backends
    pub fn init(&mut self, store: &impl ConfigStore) -> Result<(), IoError> {
        let period_us = schema::load_pwm_period(store);

        for id in BackendId::ALL {
            let Some(backend) = self.backend_mut(id) else {
                continue;
            };
            let registry = *backend.registry();
            for (pin, physical) in registry.iter() {
                backend.load_config(pin, schema::load_pin(store, id.as_u8(), physical.index));
            }
            // backends without a generator reject the period
            backend.set_pwm_period(period_us).ok();
            backend.init()?;
        }

        self.status = self.load_indicator(store, Indicator::Status);
        self.association = self.load_indicator(store, Indicator::Association);
        io_info!("io: init done, pwm period {} us", period_us);
        Ok(())
    }

    /// Re-read the store-backed live settings: indicator pins and the PWM
    /// period
    pub fn reload_settings(&mut self, store: &impl ConfigStore) {
        self.status = self.load_indicator(store, Indicator::Status);
        self.association = self.load_indicator(store, Indicator::Association);
        if let Err(e) = self.native.set_pwm_period(schema::load_pwm_period(store)) {
            io_warn!("io: pwm period reload failed: {}", e);
        }
    }

    fn load_indicator(&self, store: &impl ConfigStore, indicator: Indicator) -> Option<PinAddress> {
        let (backend, pin) = schema::load_indicator(store, indicator)?;
        match self.resolve(i64::from(backend), i64::from(pin)) {
            Ok(address) => Some(address),
            Err(_) => {
                io_warn!("io: indicator {}/{} does not exist", backend, pin);
                None
            }
        }
    }

    /// Run one scheduler tick
    pub fn periodic(&mut self, analog: &mut impl AnalogInput) {
        if let Some(value) = self.sampler.push(analog.read_raw()) {
            io_debug!("analog: {}", value);
        }

        self.native.periodic(TICK_MS);
        let mut fired = self.native.take_fired();
        if let Some(expander) = self.expander.as_mut() {
            expander.periodic(TICK_MS);
            fired |= expander.take_fired();
        }

        if fired {
            self.trigger_status();
        }
    }

    /// Last published analog reading
    pub fn analog_value(&self) -> u32 {
        self.sampler.value()
    }

    fn driver(&mut self, address: PinAddress) -> Result<&mut dyn IoBackend, IoError> {
        self.backend_mut(address.backend)
            .ok_or(IoError::InvalidBackend)
    }

    pub fn pin_info(&self, address: PinAddress) -> Result<PinSnapshot, IoError> {
        self.backend(address.backend)
            .map(|backend| backend.pin_info(address.pin))
            .ok_or(IoError::InvalidBackend)
    }

    pub fn read_pin(&mut self, address: PinAddress) -> Result<u32, IoError> {
        self.driver(address)?.read_pin(address.pin)
    }

    pub fn write_pin(&mut self, address: PinAddress, value: u32) -> Result<(), IoError> {
        self.driver(address)?.write_pin(address.pin, value)
    }

    pub fn trigger_pin(&mut self, address: PinAddress, action: TriggerAction) -> Result<(), IoError> {
        self.driver(address)?.trigger_pin(address.pin, action)
    }

    pub fn set_pwm_ramp(&mut self, address: PinAddress, ramp: PwmConfig) -> Result<(), IoError> {
        self.driver(address)?.set_pwm_ramp(address.pin, ramp)
    }

    /// Fire a pin the way indicator collaborators do
    pub fn trigger(&mut self, address: PinAddress) -> bool {
        self.trigger_pin(address, TriggerAction::On).is_ok()
    }

    /// Fire the status indicator pin, if one is set
    pub fn trigger_status(&mut self) -> bool {
        match self.status {
            Some(address) => self.trigger(address),
            None => false,
        }
    }

    /// Fire the association indicator pin, if one is set
    pub fn trigger_association(&mut self) -> bool {
        match self.association {
            Some(address) => self.trigger(address),
            None => false,
        }
    }

    pub fn indicator(&self, indicator: Indicator) -> Option<PinAddress> {
        match indicator {
            Indicator::Status => self.status,
            Indicator::Association => self.association,
        }
    }

    /// Config a pin will boot with
    pub fn staged_config(&self, store: &impl ConfigStore, address: PinAddress) -> PinConfig {
        schema::load_pin(store, address.backend.as_u8(), address.number)
    }

    /// Persist a new pin config; it becomes active after a restart
    ///
    /// On failure nothing is persisted and the live state is untouched.
    pub fn stage_config(
        &self,
        store: &mut impl ConfigStore,
        address: PinAddress,
        config: &PinConfig,
    ) -> Result<(), IoError> {
        let backend = self
            .backend(address.backend)
            .ok_or(IoError::InvalidBackend)?;
        if !backend.supports(address.pin, config.mode()) {
            return Err(IoError::Unsupported(config.mode()));
        }

        commit(store, |store| {
            schema::stage_pin(store, address.backend.as_u8(), address.number, config)
        })
    }

    /// Persist and activate an indicator pin; `None` disables it
    pub fn set_indicator(
        &mut self,
        store: &mut impl ConfigStore,
        indicator: Indicator,
        address: Option<PinAddress>,
    ) -> Result<(), IoError> {
        let target = address.map(|address| (address.backend.as_u8(), address.number));
        commit(store, |store| schema::stage_indicator(store, indicator, target))?;
        match indicator {
            Indicator::Status => self.status = address,
            Indicator::Association => self.association = address,
        }
        Ok(())
    }

    /// Change and persist the PWM period
    pub fn set_pwm_period(
        &mut self,
        store: &mut impl ConfigStore,
        period_us: u32,
    ) -> Result<(), IoError> {
        if !(MIN_PWM_PERIOD_US..=MAX_PWM_PERIOD_US).contains(&period_us) {
            return Err(IoError::OutOfRange(Parameter::Period));
        }
        self.native.set_pwm_period(period_us)?;
        commit(store, |store| schema::stage_pwm_period(store, period_us))
    }

    /// Full dump of every pin
    pub fn dump<W: Write>(&self, out: &mut W, format: DumpFormat) -> fmt::Result {
        dump::write_header(out, format)?;
        for address in self.addresses() {
            if let Ok(snapshot) = self.pin_info(address) {
                dump::write_pin(out, format, address.backend, &snapshot)?;
            }
        }
        dump::write_footer(out, format)
    }

    /// Dump of one pin, optionally showing a staged config in place of the
    /// active one
    pub fn dump_pin<W: Write>(
        &self,
        out: &mut W,
        format: DumpFormat,
        address: PinAddress,
        staged: Option<&PinConfig>,
    ) -> fmt::Result {
        let Ok(mut snapshot) = self.pin_info(address) else {
            return Ok(());
        };
        if let Some(staged) = staged {
            snapshot.config = *staged;
        }
        dump::write_header(out, format)?;
        dump::write_pin(out, format, address.backend, &snapshot)?;
        dump::write_footer(out, format)
    }
}

/// Stage writes and flush them, discarding everything on failure
fn commit<S: ConfigStore>(
    store: &mut S,
    stage: impl FnOnce(&mut S) -> Result<(), IoError>,
) -> Result<(), IoError> {
    let result = stage(&mut *store).and_then(|()| store.flush().map_err(IoError::from));
    if result.is_err() {
        store.discard();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::expander::DEFAULT_ADDRESS;
    use crate::backend::native::MAX_NATIVE_PINS;
    use crate::backend::{NativeBackend, Pcf8574};
    use crate::config::{
        CounterConfig, Key, MemoryStore, OutputConfig, PinMode, TimerConfig, TimerDirection,
    };
    use crate::edge::EdgeMailbox;
    use crate::mock::{FailingStore, MockAnalog, MockI2c, MockPort, MockPwm, BOARD};
    use crate::registry::PinRegistry;

    type TestIo<'m> = Io<NativeBackend<'m, MockPort, MockPwm>, Pcf8574<MockI2c>>;

    fn io<'m>(mailbox: &'m EdgeMailbox, store: &impl ConfigStore) -> TestIo<'m> {
        let registry = PinRegistry::new(&BOARD, MAX_NATIVE_PINS).unwrap();
        let native =
            NativeBackend::new(registry, MockPort::default(), MockPwm::new(4), mailbox).unwrap();
        let expander = Pcf8574::new(MockI2c::present(), DEFAULT_ADDRESS).unwrap();
        let mut io = Io::new(native, Some(expander));
        io.init(store).unwrap();
        io
    }

    fn stage(store: &mut MemoryStore<128>, backend: u8, pin: u8, config: PinConfig) {
        schema::stage_pin(store, backend, pin, &config).unwrap();
        store.flush().unwrap();
    }

    #[test]
    fn test_resolve_validates_both_indices() {
        let mailbox = EdgeMailbox::new();
        let io = io(&mailbox, &MemoryStore::<128>::new());

        assert_eq!(io.resolve(0, 4).unwrap().number(), 4);
        assert_eq!(io.resolve(1, 7).unwrap().backend(), BackendId::Expander);
        assert_eq!(io.resolve(2, 0), Err(IoError::InvalidBackend));
        assert_eq!(io.resolve(0, 6), Err(IoError::InvalidPin));
        assert_eq!(io.resolve(0, -1), Err(IoError::InvalidPin));
        assert_eq!(io.resolve(1, 8), Err(IoError::InvalidPin));
        assert_eq!(io.addresses().count(), BOARD.len() + 8);
    }

    #[test]
    fn test_timer_up_500_repeat_autotrigger() {
        let mut store = MemoryStore::<128>::new();
        let timer = TimerConfig::new(TimerDirection::Up, 500, true, true).unwrap();
        stage(&mut store, 0, 4, PinConfig::Timer(timer));

        let mailbox = EdgeMailbox::new();
        let mut io = io(&mailbox, &store);
        let mut analog = MockAnalog::default();
        let high = |io: &TestIo<'_>| io.native().port().is_high(4);

        assert!(high(&io));
        for _ in 0..49 {
            io.periodic(&mut analog);
        }
        assert!(high(&io));
        io.periodic(&mut analog);
        assert!(!high(&io));
        for _ in 0..49 {
            io.periodic(&mut analog);
        }
        assert!(!high(&io));
        io.periodic(&mut analog);
        assert!(high(&io));
    }

    #[test]
    fn test_counter_edge_fires_status_indicator() {
        let mut store = MemoryStore::<128>::new();
        stage(
            &mut store,
            0,
            4,
            PinConfig::Counter(CounterConfig::new(false, 0).unwrap()),
        );
        stage(&mut store, 0, 5, PinConfig::Output(OutputConfig::default()));
        schema::stage_indicator(&mut store, Indicator::Status, Some((0, 5))).unwrap();
        store.flush().unwrap();

        let mailbox = EdgeMailbox::new();
        let mut io = io(&mailbox, &store);
        let mut analog = MockAnalog::default();
        assert!(!io.native().port().is_high(5));

        io.periodic(&mut analog);
        assert!(!io.native().port().is_high(5));

        mailbox.post(1 << 4);
        io.periodic(&mut analog);
        assert!(io.native().port().is_high(5));
        let counter = io.resolve(0, 4).unwrap();
        assert_eq!(io.read_pin(counter), Ok(1));
    }

    #[test]
    fn test_analog_reading_published_every_256_ticks() {
        let mailbox = EdgeMailbox::new();
        let mut io = io(&mailbox, &MemoryStore::<128>::new());
        let mut analog = MockAnalog { raw: 512 };

        for _ in 0..255 {
            io.periodic(&mut analog);
        }
        assert_eq!(io.analog_value(), 0);
        io.periodic(&mut analog);
        assert_eq!(io.analog_value(), 512);
    }

    #[test]
    fn test_staged_mode_waits_for_restart() {
        let mailbox = EdgeMailbox::new();
        let mut store = MemoryStore::<128>::new();
        let io = io(&mailbox, &store);
        let address = io.resolve(0, 2).unwrap();
        let output = PinConfig::Output(OutputConfig {
            startup_state: true,
        });

        io.stage_config(&mut store, address, &output).unwrap();
        assert_eq!(io.staged_config(&store, address), output);
        assert_eq!(io.pin_info(address).unwrap().config, PinConfig::Disabled);

        let restarted = self::io(&mailbox, &store);
        assert_eq!(restarted.pin_info(address).unwrap().config, output);
        assert!(restarted.native().port().is_high(2));
    }

    #[test]
    fn test_stage_rejects_unsupported_mode() {
        let mailbox = EdgeMailbox::new();
        let mut store = MemoryStore::<128>::new();
        let io = io(&mailbox, &store);

        let expander_pin = io.resolve(1, 0).unwrap();
        let counter = PinConfig::Counter(CounterConfig::default());
        assert_eq!(
            io.stage_config(&mut store, expander_pin, &counter),
            Err(IoError::Unsupported(PinMode::Counter))
        );
        let special = io.resolve(0, 16).unwrap();
        assert_eq!(
            io.stage_config(&mut store, special, &counter),
            Err(IoError::Unsupported(PinMode::Counter))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_persistence_failure_discards_staged_writes() {
        let mailbox = EdgeMailbox::new();
        let mut store = FailingStore {
            fail_flush: true,
            ..FailingStore::default()
        };
        let io = io(&mailbox, &store);
        let address = io.resolve(0, 2).unwrap();

        assert_eq!(
            io.stage_config(&mut store, address, &PinConfig::for_mode(PinMode::Input)),
            Err(IoError::Persistence)
        );
        assert_eq!(store.get_int(&Key::indexed("io.mode", 0, 2)), None);
    }

    #[test]
    fn test_indicator_and_period_updates() {
        let mailbox = EdgeMailbox::new();
        let mut store = MemoryStore::<128>::new();
        stage(&mut store, 1, 3, PinConfig::Output(OutputConfig::default()));
        let mut io = io(&mailbox, &store);

        assert!(!io.trigger_association());
        let target = io.resolve(1, 3).unwrap();
        io.set_indicator(&mut store, Indicator::Association, Some(target))
            .unwrap();
        assert!(io.trigger_association());
        assert_eq!(io.read_pin(target), Ok(1));

        assert_eq!(
            io.set_pwm_period(&mut store, 50),
            Err(IoError::OutOfRange(Parameter::Period))
        );
        io.set_pwm_period(&mut store, 2000).unwrap();
        assert_eq!(io.native().pwm().period_us, 2000);
        assert_eq!(schema::load_pwm_period(&store), 2000);
    }

    #[test]
    fn test_dump_is_idempotent() {
        let mut store = MemoryStore::<128>::new();
        stage(
            &mut store,
            0,
            12,
            PinConfig::Pwm(PwmConfig::new(100, 4000, 1).unwrap()),
        );
        stage(&mut store, 0, 4, PinConfig::Counter(CounterConfig::default()));
        let mailbox = EdgeMailbox::new();
        let io = io(&mailbox, &store);

        for format in [DumpFormat::Plain, DumpFormat::Markup] {
            let mut first = String::new();
            let mut second = String::new();
            io.dump(&mut first, format).unwrap();
            io.dump(&mut second, format).unwrap();
            assert_eq!(first, second);
        }

        let mut plain = String::new();
        io.dump(&mut plain, DumpFormat::Plain).unwrap();
        // the active pwm pin spans three lines
        assert_eq!(plain.lines().count(), BOARD.len() + 8 + 2);
        assert!(plain.contains("io: 1, pin: 7, name: p7, mode: disabled, state: on"));
    }
}
