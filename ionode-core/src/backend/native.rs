//! On-chip pin backend
//!
//! Drives the chip's own pads through a [`PinPort`] and a [`PwmGenerator`].
//! Counter edges arrive through an [`EdgeMailbox`] that the interrupt side
//! posts into.

use heapless::Vec;
use ionode_hal::{PhysicalPin, PinDirection, PinPort, PwmChannelSetup, PwmGenerator};
use ionode_hal::{DEFAULT_PERIOD_US, MAX_DUTY};

use super::{
    mode_error, BackendInfo, IoBackend, LiveState, PinSnapshot, PwmLive, TriggerAction,
};
use crate::config::{CounterConfig, PinConfig, PinMode, PwmConfig};
use crate::edge::EdgeMailbox;
use crate::error::{IoError, Parameter};
use crate::modes::{ModeTrait, ModeTraits};
use crate::registry::{PinId, PinRegistry, PinSlots};
use crate::runtime::{count_down, CounterState, PinRuntime, PinSlot};

/// Slot capacity (one per port bit)
pub const MAX_NATIVE_PINS: usize = 32;

/// Most PWM channels any generator provides
pub const MAX_PWM_CHANNELS: usize = 8;

/// Backend for the chip's own pins
pub struct NativeBackend<'m, P, W> {
    registry: PinRegistry,
    slots: PinSlots<PinSlot, MAX_NATIVE_PINS>,
    modes: ModeTraits<NativeBackend<'m, P, W>>,
    port: P,
    pwm: W,
    mailbox: &'m EdgeMailbox,
    pwm_active: bool,
    period_us: u32,
}

/// Fold pending mailbox edges into the counter
fn absorb_edges<P: PinPort>(
    mailbox: &EdgeMailbox,
    port: &mut P,
    pin: &PhysicalPin,
    counter: &CounterConfig,
    state: &mut CounterState,
) {
    let edges = mailbox.take(pin.index);
    if edges == 0 {
        return;
    }
    state.count = state.count.wrapping_add(edges);
    state.debounce_ms = counter.debounce_ms;
    if counter.debounce_ms == 0 {
        port.arm_edge(pin);
    }
}

impl<'m, P: PinPort, W: PwmGenerator> NativeBackend<'m, P, W> {
    pub fn new(
        registry: PinRegistry,
        port: P,
        pwm: W,
        mailbox: &'m EdgeMailbox,
    ) -> Result<Self, IoError> {
        let modes = ModeTraits::build(&[
            ModeTrait::new(PinMode::Disabled, Self::init_disabled),
            ModeTrait::new(PinMode::Input, Self::init_input),
            ModeTrait::new(PinMode::Counter, Self::init_counter),
            ModeTrait::new(PinMode::Output, Self::init_output),
            ModeTrait::new(PinMode::Timer, Self::init_timer),
            ModeTrait::new(PinMode::Pwm, Self::init_pwm),
            ModeTrait::new(PinMode::Bus, Self::init_bus),
        ])?;

        Ok(Self {
            slots: PinSlots::new(&registry, |_| PinSlot::default()),
            registry,
            modes,
            port,
            pwm,
            mailbox,
            pwm_active: false,
            period_us: DEFAULT_PERIOD_US,
        })
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn pwm(&self) -> &W {
        &self.pwm
    }

    fn init_disabled(&mut self, _id: PinId) -> Result<(), IoError> {
        Ok(())
    }

    fn init_input(&mut self, id: PinId) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let pullup = match self.slots.get(id).config() {
            PinConfig::Input(input) => input.pullup,
            _ => false,
        };
        self.port.set_direction(pin, PinDirection::Input);
        self.port.set_pullup(pin, pullup);
        Ok(())
    }

    fn init_counter(&mut self, id: PinId) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let slot = self.slots.get_mut(id);
        let pullup = match slot.config() {
            PinConfig::Counter(counter) => counter.pullup,
            _ => false,
        };
        slot.reset();
        self.mailbox.take(pin.index);

        self.port.set_direction(pin, PinDirection::Input);
        self.port.set_pullup(pin, pullup);
        self.port.arm_edge(pin);
        Ok(())
    }

    fn init_output(&mut self, id: PinId) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let startup = match self.slots.get(id).config() {
            PinConfig::Output(output) => output.startup_state,
            _ => false,
        };
        self.port.set_direction(pin, PinDirection::Output);
        self.port.set_level(pin, startup);
        Ok(())
    }

    fn init_timer(&mut self, id: PinId) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let slot = self.slots.get_mut(id);
        let PinConfig::Timer(timer) = *slot.config() else {
            return Err(mode_error(slot.mode()));
        };
        slot.reset();

        self.port.set_direction(pin, PinDirection::Output);
        self.port.set_level(pin, timer.direction.idle_level());
        if timer.autotrigger {
            self.run_timer(id, true)?;
        }
        Ok(())
    }

    fn init_pwm(&mut self, id: PinId) -> Result<(), IoError> {
        self.slots.get_mut(id).reset();
        Ok(())
    }

    fn init_bus(&mut self, id: PinId) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        self.port.set_open_drain(pin);
        self.port.set_direction(pin, PinDirection::Output);
        self.port.set_level(pin, true);
        Ok(())
    }

    /// Start (`running`) or stop a timer pulse
    fn run_timer(&mut self, id: PinId, running: bool) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let slot = self.slots.get_mut(id);
        let mode = slot.mode();
        let (PinConfig::Timer(timer), PinRuntime::Timer(state)) = slot.parts_mut() else {
            return Err(mode_error(mode));
        };

        let (level, remaining_ms) = match running {
            true => (timer.direction.active_level(), timer.delay_ms),
            false => (timer.direction.idle_level(), 0),
        };
        state.remaining_ms = remaining_ms;
        self.port.set_level(pin, level);
        Ok(())
    }

    fn pwm_channel(&self, id: PinId) -> Result<u8, IoError> {
        match self.slots.get(id).runtime() {
            PinRuntime::Pwm(state) => state.channel.ok_or(IoError::NoPwmChannel),
            _ => Err(mode_error(self.slots.get(id).mode())),
        }
    }

    fn apply_duty(&mut self, channel: u8, duty: u16) {
        self.pwm.set_duty(channel, duty);
        self.pwm.start();
    }
}

impl<P: PinPort, W: PwmGenerator> IoBackend for NativeBackend<'_, P, W> {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "native",
            pins: self.registry.len(),
            detected: true,
        }
    }

    fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    fn supports(&self, id: PinId, mode: PinMode) -> bool {
        !self.registry.get(id).special
            || matches!(
                mode,
                PinMode::Disabled | PinMode::Input | PinMode::Output | PinMode::Timer
            )
    }

    fn load_config(&mut self, id: PinId, config: PinConfig) {
        let config = match self.supports(id, config.mode()) {
            true => config,
            false => {
                io_warn!(
                    "{}: mode {} not possible, disabling",
                    self.registry.get(id).name,
                    config.mode().name()
                );
                PinConfig::Disabled
            }
        };
        *self.slots.get_mut(id) = PinSlot::new(config);
    }

    fn init(&mut self) -> Result<(), IoError> {
        let budget = usize::from(self.pwm.channel_budget()).min(MAX_PWM_CHANNELS);
        let mut channels: Vec<PwmChannelSetup<'static>, MAX_PWM_CHANNELS> = Vec::new();
        let mut counter_mask = 0;

        for (id, pin) in self.registry.iter() {
            let slot = self.slots.get_mut(id);
            if slot.mode() != PinMode::Disabled && !pin.special {
                self.port.select_function(pin);
            }

            match slot.parts_mut() {
                (PinConfig::Counter(_), _) => counter_mask |= pin.mask(),
                (PinConfig::Pwm(pwm), PinRuntime::Pwm(state)) => {
                    let setup = PwmChannelSetup {
                        pin,
                        duty: pwm.min_duty,
                    };
                    let channel = channels.len() as u8;
                    if channels.len() < budget && channels.push(setup).is_ok() {
                        state.channel = Some(channel);
                    } else {
                        io_warn!("{}: no pwm channel left", pin.name);
                    }
                }
                (PinConfig::Bus(bus), _) => {
                    io_info!("{}: reserved for bus {}", pin.name, bus.role.name());
                }
                _ => {}
            }
        }

        self.mailbox.set_counter_mask(counter_mask);
        if !channels.is_empty() {
            self.pwm.init(self.period_us, &channels);
            self.pwm_active = true;
        }

        for id in self.registry.ids() {
            if let Err(error) = self.init_pin_mode(id) {
                io_warn!("{}: init failed: {}", self.registry.get(id).name, error);
            }
        }
        self.mailbox.take_fired();

        io_debug!(
            "native: {} pins, {} pwm channels",
            self.registry.len(),
            channels.len()
        );
        Ok(())
    }

    fn periodic(&mut self, tick_ms: u32) {
        let mut pwm_changed = false;

        for (id, pin) in self.registry.iter() {
            match self.slots.get_mut(id).parts_mut() {
                (PinConfig::Counter(counter), PinRuntime::Counter(state)) => {
                    absorb_edges(self.mailbox, &mut self.port, pin, counter, state);
                    if count_down(&mut state.debounce_ms, tick_ms) {
                        self.port.arm_edge(pin);
                    }
                }
                (PinConfig::Timer(timer), PinRuntime::Timer(state)) => {
                    if count_down(&mut state.remaining_ms, tick_ms) {
                        let level = self.port.level(pin);
                        self.port.set_level(pin, !level);
                        if timer.repeat {
                            state.remaining_ms = timer.delay_ms;
                        }
                    }
                }
                (PinConfig::Pwm(_), PinRuntime::Pwm(state)) => {
                    if let Some(channel) = state.channel {
                        if state.ramp.tick() {
                            let duty = state.ramp.step(self.pwm.duty(channel));
                            self.pwm.set_duty(channel, duty);
                            pwm_changed = true;
                        }
                    }
                }
                _ => {}
            }
        }

        if pwm_changed {
            self.pwm.start();
        }
    }

    fn init_pin_mode(&mut self, id: PinId) -> Result<(), IoError> {
        let init = self.modes.get(self.slots.get(id).mode())?;
        init(self, id)
    }

    fn pin_info(&self, id: PinId) -> PinSnapshot {
        let pin = self.registry.get(id);
        let slot = self.slots.get(id);

        let live = match slot.runtime() {
            PinRuntime::Idle => LiveState::None,
            PinRuntime::Counter(state) => LiveState::Counter {
                count: state.count,
                debounce_ms: state.debounce_ms,
            },
            PinRuntime::Timer(state) => LiveState::Timer {
                remaining_ms: state.remaining_ms,
            },
            PinRuntime::Pwm(state) => LiveState::Pwm(state.channel.map(|channel| PwmLive {
                channel,
                frequency_hz: self.pwm.frequency_hz(),
                duty: self.pwm.duty(channel),
                ramp: PwmConfig {
                    min_duty: state.ramp.min(),
                    max_duty: state.ramp.max(),
                    delay: state.ramp.delay(),
                },
                direction: state.ramp.direction(),
            })),
        };

        PinSnapshot {
            pin: pin.index,
            name: pin.name,
            config: *slot.config(),
            level: Some(self.port.level(pin)),
            live,
        }
    }

    fn read_pin(&mut self, id: PinId) -> Result<u32, IoError> {
        let pin = self.registry.get(id);
        let mode = self.slots.get(id).mode();

        match mode {
            PinMode::Input | PinMode::Output | PinMode::Timer => {
                Ok(u32::from(self.port.level(pin)))
            }
            PinMode::Counter => {
                let (PinConfig::Counter(counter), PinRuntime::Counter(state)) =
                    self.slots.get_mut(id).parts_mut()
                else {
                    return Err(mode_error(mode));
                };
                absorb_edges(self.mailbox, &mut self.port, pin, counter, state);

                let count = state.count;
                if counter.reset_on_get {
                    state.count = 0;
                }
                if state.debounce_ms > 0 {
                    state.debounce_ms = 0;
                    self.port.arm_edge(pin);
                }
                Ok(count)
            }
            PinMode::Pwm => {
                let channel = self.pwm_channel(id)?;
                Ok(u32::from(self.pwm.duty(channel)))
            }
            PinMode::Disabled | PinMode::Bus => Err(mode_error(mode)),
        }
    }

    fn write_pin(&mut self, id: PinId, value: u32) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let mode = self.slots.get(id).mode();

        match mode {
            PinMode::Output => {
                self.port.set_level(pin, value != 0);
                Ok(())
            }
            PinMode::Timer => self.run_timer(id, value != 0),
            PinMode::Counter => {
                if let (_, PinRuntime::Counter(state)) = self.slots.get_mut(id).parts_mut() {
                    state.count = value;
                }
                Ok(())
            }
            PinMode::Pwm => {
                let duty =
                    u16::try_from(value).map_err(|_| IoError::OutOfRange(Parameter::Duty))?;
                let channel = self.pwm_channel(id)?;
                self.apply_duty(channel, duty);
                Ok(())
            }
            PinMode::Disabled | PinMode::Input | PinMode::Bus => Err(mode_error(mode)),
        }
    }

    fn trigger_pin(&mut self, id: PinId, action: TriggerAction) -> Result<(), IoError> {
        let pin = self.registry.get(id);
        let mode = self.slots.get(id).mode();

        match (mode, action) {
            (PinMode::Output, TriggerAction::On | TriggerAction::Off) => {
                self.port.set_level(pin, action == TriggerAction::On);
                Ok(())
            }
            (PinMode::Timer, TriggerAction::On | TriggerAction::Off) => {
                self.run_timer(id, action == TriggerAction::On)
            }
            (PinMode::Pwm, TriggerAction::On) => {
                let channel = self.pwm_channel(id)?;
                self.apply_duty(channel, MAX_DUTY);
                Ok(())
            }
            (PinMode::Pwm, TriggerAction::Off) => {
                let channel = self.pwm_channel(id)?;
                let min = match self.slots.get(id).runtime() {
                    PinRuntime::Pwm(state) => state.ramp.min(),
                    _ => 0,
                };
                self.apply_duty(channel, min);
                Ok(())
            }
            (PinMode::Pwm, TriggerAction::Up | TriggerAction::Down) => {
                self.pwm_channel(id)?;
                if let (_, PinRuntime::Pwm(state)) = self.slots.get_mut(id).parts_mut() {
                    if let Some(direction) = action.ramp_direction() {
                        state.ramp.set_direction(direction);
                    }
                }
                Ok(())
            }
            (mode, _) => Err(mode_error(mode)),
        }
    }

    fn set_pwm_ramp(&mut self, id: PinId, ramp: PwmConfig) -> Result<(), IoError> {
        let channel = self.pwm_channel(id)?;
        if let (_, PinRuntime::Pwm(state)) = self.slots.get_mut(id).parts_mut() {
            state.ramp.restart(&ramp);
        }
        self.apply_duty(channel, ramp.min_duty);
        Ok(())
    }

    fn set_pwm_period(&mut self, period_us: u32) -> Result<(), IoError> {
        if period_us == 0 {
            return Err(IoError::OutOfRange(Parameter::Period));
        }
        self.period_us = period_us;
        self.pwm.set_period_us(period_us);
        if self.pwm_active {
            self.pwm.start();
        }
        Ok(())
    }

    fn take_fired(&mut self) -> bool {
        self.mailbox.take_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BusConfig, BusRole, InputConfig, OutputConfig, TimerConfig, TimerDirection,
    };
    use crate::mock::{MockPort, MockPwm, BOARD};

    type Backend<'m> = NativeBackend<'m, MockPort, MockPwm>;

    fn backend<'m>(mailbox: &'m EdgeMailbox, budget: u8, configs: &[(u8, PinConfig)]) -> Backend<'m> {
        let registry = PinRegistry::new(&BOARD, MAX_NATIVE_PINS).unwrap();
        let mut backend =
            NativeBackend::new(registry, MockPort::default(), MockPwm::new(budget), mailbox)
                .unwrap();
        for (index, config) in configs {
            let id = backend.registry().lookup(*index).unwrap();
            backend.load_config(id, *config);
        }
        backend.init().unwrap();
        backend
    }

    fn id(backend: &Backend<'_>, index: u8) -> PinId {
        backend.registry().lookup(index).unwrap()
    }

    /// What the edge task does on an interrupt
    fn edge(backend: &mut Backend<'_>, mailbox: &EdgeMailbox, index: u8) {
        let counted = mailbox.post(1 << index);
        if counted != 0 {
            let pin = backend.registry().get(id(backend, index));
            backend.port_mut().disarm_edge(pin);
        }
    }

    fn counter(debounce_ms: u32, reset_on_get: bool) -> PinConfig {
        PinConfig::Counter(CounterConfig {
            debounce_ms,
            reset_on_get,
            pullup: true,
        })
    }

    fn pwm(min: u16, max: u16, delay: u8) -> PinConfig {
        PinConfig::Pwm(PwmConfig {
            min_duty: min,
            max_duty: max,
            delay,
        })
    }

    #[test]
    fn test_init_routes_and_configures_pins() {
        let mailbox = EdgeMailbox::new();
        let backend = backend(
            &mailbox,
            4,
            &[
                (0, PinConfig::Input(InputConfig { pullup: true })),
                (2, PinConfig::Output(OutputConfig { startup_state: true })),
                (4, counter(50, false)),
                (5, PinConfig::Bus(BusConfig { role: BusRole::Clock })),
                (16, PinConfig::Output(OutputConfig::default())),
            ],
        );
        let port = backend.port();

        assert_eq!(port.selected, (1 << 0) | (1 << 2) | (1 << 4) | (1 << 5));
        assert_eq!(port.pullups, (1 << 0) | (1 << 4));
        assert_eq!(port.outputs, (1 << 2) | (1 << 5) | (1 << 16));
        assert!(port.is_high(2));
        assert!(port.is_armed(4));
        assert_eq!(port.open_drain, 1 << 5);
        assert!(port.is_high(5));
        assert_eq!(mailbox.counter_mask(), 1 << 4);
    }

    #[test]
    fn test_special_pin_rejects_counter() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(&mailbox, 4, &[(16, counter(0, false))]);
        let special = id(&backend, 16);

        assert_eq!(backend.pin_info(special).config, PinConfig::Disabled);
        assert!(!backend.supports(special, PinMode::Pwm));
        assert!(backend.supports(special, PinMode::Output));
        assert_eq!(backend.read_pin(special), Err(IoError::Disabled));
    }

    #[test]
    fn test_counter_rearms_after_debounce() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(&mailbox, 4, &[(4, counter(30, false))]);
        let pin = id(&backend, 4);

        edge(&mut backend, &mailbox, 4);
        assert!(!backend.port().is_armed(4));

        backend.periodic(10);
        backend.periodic(10);
        assert!(!backend.port().is_armed(4));
        backend.periodic(10);
        assert!(backend.port().is_armed(4));
        assert_eq!(backend.port().arm_calls[4], 2);

        assert_eq!(backend.read_pin(pin), Ok(1));
        assert!(backend.take_fired());
    }

    #[test]
    fn test_counter_read_resets_and_clears_debounce() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(&mailbox, 4, &[(4, counter(500, true))]);
        let pin = id(&backend, 4);

        edge(&mut backend, &mailbox, 4);
        assert_eq!(backend.read_pin(pin), Ok(1));
        assert!(backend.port().is_armed(4));
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Counter {
                count: 0,
                debounce_ms: 0
            }
        );

        backend.write_pin(pin, 41).unwrap();
        edge(&mut backend, &mailbox, 4);
        assert_eq!(backend.read_pin(pin), Ok(42));
    }

    #[test]
    fn test_timer_single_shot_and_repeat() {
        let mailbox = EdgeMailbox::new();
        let single = PinConfig::Timer(TimerConfig {
            direction: TimerDirection::Down,
            delay_ms: 30,
            repeat: false,
            autotrigger: false,
        });
        let mut backend = backend(&mailbox, 4, &[(12, single)]);
        let pin = id(&backend, 12);
        assert!(backend.port().is_high(12));

        backend.trigger_pin(pin, TriggerAction::On).unwrap();
        assert!(!backend.port().is_high(12));
        for _ in 0..3 {
            backend.periodic(10);
        }
        assert!(backend.port().is_high(12));
        for _ in 0..10 {
            backend.periodic(10);
        }
        assert!(backend.port().is_high(12));

        let repeating = PinConfig::Timer(TimerConfig {
            direction: TimerDirection::Up,
            delay_ms: 20,
            repeat: true,
            autotrigger: true,
        });
        let mut backend = self::backend(&mailbox, 4, &[(12, repeating)]);
        let mut levels = std::vec::Vec::new();
        for _ in 0..8 {
            backend.periodic(10);
            levels.push(backend.port().is_high(12));
        }
        assert_eq!(levels, [true, false, false, true, true, false, false, true]);
    }

    #[test]
    fn test_timer_trigger_loads_and_restarts_delay() {
        let mailbox = EdgeMailbox::new();
        let single = PinConfig::Timer(TimerConfig {
            direction: TimerDirection::Down,
            delay_ms: 30,
            repeat: false,
            autotrigger: false,
        });
        let mut backend = backend(&mailbox, 4, &[(12, single)]);
        let pin = id(&backend, 12);
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Timer { remaining_ms: 0 }
        );

        backend.trigger_pin(pin, TriggerAction::On).unwrap();
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Timer { remaining_ms: 30 }
        );

        backend.periodic(10);
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Timer { remaining_ms: 20 }
        );

        backend.trigger_pin(pin, TriggerAction::On).unwrap();
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Timer { remaining_ms: 30 }
        );
        assert!(!backend.port().is_high(12));
    }

    #[test]
    fn test_timer_off_returns_to_idle() {
        let mailbox = EdgeMailbox::new();
        let timer = PinConfig::Timer(TimerConfig {
            direction: TimerDirection::Up,
            delay_ms: 100,
            repeat: true,
            autotrigger: true,
        });
        let mut backend = backend(&mailbox, 4, &[(13, timer)]);
        let pin = id(&backend, 13);
        assert!(backend.port().is_high(13));

        backend.write_pin(pin, 0).unwrap();
        assert!(!backend.port().is_high(13));
        assert_eq!(
            backend.pin_info(pin).live,
            LiveState::Timer { remaining_ms: 0 }
        );
    }

    #[test]
    fn test_pwm_channels_assigned_in_pin_order() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(
            &mailbox,
            2,
            &[(5, pwm(300, 1000, 0)), (2, pwm(200, 1000, 0)), (4, pwm(100, 1000, 0))],
        );

        assert_eq!(backend.pwm().bound, [2, 4]);
        assert_eq!(&backend.pwm().applied[..2], &[200, 100]);
        assert_eq!(backend.read_pin(id(&backend, 2)), Ok(200));
        assert_eq!(
            backend.read_pin(id(&backend, 5)),
            Err(IoError::NoPwmChannel)
        );
        assert_eq!(
            backend.pin_info(id(&backend, 5)).live,
            LiveState::Pwm(None)
        );
    }

    #[test]
    fn test_pwm_ramp_restarts_generator_once_per_tick() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(&mailbox, 4, &[(2, pwm(100, 1000, 1)), (4, pwm(100, 1000, 1))]);
        let starts = backend.pwm().starts;

        backend.periodic(10);
        assert_eq!(backend.pwm().starts, starts);
        backend.periodic(10);
        assert_eq!(backend.pwm().starts, starts + 1);
        assert_eq!(&backend.pwm().applied[..2], &[115, 115]);
    }

    #[test]
    fn test_pwm_trigger_and_write() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(&mailbox, 4, &[(2, pwm(100, 1000, 0))]);
        let pin = id(&backend, 2);

        backend.trigger_pin(pin, TriggerAction::On).unwrap();
        assert_eq!(backend.pwm().applied[0], MAX_DUTY);

        backend.trigger_pin(pin, TriggerAction::Off).unwrap();
        assert_eq!(backend.pwm().applied[0], 100);

        assert_eq!(
            backend.write_pin(pin, 70_000),
            Err(IoError::OutOfRange(Parameter::Duty))
        );
        backend.write_pin(pin, 500).unwrap();
        assert_eq!(backend.read_pin(pin), Ok(500));

        backend
            .set_pwm_ramp(
                pin,
                PwmConfig {
                    min_duty: 20,
                    max_duty: 40,
                    delay: 3,
                },
            )
            .unwrap();
        assert_eq!(backend.pwm().applied[0], 20);
        match backend.pin_info(pin).live {
            LiveState::Pwm(Some(live)) => {
                assert_eq!(live.ramp.max_duty, 40);
                assert_eq!(live.frequency_hz, 333);
            }
            other => panic!("unexpected live state {other:?}"),
        }
    }

    #[test]
    fn test_mode_errors() {
        let mailbox = EdgeMailbox::new();
        let mut backend = backend(
            &mailbox,
            4,
            &[
                (0, PinConfig::Input(InputConfig::default())),
                (5, PinConfig::Bus(BusConfig::default())),
                (2, PinConfig::Output(OutputConfig::default())),
            ],
        );

        assert_eq!(
            backend.write_pin(id(&backend, 0), 1),
            Err(IoError::InvalidForMode(PinMode::Input))
        );
        assert_eq!(
            backend.read_pin(id(&backend, 5)),
            Err(IoError::InvalidForMode(PinMode::Bus))
        );
        assert_eq!(
            backend.trigger_pin(id(&backend, 1), TriggerAction::On),
            Err(IoError::Disabled)
        );
        assert_eq!(
            backend.trigger_pin(id(&backend, 2), TriggerAction::Up),
            Err(IoError::InvalidForMode(PinMode::Output))
        );
        assert_eq!(
            backend.trigger_pin(id(&backend, 0), TriggerAction::On),
            Err(IoError::InvalidForMode(PinMode::Input))
        );
    }

    proptest::proptest! {
        /// Every edge is counted; detection comes back only once the
        /// debounce window has run out
        #[test]
        fn counter_counts_every_edge(edges in 1u32..40, debounce_ms in 0u32..200) {
            let mailbox = EdgeMailbox::new();
            let mut backend = backend(&mailbox, 4, &[(14, counter(debounce_ms, false))]);
            let pin = id(&backend, 14);

            for _ in 0..edges {
                edge(&mut backend, &mailbox, 14);
            }

            let ticks_until_armed = debounce_ms.div_ceil(10).max(1);
            for tick in 1..=ticks_until_armed {
                backend.periodic(10);
                let armed = backend.port().is_armed(14);
                assert_eq!(armed, tick == ticks_until_armed || debounce_ms == 0);
            }

            assert_eq!(backend.read_pin(pin), Ok(edges));
        }
    }
}
