//! Pin state dumps
//!
//! One template table, indexed by field kind and output format, drives
//! both the plain-text console dump and the HTML table. Templates use `{}`
//! placeholders filled in order.

use core::fmt::{self, Display, Write};

use crate::backend::{BackendId, LiveState, PinSnapshot};
use crate::config::PinConfig;

/// Output flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DumpFormat {
    #[default]
    Plain = 0,
    Markup = 1,
}

#[derive(Clone, Copy)]
enum Field {
    Header,
    Footer,
    PreLine,
    PostLine,
    Pin,
    Disabled,
    Input,
    Counter,
    Output,
    Timer,
    PwmInactive,
    PwmActive,
    PwmDutyDefault,
    PwmDutyCurrent,
    PwmEnd,
    Bus,
}

const FIELD_COUNT: usize = 16;

static TEMPLATES: [[&str; 2]; FIELD_COUNT] = [
    // header
    [
        "",
        "<table>\n<tr><th>io</th><th>pin</th><th>name</th><th>mode</th><th>state</th></tr>\n",
    ],
    // footer
    ["", "</table>\n"],
    // preline
    ["> ", "<tr>"],
    // postline
    ["\n", "</tr>\n"],
    // pin
    [
        "io: {}, pin: {}, name: {}, mode: ",
        "<td>{}</td><td>{}</td><td>{}</td>",
    ],
    // disabled
    ["disabled, state: {}", "<td>disabled</td><td>state: {}</td>"],
    // input
    [
        "input, state: {}, pullup: {}",
        "<td>input</td><td>state: {}, pullup: {}</td>",
    ],
    // counter
    [
        "counter, state: {}, count: {}, debounce: {}/{} ms, reset on get: {}",
        "<td>counter</td><td>state: {}, count: {}, debounce: {}/{} ms, reset on get: {}</td>",
    ],
    // output
    [
        "output, state: {}, startup: {}",
        "<td>output</td><td>state: {}, startup: {}</td>",
    ],
    // timer
    [
        "timer, direction: {}, delay: {} ms, repeat: {}, autotrigger: {}, active: {}, remaining: {} ms, state: {}",
        "<td>timer</td><td>direction: {}, delay: {} ms, repeat: {}, autotrigger: {}, active: {}, remaining: {} ms, state: {}</td>",
    ],
    // pwm inactive
    ["pwm, inactive", "<td>pwm</td><td>inactive"],
    // pwm active
    [
        "pwm, channel: {}, frequency: {} Hz, duty: {}, ramp: {}",
        "<td>pwm</td><td>channel: {}, frequency: {} Hz, duty: {}, ramp: {}",
    ],
    // pwm duty default
    [
        "\n  configured min: {}, max: {}, delay: {}",
        "<br/>configured min: {}, max: {}, delay: {}",
    ],
    // pwm duty current
    [
        "\n  current min: {}, max: {}, delay: {}",
        "<br/>current min: {}, max: {}, delay: {}",
    ],
    // pwm end
    ["", "</td>"],
    // bus
    ["bus, role: {}", "<td>bus</td><td>role: {}</td>"],
];

struct OnOff(bool);

impl Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "on" } else { "off" })
    }
}

struct Level(Option<bool>);

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(level) => OnOff(level).fmt(f),
            None => f.write_str("unknown"),
        }
    }
}

fn emit<W: Write>(
    out: &mut W,
    format: DumpFormat,
    field: Field,
    args: &[&dyn Display],
) -> fmt::Result {
    let template = TEMPLATES[field as usize][format as usize];
    let mut args = args.iter();
    let mut parts = template.split("{}");

    if let Some(first) = parts.next() {
        out.write_str(first)?;
    }
    for part in parts {
        if let Some(arg) = args.next() {
            write!(out, "{}", arg)?;
        }
        out.write_str(part)?;
    }
    Ok(())
}

pub fn write_header<W: Write>(out: &mut W, format: DumpFormat) -> fmt::Result {
    emit(out, format, Field::Header, &[])
}

pub fn write_footer<W: Write>(out: &mut W, format: DumpFormat) -> fmt::Result {
    emit(out, format, Field::Footer, &[])
}

/// Render one pin line
pub fn write_pin<W: Write>(
    out: &mut W,
    format: DumpFormat,
    backend: BackendId,
    snapshot: &PinSnapshot,
) -> fmt::Result {
    let level = Level(snapshot.level);

    emit(out, format, Field::PreLine, &[])?;
    emit(
        out,
        format,
        Field::Pin,
        &[&backend.as_u8(), &snapshot.pin, &snapshot.name],
    )?;

    match (&snapshot.config, &snapshot.live) {
        (PinConfig::Disabled, _) => emit(out, format, Field::Disabled, &[&level])?,
        (PinConfig::Input(input), _) => {
            emit(out, format, Field::Input, &[&level, &OnOff(input.pullup)])?
        }
        (PinConfig::Counter(counter), live) => {
            let (count, remaining) = match live {
                LiveState::Counter { count, debounce_ms } => (*count, *debounce_ms),
                _ => (0, 0),
            };
            emit(
                out,
                format,
                Field::Counter,
                &[
                    &level,
                    &count,
                    &remaining,
                    &counter.debounce_ms,
                    &OnOff(counter.reset_on_get),
                ],
            )?
        }
        (PinConfig::Output(output), _) => emit(
            out,
            format,
            Field::Output,
            &[&level, &OnOff(output.startup_state)],
        )?,
        (PinConfig::Timer(timer), live) => {
            let remaining = match live {
                LiveState::Timer { remaining_ms } => *remaining_ms,
                _ => 0,
            };
            emit(
                out,
                format,
                Field::Timer,
                &[
                    &timer.direction.name(),
                    &timer.delay_ms,
                    &OnOff(timer.repeat),
                    &OnOff(timer.autotrigger),
                    &OnOff(remaining > 0),
                    &remaining,
                    &level,
                ],
            )?
        }
        (PinConfig::Pwm(pwm), live) => {
            let active = match live {
                LiveState::Pwm(active) => *active,
                _ => None,
            };
            match active {
                Some(active) => emit(
                    out,
                    format,
                    Field::PwmActive,
                    &[
                        &active.channel,
                        &active.frequency_hz,
                        &active.duty,
                        &active.direction.name(),
                    ],
                )?,
                None => emit(out, format, Field::PwmInactive, &[])?,
            }
            emit(
                out,
                format,
                Field::PwmDutyDefault,
                &[&pwm.min_duty, &pwm.max_duty, &pwm.delay],
            )?;
            if let Some(active) = active {
                emit(
                    out,
                    format,
                    Field::PwmDutyCurrent,
                    &[
                        &active.ramp.min_duty,
                        &active.ramp.max_duty,
                        &active.ramp.delay,
                    ],
                )?;
            }
            emit(out, format, Field::PwmEnd, &[])?
        }
        (PinConfig::Bus(bus), _) => emit(out, format, Field::Bus, &[&bus.role.name()])?,
    }

    emit(out, format, Field::PostLine, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PwmLive;
    use crate::config::{CounterConfig, PwmConfig, TimerConfig};
    use crate::ramp::RampDirection;

    fn render(format: DumpFormat, snapshot: &PinSnapshot) -> String {
        let mut out = String::new();
        write_pin(&mut out, format, BackendId::Native, snapshot).unwrap();
        out
    }

    fn snapshot(config: PinConfig, live: LiveState) -> PinSnapshot {
        PinSnapshot {
            pin: 4,
            name: "gpio4",
            config,
            level: Some(true),
            live,
        }
    }

    #[test]
    fn test_template_table_covers_every_field() {
        assert_eq!(Field::Bus as usize + 1, FIELD_COUNT);
    }

    #[test]
    fn test_counter_line() {
        let counter = snapshot(
            PinConfig::Counter(CounterConfig::default()),
            LiveState::Counter {
                count: 7,
                debounce_ms: 40,
            },
        );
        assert_eq!(
            render(DumpFormat::Plain, &counter),
            "> io: 0, pin: 4, name: gpio4, mode: counter, state: on, count: 7, debounce: 40/100 ms, reset on get: off\n"
        );
        assert_eq!(
            render(DumpFormat::Markup, &counter),
            "<tr><td>0</td><td>4</td><td>gpio4</td><td>counter</td><td>state: on, count: 7, debounce: 40/100 ms, reset on get: off</td></tr>\n"
        );
    }

    #[test]
    fn test_timer_line_shows_armed_state() {
        let timer = snapshot(
            PinConfig::Timer(TimerConfig::default()),
            LiveState::Timer { remaining_ms: 250 },
        );
        let text = render(DumpFormat::Plain, &timer);
        assert!(text.contains("direction: up, delay: 1000 ms"));
        assert!(text.contains("active: on, remaining: 250 ms"));
    }

    #[test]
    fn test_pwm_lines() {
        let configured = PwmConfig {
            min_duty: 10,
            max_duty: 500,
            delay: 2,
        };
        let active = snapshot(
            PinConfig::Pwm(configured),
            LiveState::Pwm(Some(PwmLive {
                channel: 1,
                frequency_hz: 333,
                duty: 77,
                ramp: PwmConfig {
                    max_duty: 400,
                    ..configured
                },
                direction: RampDirection::Down,
            })),
        );
        assert_eq!(
            render(DumpFormat::Plain, &active),
            "> io: 0, pin: 4, name: gpio4, mode: pwm, channel: 1, frequency: 333 Hz, duty: 77, ramp: down\n  configured min: 10, max: 500, delay: 2\n  current min: 10, max: 400, delay: 2\n"
        );

        let inactive = snapshot(PinConfig::Pwm(configured), LiveState::None);
        let markup = render(DumpFormat::Markup, &inactive);
        assert!(markup.starts_with("<tr><td>0</td><td>4</td><td>gpio4</td><td>pwm</td><td>inactive"));
        assert!(markup.ends_with("delay: 2</td></tr>\n"));
    }

    #[test]
    fn test_unknown_level() {
        let mut disabled = snapshot(PinConfig::Disabled, LiveState::None);
        disabled.level = None;
        assert_eq!(
            render(DumpFormat::Plain, &disabled),
            "> io: 0, pin: 4, name: gpio4, mode: disabled, state: unknown\n"
        );
    }
}
