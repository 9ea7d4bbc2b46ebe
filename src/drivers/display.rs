//! 4-digit 7-segment display on a 74HC595 shift-register chain.
//!
//! Generic over [`embedded_hal::digital::OutputPin`] for the data, clock
//! and latch lines, so the whole rendering path runs in host tests with
//! mock pins. Glyphs use the usual `dp g f e d c b a` bit layout, one
//! byte per digit, shifted out MSB-first, leftmost digit first.
//!
//! Rendering is frame-based: the menu pushes a 4-glyph frame through
//! [`DisplayPort`] and the driver latches it in one burst. A decimal
//! point in the input merges into the glyph before it.

use embedded_hal::digital::OutputPin;
use heapless::String;

use crate::app::ports::DisplayPort;
use crate::error::Fault;

const DIGITS: usize = 4;
const BLANK: u8 = 0x00;
const DP: u8 = 0x80;

/// Segment pattern for one character, `None` for unrenderable input.
fn glyph(c: char) -> Option<u8> {
    let g = match c {
        '0' | 'O' => 0x3F,
        '1' => 0x06,
        '2' => 0x5B,
        '3' => 0x4F,
        '4' => 0x66,
        '5' | 'S' => 0x6D,
        '6' => 0x7D,
        '7' => 0x07,
        '8' => 0x7F,
        '9' => 0x6F,
        '-' => 0x40,
        ' ' => BLANK,
        'A' => 0x77,
        'b' => 0x7C,
        'C' => 0x39,
        'c' => 0x58,
        'd' => 0x5E,
        'E' => 0x79,
        'F' => 0x71,
        'H' => 0x76,
        'h' => 0x74,
        'I' => 0x30,
        'L' => 0x38,
        'n' => 0x54,
        'o' => 0x5C,
        'P' => 0x73,
        'r' => 0x50,
        't' => 0x78,
        'U' => 0x3E,
        'u' => 0x1C,
        'y' => 0x6E,
        _ => return None,
    };
    Some(g)
}

/// Encode up to four renderable characters into a frame, merging each
/// '.' into the preceding glyph's decimal-point segment. Unknown
/// characters render blank. Left-aligned, blank-padded.
fn encode(text: &str) -> [u8; DIGITS] {
    let mut frame = [BLANK; DIGITS];
    let mut pos = 0;
    for c in text.chars() {
        if c == '.' {
            if pos > 0 {
                frame[pos - 1] |= DP;
            }
            continue;
        }
        if pos == DIGITS {
            break;
        }
        frame[pos] = glyph(c).unwrap_or(BLANK);
        pos += 1;
    }
    frame
}

/// Fit a value into four digits: one decimal while it fits,
/// integer beyond that.
fn format_value(value: f32) -> String<8> {
    use core::fmt::Write;
    let mut s = String::new();
    let _ = if (-99.9..=-10.0).contains(&value) || (100.0..=9999.0).contains(&value) {
        write!(s, "{value:.0}")
    } else if (-10.0..100.0).contains(&value) {
        write!(s, "{value:.1}")
    } else {
        write!(s, "----")
    };
    s
}

/// [`OutputPin`] over a raw GPIO that `hw_init` configured as an output.
/// Infallible; writes are no-ops on the host.
pub struct SysPin {
    gpio: i32,
}

impl SysPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl embedded_hal::digital::ErrorType for SysPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SysPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        crate::drivers::hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        crate::drivers::hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

pub struct SevenSegDisplay<P: OutputPin> {
    data: P,
    clock: P,
    latch: P,
}

impl<P: OutputPin> SevenSegDisplay<P> {
    pub fn new(data: P, clock: P, latch: P) -> Self {
        Self { data, clock, latch }
    }

    /// Shift a frame out and latch it, leftmost digit first.
    fn write_frame(&mut self, frame: [u8; DIGITS]) {
        for glyph in frame {
            for bit in (0..8).rev() {
                if glyph & (1 << bit) != 0 {
                    self.data.set_high().ok();
                } else {
                    self.data.set_low().ok();
                }
                self.clock.set_high().ok();
                self.clock.set_low().ok();
            }
        }
        self.latch.set_high().ok();
        self.latch.set_low().ok();
    }
}

impl<P: OutputPin> DisplayPort for SevenSegDisplay<P> {
    fn show_temperature(&mut self, celsius: f32, probe: u8) {
        // Leftmost digit names the probe, its decimal point separates it
        // from the three-glyph reading.
        let mut frame = [BLANK; DIGITS];
        frame[0] = glyph(char::from(b'0' + (probe % 10))).unwrap_or(BLANK) | DP;
        let text = format_value(celsius);
        let value = encode(&text);
        frame[1..].copy_from_slice(&value[..3]);
        self.write_frame(frame);
    }

    fn show_value(&mut self, value: f32) {
        self.write_frame(encode(&format_value(value)));
    }

    fn show_text(&mut self, text: &str) {
        self.write_frame(encode(text));
    }

    fn show_fault(&mut self, fault: Fault) {
        use core::fmt::Write;
        let mut s: String<8> = String::new();
        let _ = write!(s, "E  {}", fault.code());
        self.write_frame(encode(&s));
    }
}
