#![no_std]
//! Driver for character OLED/LCD modules built on the Winstar WS0010
//! controller, wired in 4-bit mode behind a PCF8574-style 8-bit I2C port
//! expander. It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! Usage:
//! ```ignore
//! const LCD_ADDRESS: u8 = 0x27; // Address of the expander, depends on wiring
//!
//! // Create an I2C instance implementing embedded_hal::i2c::I2c, this
//! // particular one uses the arduino_hal crate for avr microcontrollers.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let mut i2c = arduino_hal::I2c::new(
//!     dp.TWI,
//!     pins.a4.into_pull_up_input(),
//!     pins.a5.into_pull_up_input(),
//!     50000,
//! );
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = lcd_ws0010_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_address(LCD_ADDRESS)
//!     .with_rows(2)
//!     .init().unwrap();
//!
//! lcd.set_display_control(Some(true), Some(false), Some(false)).unwrap();
//! lcd.set_entry_mode(Some(true), Some(false)).unwrap();
//! lcd.write_line("Привет, мир!", 1).unwrap();
//! ```
//!
//! The driver synchronizes with the controller by polling the busy flag
//! after every instruction. The poll has no timeout: a module that never
//! clears its busy flag (disconnected, powered down mid-transfer) blocks
//! the calling operation forever. This mirrors the wire protocol and is
//! deliberate; put a watchdog around the driver if that matters to you.
//!
//! All calls are blocking and the driver borrows the bus mutably, so
//! sharing between threads requires external serialization.

pub mod charset;
mod port;
pub mod sync_lcd;

// Expander port layout: bit 6 enable, bit 5 read/write, bit 4 register
// select, bits 3..0 carry DB7..DB4 of the controller.
pub(crate) const PIN_RS: u8 = 0x10;
pub(crate) const PIN_RW: u8 = 0x20;
pub(crate) const PIN_EN: u8 = 0x40;

// The PCF8574 I/Os are quasi-bidirectional and must be driven high
// before they can be read back, so every read-side control byte keeps
// the data lines set.
pub(crate) const DATA_PINS: u8 = 0x0F;

/// Top bit of the status byte; the other 7 bits are the address counter.
pub(crate) const BUSY_FLAG: u8 = 0x80;

#[repr(u8)]
#[derive(Copy, Clone)]
pub(crate) enum Instruction {
    Clear = 0x01,
    ReturnHome = 0x02,
    EntryMode = 0x04,
    DisplayControl = 0x08,
    CursorShift = 0x10,
    /// Graphics/character mode and internal power control, WS0010 only.
    PowerMode = 0x13,
    FunctionSet = 0x20,
    DdramAddr = 0x80,
}

// Entry Mode parameter bits.
pub(crate) const ENTRY_INCREMENT: u8 = 0x02;
pub(crate) const ENTRY_SHIFT_DISPLAY: u8 = 0x01;

// Display Control parameter bits.
pub(crate) const CTRL_DISPLAY_ON: u8 = 0x04;
pub(crate) const CTRL_CURSOR_ON: u8 = 0x02;
pub(crate) const CTRL_BLINK_ON: u8 = 0x01;

// Cursor/Display Shift parameter bits.
pub(crate) const SHIFT_DISPLAY: u8 = 0x08;
pub(crate) const SHIFT_RIGHT: u8 = 0x04;

// Graphics/Power Mode parameter bits.
pub(crate) const POWER_GRAPHICS: u8 = 0x08;
pub(crate) const POWER_INTERNAL: u8 = 0x04;

// Function Set parameter bits. 8-bit bus selection (0x10) is not
// supported by this driver.
pub(crate) const FUNC_TWO_LINES: u8 = 0x08;

/// Font table selected at Function Set time.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Font {
    EnglishJapanese = 0x00,
    WesternEuropean1 = 0x01,
    EnglishRussian = 0x02,
    WesternEuropean2 = 0x03,
}

pub(crate) const DDRAM_SIZE: u8 = 128;
pub(crate) const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];
pub(crate) const MAX_ROWS: u8 = 2;

// Two distinct wait constants survive from the hardware bring-up and
// earlier revisions swap their values. Keep them separate.
/// Interval between consecutive busy-flag reads.
pub(crate) const BUSY_POLL_DELAY_US: u32 = 1_000;
/// Settle time after raw nibble sends during init, while the busy flag
/// cannot be polled yet.
pub(crate) const SETTLE_DELAY_US: u32 = 100;
