use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use ufmt_write::uWrite;

use crate::charset;
use crate::port::Port;
use crate::{
    Font, Instruction, CTRL_BLINK_ON, CTRL_CURSOR_ON, CTRL_DISPLAY_ON, DDRAM_SIZE,
    ENTRY_INCREMENT, ENTRY_SHIFT_DISPLAY, FUNC_TWO_LINES, MAX_ROWS, POWER_GRAPHICS,
    POWER_INTERNAL, ROW_OFFSETS, SETTLE_DELAY_US, SHIFT_DISPLAY, SHIFT_RIGHT,
};

/// API to drive the display.
///
/// The boolean configuration flags mirror what was last written to the
/// controller; the hardware only reports the busy flag and the address
/// counter back, so this mirror is the sole source of truth for the
/// getters. Flags are updated on every successful setter call and never
/// inferred from reads.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    port: Port<'a, I, D>,
    rows: u8,
    font: Font,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    increment: bool,
    display_shift: bool,
    graphics_mode: bool,
    internal_power: bool,
}

fn merge(flag: &mut bool, update: Option<bool>) {
    if let Some(v) = update {
        *flag = v;
    }
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            port: Port::new(i2c, delay),
            rows: MAX_ROWS,
            font: Font::EnglishRussian,
            display_on: false,
            cursor_on: false,
            blink_on: false,
            increment: false,
            display_shift: false,
            graphics_mode: false,
            internal_power: true,
        }
    }

    /// Set I2C address of the port expander, see [lcd address].
    ///
    /// [lcd address]: https://www.ardumotive.com/i2clcden.html
    pub fn with_address(mut self, address: u8) -> Self {
        self.port.address = address;
        self
    }

    /// Number of display rows, clamped to the controller maximum of 2.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.rows = rows.max(1).min(MAX_ROWS);
        self
    }

    /// Font table to select during initialization.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Runs the power-on initialization and hands the driver back.
    pub fn init(mut self) -> Result<Self, I::Error> {
        self.initialize()?;
        Ok(self)
    }

    /// 4-bit-mode synchronization and base configuration. Public so a
    /// power-cycled module can be reset without rebuilding the driver.
    pub fn initialize(&mut self) -> Result<(), I::Error> {
        // Five raw zero nibbles force the controller into a known
        // interface state. The busy flag is not readable yet, so these
        // are bare sends paced by a settle delay.
        for _ in 0..5 {
            self.port.send_nibble(0, false)?;
        }
        self.port.delay.delay_us(SETTLE_DELAY_US);

        // The Function Set high nibble on its own completes the switch
        // to 4-bit mode; from here on full instructions work.
        self.port.send_nibble(Instruction::FunctionSet as u8 >> 4, false)?;
        self.port.delay.delay_us(SETTLE_DELAY_US);

        let lines = if self.rows > 1 { FUNC_TWO_LINES } else { 0 };
        self.port
            .send_instruction(Instruction::FunctionSet as u8 | lines | self.font as u8)?;

        self.port.send_instruction(Instruction::Clear as u8)?;
        self.port.send_instruction(Instruction::ReturnHome as u8)?;
        Ok(())
    }

    fn display_control_instruction(&self) -> u8 {
        let mut instr = Instruction::DisplayControl as u8;
        if self.display_on {
            instr |= CTRL_DISPLAY_ON;
        }
        if self.cursor_on {
            instr |= CTRL_CURSOR_ON;
        }
        if self.blink_on {
            instr |= CTRL_BLINK_ON;
        }
        instr
    }

    fn entry_mode_instruction(&self) -> u8 {
        let mut instr = Instruction::EntryMode as u8;
        if self.increment {
            instr |= ENTRY_INCREMENT;
        }
        if self.display_shift {
            instr |= ENTRY_SHIFT_DISPLAY;
        }
        instr
    }

    fn power_mode_instruction(&self) -> u8 {
        let mut instr = Instruction::PowerMode as u8;
        if self.graphics_mode {
            instr |= POWER_GRAPHICS;
        }
        if self.internal_power {
            instr |= POWER_INTERNAL;
        }
        instr
    }

    /// Set display, cursor and blink flags. `None` leaves a flag at its
    /// mirrored value, so unrelated flags are never clobbered.
    pub fn set_display_control(
        &mut self,
        display_on: Option<bool>,
        cursor_on: Option<bool>,
        blink_on: Option<bool>,
    ) -> Result<(), I::Error> {
        merge(&mut self.display_on, display_on);
        merge(&mut self.cursor_on, cursor_on);
        merge(&mut self.blink_on, blink_on);
        self.port.send_instruction(self.display_control_instruction())?;
        Ok(())
    }

    /// Mirrored `(display_on, cursor_on, blink_on)` flags. Does not
    /// query the hardware.
    pub fn display_control(&self) -> (bool, bool, bool) {
        (self.display_on, self.cursor_on, self.blink_on)
    }

    /// Set entry mode: `increment` selects address auto-increment over
    /// auto-decrement, `display_shift` shifts the display instead of
    /// moving the cursor on writes. `None` leaves a flag unchanged.
    pub fn set_entry_mode(
        &mut self,
        increment: Option<bool>,
        display_shift: Option<bool>,
    ) -> Result<(), I::Error> {
        merge(&mut self.increment, increment);
        merge(&mut self.display_shift, display_shift);
        self.port.send_instruction(self.entry_mode_instruction())?;
        Ok(())
    }

    /// Mirrored `(increment, display_shift)` flags.
    pub fn entry_mode(&self) -> (bool, bool) {
        (self.increment, self.display_shift)
    }

    /// Set graphics/character mode and the internal power switch.
    /// `None` leaves a flag unchanged.
    pub fn set_power_mode(
        &mut self,
        graphics_mode: Option<bool>,
        internal_power: Option<bool>,
    ) -> Result<(), I::Error> {
        merge(&mut self.graphics_mode, graphics_mode);
        merge(&mut self.internal_power, internal_power);
        self.port.send_instruction(self.power_mode_instruction())?;
        Ok(())
    }

    /// Mirrored `(graphics_mode, internal_power)` flags.
    pub fn power_mode(&self) -> (bool, bool) {
        (self.graphics_mode, self.internal_power)
    }

    /// Clear the display (DDRAM filled with blanks, address counter
    /// reset to 0).
    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.port.send_instruction(Instruction::Clear as u8)?;
        Ok(())
    }

    /// Return the cursor to address 0 and undo any display shift.
    /// DDRAM contents are untouched.
    pub fn return_home(&mut self) -> Result<(), I::Error> {
        self.port.send_instruction(Instruction::ReturnHome as u8)?;
        Ok(())
    }

    /// Jump the address counter. Out-of-range addresses are clamped
    /// into DDRAM rather than rejected.
    pub fn set_address(&mut self, ac: u8) -> Result<(), I::Error> {
        let ac = ac.min(DDRAM_SIZE - 1);
        self.port.send_instruction(Instruction::DdramAddr as u8 | ac)?;
        Ok(())
    }

    /// Current address counter, obtained through one status poll.
    pub fn address_counter(&mut self) -> Result<u8, I::Error> {
        self.port.poll_until_ready()
    }

    /// Write a string starting at the current address counter.
    /// Characters go through the symbol table; anything unmapped is sent
    /// as its code point truncated to one byte.
    pub fn write_str(&mut self, s: &str) -> Result<(), I::Error> {
        for c in s.chars() {
            self.port.send_data(charset::encode(c))?;
        }
        Ok(())
    }

    /// Write a string at the start of a 1-based line. Line numbers wrap
    /// around the configured row count.
    pub fn write_line(&mut self, s: &str, line: u8) -> Result<(), I::Error> {
        let row = line.wrapping_sub(1) % self.rows;
        self.set_address(ROW_OFFSETS[row as usize])?;
        self.write_str(s)
    }

    /// Read `size` bytes of DDRAM starting at `ac` and decode them to
    /// text. `ac` is clamped into DDRAM, `size` to `1..=128`. The
    /// address counter is saved before the read and restored after it,
    /// so from the caller's perspective the cursor never moved.
    pub fn read_region(&mut self, ac: u8, size: usize) -> Result<heapless::String<256>, I::Error> {
        let ac = ac.min(DDRAM_SIZE - 1);
        let size = size.max(1).min(DDRAM_SIZE as usize);

        let saved = self.port.poll_until_ready()?;
        self.set_address(ac)?;

        let mut raw = [0u8; DDRAM_SIZE as usize];
        self.port.read_data(&mut raw[..size])?;

        let mut text = heapless::String::new();
        for &symbol in &raw[..size] {
            // decoded chars are at most 2 bytes in UTF-8, 128 of them
            // always fit the 256-byte capacity
            let _ = text.push(charset::decode(symbol));
        }

        self.set_address(saved)?;
        Ok(text)
    }

    /// Move the cursor by `count` cells. A single step maps to one
    /// Cursor/Display Shift instruction; larger moves read the address
    /// counter and jump straight to `(AC + count) mod 128` with a single
    /// Set DDRAM Address, skipping the per-step side effects a shift
    /// sequence would have.
    pub fn move_cursor(&mut self, count: i32) -> Result<(), I::Error> {
        match count {
            0 => {}
            1 => {
                self.port
                    .send_instruction(Instruction::CursorShift as u8 | SHIFT_RIGHT)?;
            }
            -1 => {
                self.port.send_instruction(Instruction::CursorShift as u8)?;
            }
            _ => {
                let ac = self.port.poll_until_ready()?;
                let target = (ac as i32 + count).rem_euclid(DDRAM_SIZE as i32) as u8;
                self.port
                    .send_instruction(Instruction::DdramAddr as u8 | target)?;
            }
        }
        Ok(())
    }

    /// Shift the visible window by `count` cells, right for positive
    /// counts. The controller has no multi-step shift, so this issues
    /// `|count| mod (128 / rows)` single-step instructions.
    pub fn shift_display(&mut self, count: i32) -> Result<(), I::Error> {
        if count == 0 {
            return Ok(());
        }
        let mut instr = Instruction::CursorShift as u8 | SHIFT_DISPLAY;
        if count > 0 {
            instr |= SHIFT_RIGHT;
        }
        let steps = count.unsigned_abs() % (DDRAM_SIZE as u32 / self.rows as u32);
        for _ in 0..steps {
            self.port.send_instruction(instr)?;
        }
        Ok(())
    }

    /// Send the Graphics/Power Mode instruction encoding the mirrored
    /// graphics and power flags. Call [`Lcd::set_power_mode`] first to
    /// choose the state to end up in.
    pub fn power_off(&mut self) -> Result<(), I::Error> {
        self.port.send_instruction(self.power_mode_instruction())?;
        Ok(())
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}
