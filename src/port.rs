//! 4-bit bus discipline against the port expander: nibble framing,
//! enable strobing and busy-flag polling. Everything that touches the
//! transport lives here, so a half-duplex transaction can never be
//! interleaved with another caller's nibbles.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{BUSY_FLAG, BUSY_POLL_DELAY_US, DATA_PINS, PIN_EN, PIN_RS, PIN_RW};

pub(crate) struct Port<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub(crate) i2c: &'a mut I,
    pub(crate) address: u8,
    pub(crate) delay: &'a mut D,
}

impl<'a, I, D> Port<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub(crate) fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            address: 0,
            delay,
        }
    }

    fn write_port(&mut self, byte: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[byte])
    }

    fn read_port(&mut self) -> Result<u8, I::Error> {
        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf)?;
        Ok(buf[0])
    }

    /// Put one nibble on the bus and latch it with an enable pulse.
    /// Anything above the low 4 bits of `nibble` is discarded.
    pub(crate) fn send_nibble(&mut self, nibble: u8, data: bool) -> Result<(), I::Error> {
        let mut b = nibble & 0x0F;
        if data {
            b |= PIN_RS;
        }
        self.write_port(b)?;
        self.write_port(b | PIN_EN)?;
        self.write_port(b)
    }

    /// Send an instruction byte, high nibble first, then wait until the
    /// controller reports ready. Returns the address counter.
    pub(crate) fn send_instruction(&mut self, byte: u8) -> Result<u8, I::Error> {
        self.send_nibble(byte >> 4, false)?;
        self.send_nibble(byte, false)?;
        self.poll_until_ready()
    }

    /// Send one data byte (register select high), then wait for ready.
    pub(crate) fn send_data(&mut self, byte: u8) -> Result<u8, I::Error> {
        self.send_nibble(byte >> 4, true)?;
        self.send_nibble(byte, true)?;
        self.poll_until_ready()
    }

    /// One strobed two-nibble read with `ctl` held on the control lines.
    fn read_cycle(&mut self, ctl: u8) -> Result<u8, I::Error> {
        self.write_port(ctl | PIN_EN)?;
        let mut byte = (self.read_port()? & 0x0F) << 4;
        self.write_port(ctl)?;
        self.write_port(ctl | PIN_EN)?;
        byte |= self.read_port()? & 0x0F;
        self.write_port(ctl)?;
        Ok(byte)
    }

    /// Poll the busy flag until the controller is ready and return the
    /// address counter from the final status read.
    ///
    /// There is no timeout. A controller that never clears its busy flag
    /// blocks here indefinitely, exactly like the wire protocol does.
    pub(crate) fn poll_until_ready(&mut self) -> Result<u8, I::Error> {
        let ctl = PIN_RW | DATA_PINS;
        self.write_port(ctl)?;
        loop {
            let status = self.read_cycle(ctl)?;
            if status & BUSY_FLAG == 0 {
                self.write_port(0x00)?;
                return Ok(status & !BUSY_FLAG);
            }
            self.delay.delay_us(BUSY_POLL_DELAY_US);
        }
    }

    /// Burst-read DDRAM bytes from the current address counter. Register
    /// select stays high through the burst so the data register is read
    /// instead of the status register.
    pub(crate) fn read_data(&mut self, buf: &mut [u8]) -> Result<(), I::Error> {
        let ctl = PIN_RS | PIN_RW | DATA_PINS;
        self.write_port(ctl)?;
        for slot in buf.iter_mut() {
            *slot = self.read_cycle(ctl)?;
        }
        self.write_port(0x00)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::*;

    const ADDR: u8 = 0x27;

    fn expect_nibble(t: &mut Vec<I2cTransaction>, nibble: u8, data: bool) {
        let b = (nibble & 0x0F) | if data { PIN_RS } else { 0 };
        t.push(I2cTransaction::write(ADDR, std::vec![b]));
        t.push(I2cTransaction::write(ADDR, std::vec![b | PIN_EN]));
        t.push(I2cTransaction::write(ADDR, std::vec![b]));
    }

    // One status poll: R/W raised once, then a strobed two-nibble read
    // per status byte, then the bus released.
    fn expect_status_poll(t: &mut Vec<I2cTransaction>, statuses: &[u8]) {
        let ctl = PIN_RW | DATA_PINS;
        t.push(I2cTransaction::write(ADDR, std::vec![ctl]));
        for &status in statuses {
            t.push(I2cTransaction::write(ADDR, std::vec![ctl | PIN_EN]));
            t.push(I2cTransaction::read(ADDR, std::vec![status >> 4]));
            t.push(I2cTransaction::write(ADDR, std::vec![ctl]));
            t.push(I2cTransaction::write(ADDR, std::vec![ctl | PIN_EN]));
            t.push(I2cTransaction::read(ADDR, std::vec![status & 0x0F]));
            t.push(I2cTransaction::write(ADDR, std::vec![ctl]));
        }
        t.push(I2cTransaction::write(ADDR, std::vec![0x00]));
    }

    fn port_with<'a>(i2c: &'a mut I2cMock, delay: &'a mut NoopDelay) -> Port<'a, I2cMock, NoopDelay> {
        let mut port = Port::new(i2c, delay);
        port.address = ADDR;
        port
    }

    #[test]
    fn nibble_is_masked_and_strobed() {
        let mut expected = Vec::new();
        // high nibble of 0xAB must be gone, only 0x0B remains
        expect_nibble(&mut expected, 0x0B, false);

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        port_with(&mut i2c, &mut delay).send_nibble(0xAB, false).unwrap();
        i2c.done();
    }

    #[test]
    fn data_nibble_raises_register_select() {
        let mut expected = Vec::new();
        expect_nibble(&mut expected, 0x05, true);

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        port_with(&mut i2c, &mut delay).send_nibble(0x05, true).unwrap();
        i2c.done();
    }

    #[test]
    fn instruction_sends_both_nibbles_then_polls() {
        let mut expected = Vec::new();
        expect_nibble(&mut expected, 0x02, false);
        expect_nibble(&mut expected, 0x08, false);
        expect_status_poll(&mut expected, &[0x00]);

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        let ac = port_with(&mut i2c, &mut delay).send_instruction(0x28).unwrap();
        assert_eq!(ac, 0);
        i2c.done();
    }

    #[test]
    fn data_byte_keeps_register_select_on_both_nibbles() {
        let mut expected = Vec::new();
        expect_nibble(&mut expected, 0x04, true);
        expect_nibble(&mut expected, 0x01, true);
        expect_status_poll(&mut expected, &[0x42]);

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        let ac = port_with(&mut i2c, &mut delay).send_data(0x41).unwrap();
        assert_eq!(ac, 0x42);
        i2c.done();
    }

    #[test]
    fn busy_poll_retries_until_flag_clears() {
        // Two busy statuses, then ready with AC = 0x33: exactly three
        // read cycles, AC taken from the last one.
        let mut expected = Vec::new();
        expect_status_poll(&mut expected, &[0x85, 0x85, 0x33]);

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        let ac = port_with(&mut i2c, &mut delay).poll_until_ready().unwrap();
        assert_eq!(ac, 0x33);
        i2c.done();
    }

    #[test]
    fn ddram_burst_holds_register_select_high() {
        let ctl = PIN_RS | PIN_RW | DATA_PINS;
        let mut expected = Vec::new();
        expected.push(I2cTransaction::write(ADDR, std::vec![ctl]));
        for &byte in &[0x41u8, 0xB5] {
            expected.push(I2cTransaction::write(ADDR, std::vec![ctl | PIN_EN]));
            expected.push(I2cTransaction::read(ADDR, std::vec![byte >> 4]));
            expected.push(I2cTransaction::write(ADDR, std::vec![ctl]));
            expected.push(I2cTransaction::write(ADDR, std::vec![ctl | PIN_EN]));
            expected.push(I2cTransaction::read(ADDR, std::vec![byte & 0x0F]));
            expected.push(I2cTransaction::write(ADDR, std::vec![ctl]));
        }
        expected.push(I2cTransaction::write(ADDR, std::vec![0x00]));

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();
        let mut buf = [0u8; 2];
        port_with(&mut i2c, &mut delay).read_data(&mut buf).unwrap();
        assert_eq!(buf, [0x41, 0xB5]);
        i2c.done();
    }
}
