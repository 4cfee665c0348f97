// Instruction semantics
//
// One method per instruction family, called from the execution core after
// the operand has been resolved. Methods that branch return the extra
// cycles the branch costs; everything else is flat-rate and the table's
// cycle counts (plus the page-cross penalty) cover it.

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// Fetch the operand byte, from the instruction stream or from memory
    #[inline]
    pub(crate) fn operand_value(&mut self, bus: &mut Bus, operand: Operand) -> u8 {
        match operand.value {
            Some(v) => v,
            None => bus.read(operand.address),
        }
    }

    // ========================================
    // Stack primitives
    // ========================================

    pub(crate) fn push_byte(&mut self, bus: &mut Bus, value: u8) {
        bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop_byte(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | self.sp as u16)
    }

    pub(crate) fn push_word(&mut self, bus: &mut Bus, value: u16) {
        self.push_byte(bus, (value >> 8) as u8);
        self.push_byte(bus, (value & 0xFF) as u8);
    }

    pub(crate) fn pop_word(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop_byte(bus) as u16;
        let hi = self.pop_byte(bus) as u16;
        (hi << 8) | lo
    }

    // ========================================
    // Loads and stores
    // ========================================

    pub(crate) fn lda(&mut self, value: u8) {
        self.a = value;
        self.update_zero_negative(self.a);
    }

    pub(crate) fn ldx(&mut self, value: u8) {
        self.x = value;
        self.update_zero_negative(self.x);
    }

    pub(crate) fn ldy(&mut self, value: u8) {
        self.y = value;
        self.update_zero_negative(self.y);
    }

    pub(crate) fn sta(&mut self, bus: &mut Bus, address: u16) {
        bus.write(address, self.a);
    }

    pub(crate) fn stx(&mut self, bus: &mut Bus, address: u16) {
        bus.write(address, self.x);
    }

    pub(crate) fn sty(&mut self, bus: &mut Bus, address: u16) {
        bus.write(address, self.y);
    }

    // ========================================
    // Arithmetic
    // ========================================

    /// Add with carry (binary only; the D flag is latched but ignored)
    pub(crate) fn adc(&mut self, value: u8) {
        let carry_in = self.get_flag(flags::CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry_in;
        let result = sum as u8;

        self.set_flag(flags::CARRY, sum > 0xFF);
        // Overflow: operands agree in sign, result disagrees
        let overflow = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.set_flag(flags::OVERFLOW, overflow);

        self.a = result;
        self.update_zero_negative(self.a);
    }

    /// Subtract with borrow, implemented as ADC of the complement
    pub(crate) fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    pub(crate) fn inc(&mut self, bus: &mut Bus, address: u16) -> u8 {
        let result = bus.read(address).wrapping_add(1);
        bus.write(address, result);
        self.update_zero_negative(result);
        result
    }

    pub(crate) fn dec(&mut self, bus: &mut Bus, address: u16) -> u8 {
        let result = bus.read(address).wrapping_sub(1);
        bus.write(address, result);
        self.update_zero_negative(result);
        result
    }

    pub(crate) fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.update_zero_negative(self.x);
    }

    pub(crate) fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.update_zero_negative(self.y);
    }

    pub(crate) fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.update_zero_negative(self.x);
    }

    pub(crate) fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.update_zero_negative(self.y);
    }

    // ========================================
    // Logic
    // ========================================

    pub(crate) fn and(&mut self, value: u8) {
        self.a &= value;
        self.update_zero_negative(self.a);
    }

    pub(crate) fn ora(&mut self, value: u8) {
        self.a |= value;
        self.update_zero_negative(self.a);
    }

    pub(crate) fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.update_zero_negative(self.a);
    }

    /// BIT: Z from the AND, N and V copied straight from the memory byte
    pub(crate) fn bit(&mut self, value: u8) {
        self.set_flag(flags::ZERO, self.a & value == 0);
        self.set_flag(flags::NEGATIVE, value & 0x80 != 0);
        self.set_flag(flags::OVERFLOW, value & 0x40 != 0);
    }

    // ========================================
    // Shifts and rotates
    // ========================================

    pub(crate) fn asl_value(&mut self, value: u8) -> u8 {
        self.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_negative(result);
        result
    }

    pub(crate) fn lsr_value(&mut self, value: u8) -> u8 {
        self.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_negative(result);
        result
    }

    pub(crate) fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = self.get_flag(flags::CARRY) as u8;
        self.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zero_negative(result);
        result
    }

    pub(crate) fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = (self.get_flag(flags::CARRY) as u8) << 7;
        self.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.update_zero_negative(result);
        result
    }

    /// Apply a shift/rotate to a memory operand (read, modify, write back)
    pub(crate) fn rmw(
        &mut self,
        bus: &mut Bus,
        address: u16,
        op: fn(&mut Cpu, u8) -> u8,
    ) -> u8 {
        let value = bus.read(address);
        let result = op(self, value);
        bus.write(address, result);
        result
    }

    // ========================================
    // Compares
    // ========================================

    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.set_flag(flags::CARRY, register >= value);
        self.update_zero_negative(result);
    }

    // ========================================
    // Branches
    // ========================================

    /// Take or skip a branch; returns the extra cycles consumed
    /// (1 for a taken branch, 2 if the target is on another page)
    pub(crate) fn branch_if(&mut self, condition: bool, operand: Operand) -> u8 {
        if !condition {
            return 0;
        }
        self.pc = operand.address;
        if operand.page_crossed {
            2
        } else {
            1
        }
    }

    // ========================================
    // Jumps and subroutines
    // ========================================

    pub(crate) fn jsr(&mut self, bus: &mut Bus, address: u16) {
        // The pushed return address is the last byte of the JSR itself;
        // RTS increments after popping.
        self.push_word(bus, self.pc.wrapping_sub(1));
        self.pc = address;
    }

    pub(crate) fn rts(&mut self, bus: &mut Bus) {
        self.pc = self.pop_word(bus).wrapping_add(1);
    }

    pub(crate) fn rti(&mut self, bus: &mut Bus) {
        let status = self.pop_byte(bus);
        self.status = (status & !flags::BREAK) | flags::UNUSED;
        self.pc = self.pop_word(bus);
    }

    /// BRK: software interrupt through the IRQ vector, B set in the
    /// pushed status byte
    pub(crate) fn brk(&mut self, bus: &mut Bus) {
        // The byte after the opcode is padding; the pushed PC skips it
        self.push_word(bus, self.pc.wrapping_add(1));
        self.push_byte(bus, self.status | flags::BREAK | flags::UNUSED);
        self.set_flag(flags::INTERRUPT_DISABLE, true);
        let vector = self.irq_vector;
        let lo = bus.read(vector) as u16;
        let hi = bus.read(vector.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;
    }

    // ========================================
    // Stack instructions
    // ========================================

    pub(crate) fn pha(&mut self, bus: &mut Bus) {
        self.push_byte(bus, self.a);
    }

    pub(crate) fn php(&mut self, bus: &mut Bus) {
        // PHP pushes with B set, like BRK
        self.push_byte(bus, self.status | flags::BREAK | flags::UNUSED);
    }

    pub(crate) fn pla(&mut self, bus: &mut Bus) {
        self.a = self.pop_byte(bus);
        self.update_zero_negative(self.a);
    }

    pub(crate) fn plp(&mut self, bus: &mut Bus) {
        let status = self.pop_byte(bus);
        self.status = (status & !flags::BREAK) | flags::UNUSED;
    }

    // ========================================
    // Transfers
    // ========================================

    pub(crate) fn tax(&mut self) {
        self.x = self.a;
        self.update_zero_negative(self.x);
    }

    pub(crate) fn tay(&mut self) {
        self.y = self.a;
        self.update_zero_negative(self.y);
    }

    pub(crate) fn txa(&mut self) {
        self.a = self.x;
        self.update_zero_negative(self.a);
    }

    pub(crate) fn tya(&mut self) {
        self.a = self.y;
        self.update_zero_negative(self.a);
    }

    pub(crate) fn tsx(&mut self) {
        self.x = self.sp;
        self.update_zero_negative(self.x);
    }

    /// TXS does not touch flags
    pub(crate) fn txs(&mut self) {
        self.sp = self.x;
    }

    // ========================================
    // Undocumented combined operations
    // ========================================

    pub(crate) fn lax(&mut self, value: u8) {
        self.a = value;
        self.x = value;
        self.update_zero_negative(value);
    }

    pub(crate) fn sax(&mut self, bus: &mut Bus, address: u16) {
        bus.write(address, self.a & self.x);
    }

    pub(crate) fn dcp(&mut self, bus: &mut Bus, address: u16) {
        let value = self.dec(bus, address);
        self.compare(self.a, value);
    }

    pub(crate) fn isb(&mut self, bus: &mut Bus, address: u16) {
        let value = self.inc(bus, address);
        self.sbc(value);
    }

    pub(crate) fn slo(&mut self, bus: &mut Bus, address: u16) {
        let value = self.rmw(bus, address, Cpu::asl_value);
        self.ora(value);
    }

    pub(crate) fn rla(&mut self, bus: &mut Bus, address: u16) {
        let value = self.rmw(bus, address, Cpu::rol_value);
        self.and(value);
    }

    pub(crate) fn sre(&mut self, bus: &mut Bus, address: u16) {
        let value = self.rmw(bus, address, Cpu::lsr_value);
        self.eor(value);
    }

    pub(crate) fn rra(&mut self, bus: &mut Bus, address: u16) {
        let value = self.rmw(bus, address, Cpu::ror_value);
        self.adc(value);
    }
}
