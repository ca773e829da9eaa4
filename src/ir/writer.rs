//! Plain-text dump of a procedure, for logs and failing-test output.
//!
//! The format is line oriented and deterministic: blocks in program
//! order, values in block order, raw arena handles as names. A value
//! producing a result renders as `v3 = add i32 v1, v2`; a `Void` value
//! drops the left-hand side. Payload fields follow the operands
//! (`heap 0..8` on memory accesses, `read r, write w` on fences,
//! `[value, block]` pairs on phis) and a known origin trails the line
//! as `; bc@N`.

use crate::ir::{Payload, Procedure, ValueRef};
use std::io;

/// Write the textual form of `proc` to `out`.
pub fn write_procedure(proc: &Procedure, out: &mut dyn io::Write) -> io::Result<()> {
    ProcWriter { proc, out }.run()
}

struct ProcWriter<'a> {
    proc: &'a Procedure,
    out: &'a mut dyn io::Write,
}

impl ProcWriter<'_> {
    fn run(&mut self) -> io::Result<()> {
        write!(self.out, "proc @{}(", self.proc.name)?;
        for (index, ty) in self.proc.arg_types().iter().enumerate() {
            if index > 0 {
                write!(self.out, ", ")?;
            }
            write!(self.out, "{ty}")?;
        }
        writeln!(self.out, ") {{")?;
        for block in self.proc.blocks() {
            writeln!(self.out, "{block}:")?;
            for &value in self.proc.block_values(block) {
                self.write_value(value)?;
            }
        }
        writeln!(self.out, "}}")
    }

    fn write_value(&mut self, value: ValueRef) -> io::Result<()> {
        let data = self.proc.value(value);
        write!(self.out, "  ")?;
        if !data.ty.is_void() {
            write!(self.out, "{value} = ")?;
        }
        write!(self.out, "{}", data.opcode.mnemonic())?;
        if let Payload::Cond(cond) = data.payload {
            write!(self.out, " {cond}")?;
        }
        if !data.ty.is_void() {
            write!(self.out, " {}", data.ty)?;
        }

        if let Payload::Incoming(blocks) = &data.payload {
            for (index, (&operand, &from)) in data.operands.iter().zip(blocks).enumerate() {
                let sep = if index == 0 { " " } else { ", " };
                write!(self.out, "{sep}[{operand}, {from}]")?;
            }
        } else {
            for (index, &operand) in data.operands.iter().enumerate() {
                let sep = if index == 0 { " " } else { ", " };
                write!(self.out, "{sep}{operand}")?;
            }
            match &data.payload {
                Payload::Imm(imm) => write!(self.out, " {imm}")?,
                Payload::ArgIndex(index) => write!(self.out, " #{index}")?,
                Payload::Memory(range) => write!(self.out, ", heap {range}")?,
                Payload::FenceRanges { read, write } => {
                    write!(self.out, " read {read}, write {write}")?;
                }
                Payload::Target(target) => write!(self.out, " {target}")?,
                Payload::Cond2 { on_true, on_false } => {
                    write!(self.out, ", {on_true}, {on_false}")?;
                }
                Payload::None | Payload::Cond(_) => {}
                Payload::Incoming(_) => unreachable!(),
            }
        }

        if !data.origin.is_none() {
            write!(self.out, " ; {}", data.origin)?;
        }
        writeln!(self.out)
    }
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = Vec::new();
        write_procedure(self, &mut buf).map_err(|_| std::fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
