use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::codegen::inst::Instruction;
use crate::runtime::builtins::BUILTINS;
use crate::runtime::module::{LoadedModule, MethodHandle};
use crate::runtime::value::Value;
use crate::util::byte_reader::ByteReader;

const MAX_CALL_DEPTH: usize = 1024;

/// A runtime failure. Faults abort execution immediately; there is no
/// catching mechanism.
#[derive(Error, Diagnostic, Debug)]
pub enum Fault {
    #[error("attempted to divide by zero")]
    DivisionByZero,

    #[error("operator `{op}` cannot be applied to operands of type `{lhs}` and `{rhs}`")]
    InvalidOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("operator `{op}` cannot be applied to operand of type `{operand}`")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("condition did not evaluate to a boolean")]
    InvalidCondition,

    #[error("stack overflow")]
    StackOverflow,

    #[error("corrupt code: {0}")]
    CorruptCode(&'static str),

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

struct Frame<'m> {
    reader: ByteReader<'m>,
    module_idx: usize,
    locals: Vec<Value>,
}

/// Executes loaded modules. Module 0 is the program; referenced libraries
/// follow in reference order.
pub struct Vm<'m> {
    modules: &'m [LoadedModule],
    stack: Vec<Value>,
    frames: Vec<Frame<'m>>,
}

impl<'m> Vm<'m> {
    pub fn new(modules: &'m [LoadedModule]) -> Self {
        Self {
            modules,
            stack: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Run one method to completion and return its result.
    pub fn invoke(
        &mut self,
        module_idx: usize,
        handle: MethodHandle,
        args: Vec<Value>,
    ) -> Result<Value, Fault> {
        self.push_frame(module_idx, handle, args)?;
        self.run()
    }

    fn push_frame(
        &mut self,
        module_idx: usize,
        handle: MethodHandle,
        args: Vec<Value>,
    ) -> Result<(), Fault> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(Fault::StackOverflow);
        }

        let module = self
            .modules
            .get(module_idx)
            .ok_or(Fault::CorruptCode("call into a module that was not loaded"))?;
        let sym = module
            .symbols
            .get(handle.symbol)
            .ok_or(Fault::CorruptCode("call to a symbol the module does not have"))?;

        let mut locals = vec![Value::Unit; sym.n_locals as usize];
        if args.len() > locals.len() {
            return Err(Fault::CorruptCode("more arguments than locals"));
        }
        for (slot, arg) in args.into_iter().enumerate() {
            locals[slot] = arg;
        }

        let begin = sym.code_offset as usize;
        let end = begin + sym.code_len as usize;
        self.frames.push(Frame {
            reader: ByteReader::new(&module.code[begin..end]),
            module_idx,
            locals,
        });

        Ok(())
    }

    fn call(&mut self, module_idx: usize, handle: MethodHandle, argc: u8) -> Result<(), Fault> {
        let mut args = vec![Value::Unit; argc as usize];
        for slot in (0..argc as usize).rev() {
            args[slot] = self.pop()?;
        }

        self.push_frame(module_idx, handle, args)
    }

    fn frame(&mut self) -> &mut Frame<'m> {
        self.frames
            .last_mut()
            .expect("[INTERNAL ERR] No active call frame.")
    }

    // Code blobs are untrusted input; an underflow means the blob lied
    // about its stack effects, not that the VM itself is broken.
    fn pop(&mut self) -> Result<Value, Fault> {
        self.stack
            .pop()
            .ok_or(Fault::CorruptCode("operand stack underflow"))
    }

    fn top(&self) -> Result<&Value, Fault> {
        self.stack
            .last()
            .ok_or(Fault::CorruptCode("operand stack underflow"))
    }

    fn run(&mut self) -> Result<Value, Fault> {
        loop {
            let byte = self.frame().reader.read::<u8>();
            let inst = Instruction::decode(byte)
                .ok_or(Fault::CorruptCode("unknown instruction opcode"))?;
            match inst {
                Instruction::NoOp => {}

                Instruction::Lit_True => self.stack.push(Value::Bool(true)),
                Instruction::Lit_False => self.stack.push(Value::Bool(false)),
                Instruction::Lit_0 => self.stack.push(Value::Int(0)),
                Instruction::Lit_1 => self.stack.push(Value::Int(1)),
                Instruction::Lit_Int => {
                    let k = self.frame().reader.read::<i64>();
                    self.stack.push(Value::Int(k));
                }

                Instruction::PushConst_Str => {
                    let idx = self.frame().reader.read::<u16>() as usize;
                    let module_idx = self.frame().module_idx;
                    let s = self.modules[module_idx]
                        .constants
                        .get(idx)
                        .cloned()
                        .ok_or(Fault::CorruptCode("string constant index out of range"))?;
                    self.stack.push(Value::Str(s));
                }

                Instruction::Load => {
                    let slot = self.frame().reader.read::<u8>() as usize;
                    let value = self
                        .frame()
                        .locals
                        .get(slot)
                        .cloned()
                        .ok_or(Fault::CorruptCode("local slot out of range"))?;
                    self.stack.push(value);
                }
                Instruction::Store => {
                    let slot = self.frame().reader.read::<u8>() as usize;
                    let value = self.pop()?;
                    let frame = self.frame();
                    *frame
                        .locals
                        .get_mut(slot)
                        .ok_or(Fault::CorruptCode("local slot out of range"))? = value;
                }

                Instruction::Dup => {
                    let top = self.top()?.clone();
                    self.stack.push(top);
                }
                Instruction::Pop => {
                    _ = self.pop()?;
                }

                Instruction::Neg => match self.pop()? {
                    Value::Int(n) => self.stack.push(Value::Int(n.wrapping_neg())),
                    v => {
                        return Err(Fault::InvalidOperand {
                            op: "-",
                            operand: v.type_name(),
                        })
                    }
                },
                Instruction::Not => match self.pop()? {
                    Value::Bool(b) => self.stack.push(Value::Bool(!b)),
                    v => {
                        return Err(Fault::InvalidOperand {
                            op: "!",
                            operand: v.type_name(),
                        })
                    }
                },

                Instruction::Add => {
                    let rhs = self.pop()?;
                    let lhs = self.pop()?;
                    let result = match (&lhs, &rhs) {
                        (Value::Int(m), Value::Int(n)) => Value::Int(m.wrapping_add(*n)),
                        // String concatenation coerces the other operand.
                        (Value::Str(_), _) | (_, Value::Str(_)) => {
                            Value::Str(format!("{lhs}{rhs}").into())
                        }
                        _ => {
                            return Err(Fault::InvalidOperands {
                                op: "+",
                                lhs: lhs.type_name(),
                                rhs: rhs.type_name(),
                            })
                        }
                    };
                    self.stack.push(result);
                }
                Instruction::Sub => self.int_bin_op("-", i64::wrapping_sub)?,
                Instruction::Mul => self.int_bin_op("*", i64::wrapping_mul)?,
                Instruction::Div => {
                    let (m, n) = self.pop_int_operands("/")?;
                    if n == 0 {
                        return Err(Fault::DivisionByZero);
                    }
                    self.stack.push(Value::Int(m.wrapping_div(n)));
                }
                Instruction::Mod => {
                    let (m, n) = self.pop_int_operands("%")?;
                    if n == 0 {
                        return Err(Fault::DivisionByZero);
                    }
                    self.stack.push(Value::Int(m.wrapping_rem(n)));
                }

                Instruction::Eq => {
                    let rhs = self.pop()?;
                    let lhs = self.pop()?;
                    self.stack.push(Value::Bool(lhs == rhs));
                }
                Instruction::Ne => {
                    let rhs = self.pop()?;
                    let lhs = self.pop()?;
                    self.stack.push(Value::Bool(lhs != rhs));
                }
                Instruction::Lt => self.int_cmp_op("<", |m, n| m < n)?,
                Instruction::Le => self.int_cmp_op("<=", |m, n| m <= n)?,
                Instruction::Gt => self.int_cmp_op(">", |m, n| m > n)?,
                Instruction::Ge => self.int_cmp_op(">=", |m, n| m >= n)?,

                Instruction::Jump => {
                    let rel = self.frame().reader.read::<u16>() as usize;
                    self.frame().reader.jump(rel);
                }
                Instruction::JumpBack => {
                    let rel = self.frame().reader.read::<u16>() as usize;
                    self.frame().reader.jump_back(rel);
                }
                Instruction::JumpFalse => {
                    let rel = self.frame().reader.read::<u16>() as usize;
                    match self.pop()? {
                        Value::Bool(true) => {}
                        Value::Bool(false) => self.frame().reader.jump(rel),
                        _ => return Err(Fault::InvalidCondition),
                    }
                }
                Instruction::JumpTrueNoPop => {
                    let rel = self.frame().reader.read::<u16>() as usize;
                    let cond = match self.top()? {
                        Value::Bool(b) => *b,
                        _ => return Err(Fault::InvalidCondition),
                    };
                    if cond {
                        self.frame().reader.jump(rel);
                    }
                }
                Instruction::JumpFalseNoPop => {
                    let rel = self.frame().reader.read::<u16>() as usize;
                    let cond = match self.top()? {
                        Value::Bool(b) => *b,
                        _ => return Err(Fault::InvalidCondition),
                    };
                    if !cond {
                        self.frame().reader.jump(rel);
                    }
                }

                Instruction::Call => {
                    let sym = self.frame().reader.read::<u16>() as usize;
                    let argc = self.frame().reader.read::<u8>();
                    let module_idx = self.frame().module_idx;
                    self.call(module_idx, MethodHandle { symbol: sym }, argc)?;
                }
                Instruction::CallExtern => {
                    let lib = self.frame().reader.read::<u8>() as usize;
                    let sym = self.frame().reader.read::<u16>() as usize;
                    let argc = self.frame().reader.read::<u8>();
                    self.call(lib, MethodHandle { symbol: sym }, argc)?;
                }
                Instruction::CallBuiltin => {
                    let builtin = self.frame().reader.read::<u8>() as usize;
                    let argc = self.frame().reader.read::<u8>() as usize;
                    let info = BUILTINS
                        .get(builtin)
                        .ok_or(Fault::CorruptCode("unknown builtin"))?;
                    if argc < info.min_args as usize || argc > info.max_args as usize {
                        return Err(Fault::CorruptCode("builtin called with wrong arity"));
                    }
                    if argc > self.stack.len() {
                        return Err(Fault::CorruptCode("operand stack underflow"));
                    }
                    let args = self.stack.split_off(self.stack.len() - argc);
                    let result = (info.run)(&args)?;
                    self.stack.push(result);
                }

                Instruction::Ret => {
                    let result = self.pop()?;
                    _ = self.frames.pop();
                    if self.frames.is_empty() {
                        return Ok(result);
                    }
                    self.stack.push(result);
                }
                Instruction::Ret_0 => {
                    _ = self.frames.pop();
                    if self.frames.is_empty() {
                        return Ok(Value::Unit);
                    }
                    self.stack.push(Value::Unit);
                }
            }
        }
    }

    fn pop_int_operands(&mut self, op: &'static str) -> Result<(i64, i64), Fault> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        match (&lhs, &rhs) {
            (Value::Int(m), Value::Int(n)) => Ok((*m, *n)),
            _ => Err(Fault::InvalidOperands {
                op,
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            }),
        }
    }

    fn int_bin_op(&mut self, op: &'static str, f: fn(i64, i64) -> i64) -> Result<(), Fault> {
        let (m, n) = self.pop_int_operands(op)?;
        self.stack.push(Value::Int(f(m, n)));
        Ok(())
    }

    fn int_cmp_op(&mut self, op: &'static str, f: fn(i64, i64) -> bool) -> Result<(), Fault> {
        let (m, n) = self.pop_int_operands(op)?;
        self.stack.push(Value::Bool(f(m, n)));
        Ok(())
    }
}
