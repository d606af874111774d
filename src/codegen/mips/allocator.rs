use std::collections::HashMap;

use crate::error::CompileError;
use crate::tac::Name;

use super::registers::Register;

/// One scratch pool with its in-use flags.
#[derive(Debug)]
struct Pool {
    registers: &'static [Register],
    in_use: Vec<bool>,
    exhausted: CompileError,
}

impl Pool {
    fn new(registers: &'static [Register], exhausted: CompileError) -> Self {
        Self {
            registers,
            in_use: vec![false; registers.len()],
            exhausted,
        }
    }

    fn acquire(&mut self) -> Result<Register, CompileError> {
        match self.in_use.iter().position(|used| !used) {
            Some(index) => {
                self.in_use[index] = true;
                Ok(self.registers[index])
            }
            None => Err(self.exhausted.clone()),
        }
    }

    fn release(&mut self, register: Register) {
        if let Some(index) = self.registers.iter().position(|&r| r == register) {
            self.in_use[index] = false;
        }
    }

    fn reset(&mut self) {
        self.in_use.fill(false);
    }
}

/// Tracks which names currently live in which scratch registers: one pool
/// and one map per register kind. A name lives in at most one of the two
/// maps at a time, and state resets fully at every function prologue.
///
/// The allocator is pure bookkeeping; the [`FunctionCompiler`] owns the
/// loads, stores and conversions that accompany each state change.
///
/// [`FunctionCompiler`]: super::function_compiler::FunctionCompiler
#[derive(Debug)]
pub struct RegisterAllocator {
    ints: Pool,
    floats: Pool,
    int_map: HashMap<Name, Register>,
    float_map: HashMap<Name, Register>,
    last_call_returned_float: bool,
}

impl RegisterAllocator {
    pub fn new() -> Self {
        Self {
            ints: Pool::new(Register::int_scratch(), CompileError::IntRegistersExhausted),
            floats: Pool::new(
                Register::float_scratch(),
                CompileError::FloatRegistersExhausted,
            ),
            int_map: HashMap::new(),
            float_map: HashMap::new(),
            last_call_returned_float: false,
        }
    }

    /// Forget everything. Called at every function prologue; no register
    /// is assumed live across functions.
    pub fn reset(&mut self) {
        self.ints.reset();
        self.floats.reset();
        self.int_map.clear();
        self.float_map.clear();
        self.last_call_returned_float = false;
    }

    pub fn lookup_int(&self, name: &Name) -> Option<Register> {
        self.int_map.get(name).copied()
    }

    pub fn lookup_float(&self, name: &Name) -> Option<Register> {
        self.float_map.get(name).copied()
    }

    /// Acquire an anonymous integer scratch register, e.g. for an
    /// immediate. The caller releases it after the instruction.
    pub fn acquire_int(&mut self) -> Result<Register, CompileError> {
        self.ints.acquire()
    }

    pub fn acquire_float(&mut self) -> Result<Register, CompileError> {
        self.floats.acquire()
    }

    /// Map `name` to an integer register, displacing any float binding it
    /// may have held.
    pub fn bind_int(&mut self, name: Name) -> Result<Register, CompileError> {
        if let Some(register) = self.int_map.get(&name) {
            return Ok(*register);
        }
        if let Some(register) = self.float_map.remove(&name) {
            self.floats.release(register);
        }
        let register = self.ints.acquire()?;
        self.int_map.insert(name, register);
        Ok(register)
    }

    /// Map `name` to a float register, displacing any integer binding it
    /// may have held.
    pub fn bind_float(&mut self, name: Name) -> Result<Register, CompileError> {
        if let Some(register) = self.float_map.get(&name) {
            return Ok(*register);
        }
        if let Some(register) = self.int_map.remove(&name) {
            self.ints.release(register);
        }
        let register = self.floats.acquire()?;
        self.float_map.insert(name, register);
        Ok(register)
    }

    /// Drop `name`'s binding and free its register.
    pub fn unbind(&mut self, name: &Name) -> Option<Register> {
        if let Some(register) = self.int_map.remove(name) {
            self.ints.release(register);
            return Some(register);
        }
        if let Some(register) = self.float_map.remove(name) {
            self.floats.release(register);
            return Some(register);
        }
        None
    }

    /// Free an anonymous scratch register.
    pub fn release(&mut self, register: Register) {
        if register.is_float() {
            self.floats.release(register);
        } else {
            self.ints.release(register);
        }
    }

    pub fn last_call_returned_float(&self) -> bool {
        self.last_call_returned_float
    }

    pub fn set_last_call_returned_float(&mut self, returned_float: bool) {
        self.last_call_returned_float = returned_float;
    }

    #[cfg(test)]
    fn bindings(&self) -> Vec<(&Name, Register)> {
        self.int_map
            .iter()
            .chain(self.float_map.iter())
            .map(|(name, &register)| (name, register))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    macro_rules! temp {
        ($index:expr) => {
            Name::Temp($index)
        };
    }

    #[test]
    fn bind_reuses_an_existing_binding() {
        let mut allocator = RegisterAllocator::new();

        let first = allocator.bind_int(temp!(1)).unwrap();
        let second = allocator.bind_int(temp!(1)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn bound_names_never_share_a_register() {
        let mut allocator = RegisterAllocator::new();

        for index in 0..8 {
            allocator.bind_int(temp!(index)).unwrap();
        }
        for index in 8..15 {
            allocator.bind_float(temp!(index)).unwrap();
        }

        let registers: HashSet<_> = allocator
            .bindings()
            .into_iter()
            .map(|(_, register)| register)
            .collect();
        assert_eq!(15, registers.len());
    }

    #[test]
    fn exhausting_a_pool_is_fatal() {
        let mut allocator = RegisterAllocator::new();

        for index in 0..8 {
            allocator.bind_int(temp!(index)).unwrap();
        }

        assert_eq!(
            Err(CompileError::IntRegistersExhausted),
            allocator.bind_int(temp!(99))
        );
        for index in 0..7 {
            allocator.bind_float(temp!(100 + index)).unwrap();
        }
        assert_eq!(
            Err(CompileError::FloatRegistersExhausted),
            allocator.acquire_float()
        );
    }

    #[test]
    fn unbind_frees_the_register_for_reuse() {
        let mut allocator = RegisterAllocator::new();

        let register = allocator.bind_int(temp!(1)).unwrap();
        assert_eq!(Some(register), allocator.unbind(&temp!(1)));

        assert_eq!(register, allocator.bind_int(temp!(2)).unwrap());
        assert_eq!(None, allocator.lookup_int(&temp!(1)));
    }

    #[test]
    fn rebinding_to_the_other_kind_moves_the_name() {
        let mut allocator = RegisterAllocator::new();

        let int_reg = allocator.bind_int(Name::var("x")).unwrap();
        let float_reg = allocator.bind_float(Name::var("x")).unwrap();

        assert!(!int_reg.is_float());
        assert!(float_reg.is_float());
        assert_eq!(None, allocator.lookup_int(&Name::var("x")));
        assert_eq!(Some(float_reg), allocator.lookup_float(&Name::var("x")));
    }

    #[test]
    fn reset_clears_maps_pools_and_the_return_flag() {
        let mut allocator = RegisterAllocator::new();
        allocator.bind_int(temp!(1)).unwrap();
        allocator.set_last_call_returned_float(true);

        allocator.reset();

        assert_eq!(None, allocator.lookup_int(&temp!(1)));
        assert!(!allocator.last_call_returned_float());
        assert!(allocator.bindings().is_empty());
    }
}
