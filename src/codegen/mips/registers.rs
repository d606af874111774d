use std::fmt::{self, Display, Formatter};

/// The MIPS32 registers the back end touches. `$f` registers are the
/// even-numbered single-precision halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    V0,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    Sp,
    Fp,
    Ra,
    F0,
    F4,
    F6,
    F8,
    F10,
    F12,
    F14,
    F16,
    F18,
    F20,
    F22,
    F24,
}

impl Register {
    /// The integer scratch pool.
    pub fn int_scratch() -> &'static [Register] {
        use Register::*;
        &[T0, T1, T2, T3, T4, T5, T6, T7]
    }

    /// The float scratch pool. `$f12`-`$f18` carry arguments, so the pool
    /// skips from `$f10` to the registers above them.
    pub fn float_scratch() -> &'static [Register] {
        use Register::*;
        &[F4, F6, F8, F10, F20, F22, F24]
    }

    pub fn is_float(&self) -> bool {
        use Register::*;
        matches!(self, F0 | F4 | F6 | F8 | F10 | F12 | F14 | F16 | F18 | F20 | F22 | F24)
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Register::V0 => "$v0",
            Register::A0 => "$a0",
            Register::A1 => "$a1",
            Register::A2 => "$a2",
            Register::A3 => "$a3",
            Register::T0 => "$t0",
            Register::T1 => "$t1",
            Register::T2 => "$t2",
            Register::T3 => "$t3",
            Register::T4 => "$t4",
            Register::T5 => "$t5",
            Register::T6 => "$t6",
            Register::T7 => "$t7",
            Register::T8 => "$t8",
            Register::T9 => "$t9",
            Register::Sp => "$sp",
            Register::Fp => "$fp",
            Register::Ra => "$ra",
            Register::F0 => "$f0",
            Register::F4 => "$f4",
            Register::F6 => "$f6",
            Register::F8 => "$f8",
            Register::F10 => "$f10",
            Register::F12 => "$f12",
            Register::F14 => "$f14",
            Register::F16 => "$f16",
            Register::F18 => "$f18",
            Register::F20 => "$f20",
            Register::F22 => "$f22",
            Register::F24 => "$f24",
        })
    }
}
