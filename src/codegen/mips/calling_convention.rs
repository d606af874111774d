//! Argument and return registers, as the original runtime expects them.

use super::registers::Register::{self, *};

/// Integer argument registers, in order. Further integer arguments are
/// dropped with a warning.
pub const INT_ARGS: &[Register] = &[A0, A1, A2, A3];

/// Float argument registers, in order.
pub const FLOAT_ARGS: &[Register] = &[F12, F14, F16, F18];

/// Integer return register; also the `v0` sentinel's home.
pub const INT_RETURN: Register = V0;

/// Float return register.
pub const FLOAT_RETURN: Register = F0;

/// Reserved pair for array address arithmetic, never allocated.
pub const ADDRESS_SCRATCH: (Register, Register) = (T8, T9);
