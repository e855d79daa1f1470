//! Intermediate Representation (IR) for the Refract transformer
//!
//! This module defines the function-level program units that passes operate
//! on. The IR is deliberately small:
//! - Register-based, with explicit constants
//! - Basic blocks with a single terminator each
//! - Mutable in place by transform passes, read-only to analyses
//!
//! Function identity (`IrFunctionId`) is stable for the lifetime of the
//! module; the analysis cache is keyed on it.

pub mod blocks;
pub mod builder;
pub mod functions;
pub mod instructions;
pub mod modules;
pub mod printer;

pub use blocks::*;
pub use builder::*;
pub use functions::*;
pub use instructions::*;
pub use modules::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR version for compatibility checking
pub const IR_VERSION: u32 = 1;

/// Unique identifier for IR registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrId(u32);

impl IrId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn invalid() -> Self {
        Self(u32::MAX)
    }

    pub fn is_valid(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ir_id() {
        let id = IrId::new(42);
        assert_eq!(format!("{}", id), "$42");
        assert!(id.is_valid());

        let invalid = IrId::invalid();
        assert!(!invalid.is_valid());
    }
}
