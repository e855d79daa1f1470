//! Diagnostic printer pass
//!
//! A no-op transform that serializes the current function's textual form to
//! a caller-supplied sink, tagged with a caller-supplied banner. Used
//! purely for debugging; it preserves every analysis.

use super::error::ExecutionError;
use super::{FunctionPass, PassContext, PassUsage, TransformPass};
use crate::ir::IrFunction;
use log::warn;
use std::io::{self, Write};

struct PrintFunctionPass<W: Write> {
    banner: String,
    out: W,
}

impl<W: Write> PrintFunctionPass<W> {
    fn write_function(&mut self, function: &IrFunction) -> io::Result<()> {
        if !self.banner.is_empty() {
            writeln!(self.out, "{}", self.banner)?;
        }
        writeln!(self.out, "{}", function)
    }
}

impl<W: Write> TransformPass for PrintFunctionPass<W> {
    fn name(&self) -> &'static str {
        "print-function"
    }

    fn usage(&self) -> PassUsage {
        PassUsage::none().preserves_all()
    }

    fn run(
        &mut self,
        function: &mut IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError> {
        // a failing sink degrades diagnostics, not compilation
        if let Err(err) = self.write_function(function) {
            warn!("printer pass could not write to its sink: {}", err);
        }
        Ok(false)
    }
}

/// Create a printer pass writing each function it sees to `out`, preceded
/// by `banner` (skipped when empty).
pub fn create_printer_pass<W: Write + 'static>(banner: impl Into<String>, out: W) -> FunctionPass {
    FunctionPass::transform(PrintFunctionPass {
        banner: banner.into(),
        out,
    })
}
