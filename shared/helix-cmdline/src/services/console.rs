use std::io::{self, Write};
use std::sync::Arc;

use once_cell::sync::Lazy;

static CONSOLE: Lazy<Arc<PhysicalConsole>> = Lazy::new(|| Arc::new(PhysicalConsole { _private: () }));

/// Process-wide adapter over stdout and stderr, injectable into handlers.
#[derive(Debug)]
pub struct PhysicalConsole {
    _private: (),
}

impl PhysicalConsole {
    pub fn shared() -> Arc<Self> {
        Arc::clone(&CONSOLE)
    }

    pub fn write_out(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    pub fn write_err(&self, text: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        err.write_all(text.as_bytes())?;
        err.flush()
    }
}
