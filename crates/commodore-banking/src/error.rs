//! Set-up errors. Memory accesses themselves never fail.

/// Errors raised while building or loading a memory map.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BankingError {
    /// A ROM image does not match the size of its socket
    #[error("{name} ROM must be {expected} bytes, got {actual}")]
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A snapshot block does not match the size of the memory it restores
    #[error("snapshot block {name} must be {expected} bytes, got {actual}")]
    SnapshotSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The monitor asked for a bank this machine does not have
    #[error("unknown memory bank \"{0}\"")]
    UnknownBank(String),

    /// SIMM size not offered by the board
    #[error("invalid SIMM size: {0} MB")]
    SimmSize(u32),

    /// The table builder left a cell empty
    #[error("dispatch table cell for config {config}, page ${page:02X} was never populated")]
    Unpopulated { config: usize, page: usize },
}

/// Result type for memory map set-up.
pub type Result<T> = std::result::Result<T, BankingError>;

/// Check a ROM image against the size of its socket.
pub fn check_rom(name: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() == expected {
        Ok(())
    } else {
        Err(BankingError::RomSize {
            name,
            expected,
            actual: data.len(),
        })
    }
}
