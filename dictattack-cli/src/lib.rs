//! File loading and CSV output around [`dictattack_core`].
//!
//! The binary in `main.rs` wires these together with argument parsing:
//!
//! ```sh
//! dictattack users.csv rockyou.txt cracked.csv --workers 8
//! ```

pub mod error;
pub mod loader;
pub mod output;

pub use error::Error;
pub use loader::{load_credentials, load_wordlist};
pub use output::{CSV_HEADER, write_results};
