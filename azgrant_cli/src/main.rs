//! azgrant CLI
//!

#![deny(missing_docs)]

use anyhow::Result;

// Every directory call is a sequential round-trip; a current-thread
// runtime is all the tool needs.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    azgrant_lib::cli().await
}
