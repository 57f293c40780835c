//
// main.rs
// dcm-convertor
//
// Tokio entry point that hands off execution to the CLI layer; dcm2niix runs are awaited one at a time.
//
// Thales Matheus Mendonça Santos - October 2026

use dcm_convertor::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}
