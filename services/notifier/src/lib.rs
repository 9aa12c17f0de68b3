mod cli;
mod infra;
mod routes;
mod runner;

use postwatch::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
