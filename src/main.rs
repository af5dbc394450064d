/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{io, process::ExitCode};

use clap::Parser;
use tadpole::{Cli, Engine};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so that stdout only carries command output
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();

    let mut engine = Engine::new(io::stdout().lock());
    tracing::debug!("{} starting with {:?}", engine.name(), cli.command);

    if let Err(e) = engine.execute(cli.command) {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
