use flag_guesser::catalog::{Catalog, CountrySource, JsonFileSource, RestCountries};
use flag_guesser::cli::{CliInterface, parse_cli};
use flag_guesser::game_state::{GameInterface, game_loop};
use flag_guesser::logging;
use flag_guesser::tui::TuiInterface;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::blocking::Client;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = parse_cli();

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    if let Err(e) = logging::init(&log_path) {
        eprintln!("Logging disabled ({}): {e}", log_path.display());
    }
    log::info!("Starting flag-guesser");

    let client = match Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to set up HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let source: Box<dyn CountrySource> = match &cli.countries_path {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(RestCountries::new(client.clone(), cli.endpoint.clone())),
    };
    // Lives until exit, so the dataset is fetched at most once per process.
    let catalog = Catalog::new(source);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut interface: Box<dyn GameInterface> = if cli.plain {
        Box::new(CliInterface::new(io::stdin().lock()))
    } else {
        match TuiInterface::new(client) {
            Ok(tui) => Box::new(tui),
            Err(e) => {
                eprintln!("Failed to start terminal UI: {e}. Try --plain.");
                return ExitCode::FAILURE;
            }
        }
    };

    game_loop(&catalog, interface.as_mut(), &mut rng);
    log::info!("Exiting flag-guesser");
    ExitCode::SUCCESS
}
