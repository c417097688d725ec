// Library interface for flag-guesser
// This allows integration tests to access internal modules

pub mod catalog;
pub mod cli;
pub mod error;
pub mod flag;
pub mod game_state;
pub mod logging;
pub mod round;
pub mod tui;

// Re-export commonly used items for easier testing
pub use catalog::{
    Catalog, ContinentFilter, CountryRecord, CountrySource, Difficulty, JsonFileSource,
    RestCountries, parse_countries, select_from,
};
pub use error::DataSourceError;
pub use game_state::{Action, GameInterface, GameView, Session, UserAction, game_loop};
pub use round::{Directive, Message, Phase, RoundEvent, RoundState, hint};
