use crate::catalog::{Catalog, ContinentFilter, CountrySource, Difficulty};
use crate::error::DataSourceError;
use crate::round::{Directive, Message, Phase, RoundEvent, RoundState, hint};
use crate::{debug_log, info_log};
use rand::Rng;

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SubmitGuess(String),
    NextCountry,
    Restart,
    FilterChanged {
        continent: Option<ContinentFilter>,
        difficulty: Difficulty,
    },
}

/// Input as read by a front end. `Exit` never reaches the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Guess(String),
    NextCountry,
    Restart,
    SelectContinent(Option<ContinentFilter>),
    SelectDifficulty(Difficulty),
    Exit,
}

/// Snapshot handed to a front end for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    pub continent: Option<ContinentFilter>,
    pub difficulty: Difficulty,
    pub round: Option<RoundView>,
    pub message: Option<Message>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub country: String,
    pub flag_image_url: String,
    pub hint: Option<String>,
    pub phase: Phase,
}

impl GameView {
    #[must_use]
    pub fn continent_label(&self) -> &'static str {
        self.continent.map_or("Choose", ContinentFilter::label)
    }
}

/// One player's game: selected filters, the current round and its message.
#[derive(Debug, Default)]
pub struct Session {
    round: RoundState,
    continent: Option<ContinentFilter>,
    difficulty: Difficulty,
    message: Option<Message>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    #[must_use]
    pub fn continent(&self) -> Option<ContinentFilter> {
        self.continent
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Applies an action, consulting the catalog whenever a new target is due.
    ///
    /// Filters are stored even when the selection that follows them fails; the
    /// round itself is only touched on success.
    pub fn apply<S: CountrySource, R: Rng + ?Sized>(
        &mut self,
        action: Action,
        catalog: &Catalog<S>,
        rng: &mut R,
    ) -> Result<(), DataSourceError> {
        match action {
            // The guess box only exists while a continent is selected.
            Action::SubmitGuess(text) => {
                if self.continent.is_some() {
                    self.step(RoundEvent::Guess(text));
                }
            }
            Action::NextCountry => {
                if self.continent.is_some() {
                    self.next_country(catalog, rng)?;
                }
            }
            Action::FilterChanged {
                continent,
                difficulty,
            } => {
                self.continent = continent;
                self.difficulty = difficulty;
                if self.continent.is_some() {
                    self.next_country(catalog, rng)?;
                }
            }
            Action::Restart => {
                self.step(RoundEvent::Restart);
                self.continent = None;
                self.difficulty = Difficulty::default();
            }
        }
        Ok(())
    }

    /// Selects a target if a continent is chosen and none is assigned yet.
    pub fn ensure_target<S: CountrySource, R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog<S>,
        rng: &mut R,
    ) -> Result<(), DataSourceError> {
        if self.continent.is_some() && self.round.target().is_none() {
            self.next_country(catalog, rng)?;
        }
        Ok(())
    }

    fn next_country<S: CountrySource, R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog<S>,
        rng: &mut R,
    ) -> Result<(), DataSourceError> {
        let continent = self.continent.unwrap_or(ContinentFilter::All);
        let target = catalog.select_random(continent, self.difficulty, rng)?.clone();
        info_log!("New round: {} ({continent} / {})", target.common_name, self.difficulty);
        self.step(RoundEvent::NewTarget(target));
        Ok(())
    }

    fn step(&mut self, event: RoundEvent) {
        let round = std::mem::take(&mut self.round);
        let (round, directive) = round.transition(event);
        self.round = round;
        match directive {
            Directive::Show(message) => {
                debug_log!("Round message: {}", message);
                self.message = Some(message);
            }
            Directive::ClearMessage => self.message = None,
            Directive::Unchanged => {}
        }
    }

    /// Converts front-end input into a session action, filling in the filters
    /// the input leaves untouched.
    #[must_use]
    pub fn action_for(&self, input: UserAction) -> Option<Action> {
        match input {
            UserAction::Guess(text) => Some(Action::SubmitGuess(text)),
            UserAction::NextCountry => Some(Action::NextCountry),
            UserAction::Restart => Some(Action::Restart),
            UserAction::SelectContinent(continent) => Some(Action::FilterChanged {
                continent,
                difficulty: self.difficulty,
            }),
            UserAction::SelectDifficulty(difficulty) => Some(Action::FilterChanged {
                continent: self.continent,
                difficulty,
            }),
            UserAction::Exit => None,
        }
    }

    #[must_use]
    pub fn view(&self) -> GameView {
        let round = match (self.continent, self.round.target()) {
            (Some(_), Some(target)) => Some(RoundView {
                country: target.common_name.clone(),
                flag_image_url: target.flag_image_url.clone(),
                hint: hint(target, self.difficulty),
                phase: self.round.phase(),
            }),
            _ => None,
        };
        GameView {
            continent: self.continent,
            difficulty: self.difficulty,
            round,
            message: self.message.clone(),
            score: self.round.score(),
        }
    }
}

/// Front end for the game loop.
pub trait GameInterface {
    /// Blocks for the next action. `None` means the input was not usable and
    /// the loop should ask again.
    fn read_action(&mut self) -> Option<UserAction>;
    fn display(&mut self, view: &GameView);
    fn display_error(&mut self, error: &DataSourceError);
    fn display_exit_message(&mut self);
}

pub fn game_loop<S, I, R>(catalog: &Catalog<S>, interface: &mut I, rng: &mut R)
where
    S: CountrySource,
    I: GameInterface + ?Sized,
    R: Rng + ?Sized,
{
    let mut session = Session::new();
    interface.display(&session.view());

    loop {
        let input = match interface.read_action() {
            Some(UserAction::Exit) => {
                interface.display_exit_message();
                break;
            }
            Some(input) => input,
            None => continue,
        };
        debug_log!("Input: {:?}", input);

        let Some(action) = session.action_for(input) else {
            continue;
        };
        let result = session
            .apply(action, catalog, rng)
            .and_then(|()| session.ensure_target(catalog, rng));
        if let Err(e) = result {
            log::error!("Country data unavailable: {e}");
            interface.display_error(&e);
        }
        interface.display(&session.view());
    }
}
