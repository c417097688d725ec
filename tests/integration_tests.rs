use flag_guesser::cli::CliInterface;
use flag_guesser::{
    Action, Catalog, ContinentFilter, CountryRecord, DataSourceError, Difficulty, GameInterface,
    GameView, JsonFileSource, Message, Phase, Session, UserAction, game_loop,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::io::{Cursor, Write};

fn world() -> Vec<CountryRecord> {
    vec![
        CountryRecord::new("France", &["Europe"], "https://flagcdn.com/w320/fr.png"),
        CountryRecord::new("Germany", &["Europe"], "https://flagcdn.com/w320/de.png"),
        CountryRecord::new("United Kingdom", &["Europe"], "https://flagcdn.com/w320/gb.png"),
        CountryRecord::new("Papua New Guinea", &["Oceania"], "https://flagcdn.com/w320/pg.png"),
        CountryRecord::new("South Korea", &["Asia"], "https://flagcdn.com/w320/kr.png"),
        CountryRecord::new("Mexico", &["North America"], "https://flagcdn.com/w320/mx.png"),
        CountryRecord::new("El Salvador", &["Central America"], "https://flagcdn.com/w320/sv.png"),
        CountryRecord::new("Egypt", &["Africa"], "https://flagcdn.com/w320/eg.png"),
    ]
}

/// Feeds a fixed script of actions and records every view it is shown.
struct ScriptedInterface {
    script: VecDeque<UserAction>,
    views: Vec<GameView>,
    errors: Vec<String>,
    exited: bool,
}

impl ScriptedInterface {
    fn new(script: Vec<UserAction>) -> Self {
        Self {
            script: script.into(),
            views: Vec::new(),
            errors: Vec::new(),
            exited: false,
        }
    }

    fn last_view(&self) -> &GameView {
        self.views.last().expect("at least one view")
    }
}

impl GameInterface for ScriptedInterface {
    fn read_action(&mut self) -> Option<UserAction> {
        Some(self.script.pop_front().unwrap_or(UserAction::Exit))
    }

    fn display(&mut self, view: &GameView) {
        self.views.push(view.clone());
    }

    fn display_error(&mut self, error: &DataSourceError) {
        self.errors.push(error.to_string());
    }

    fn display_exit_message(&mut self) {
        self.exited = true;
    }
}

fn guess(text: &str) -> UserAction {
    UserAction::Guess(text.to_string())
}

#[test]
fn test_full_round_through_game_loop() {
    let catalog = Catalog::new(vec![
        CountryRecord::new("France", &["Europe"], "fr.png"),
        CountryRecord::new("Papua New Guinea", &["Oceania"], "pg.png"),
    ]);
    let mut rng = StdRng::seed_from_u64(11);
    let mut interface = ScriptedInterface::new(vec![
        UserAction::SelectContinent(Some(ContinentFilter::Europe)),
        guess("spain"),
        guess(" FRANCE "),
        guess("france"),
    ]);

    game_loop(&catalog, &mut interface, &mut rng);

    assert!(interface.exited);
    assert!(interface.errors.is_empty());
    // Initial view, then one per action.
    assert_eq!(interface.views.len(), 5);
    assert!(interface.views[0].round.is_none());

    let first_miss = &interface.views[2];
    assert_eq!(first_miss.message, Some(Message::TryAgain));
    assert_eq!(first_miss.score, 0.0);
    assert_eq!(
        first_miss.round.as_ref().map(|r| r.phase),
        Some(Phase::AwaitingSecondGuess)
    );

    let second_hit = &interface.views[3];
    assert!(matches!(second_hit.message, Some(Message::CorrectSecondTry { .. })));
    assert_eq!(second_hit.score, 0.5);

    // The round is resolved; the extra guess is not scored.
    assert_eq!(interface.last_view().score, 0.5);
    assert_eq!(
        interface.last_view().round.as_ref().map(|r| r.phase),
        Some(Phase::Resolved)
    );
}

#[test]
fn test_score_accumulates_across_rounds() {
    let catalog = Catalog::new(vec![CountryRecord::new("France", &["Europe"], "fr.png")]);
    let mut rng = StdRng::seed_from_u64(5);
    let mut interface = ScriptedInterface::new(vec![
        UserAction::SelectContinent(Some(ContinentFilter::All)),
        guess("France"),
        UserAction::NextCountry,
        guess("Spain"),
        guess("France"),
        UserAction::NextCountry,
        guess("Spain"),
        guess("Italy"),
        UserAction::NextCountry,
    ]);

    game_loop(&catalog, &mut interface, &mut rng);

    let scores: Vec<f64> = interface.views.iter().map(|v| v.score).collect();
    assert!(scores.windows(2).all(|w| w[1] >= w[0]), "scores never drop: {scores:?}");
    assert_eq!(interface.last_view().score, 1.5);
    assert!(interface.last_view().message.is_none());
    assert_eq!(
        interface.last_view().round.as_ref().map(|r| r.phase),
        Some(Phase::AwaitingFirstGuess)
    );
}

#[test]
fn test_restart_waits_for_continent() {
    let catalog = Catalog::new(world());
    let mut rng = StdRng::seed_from_u64(9);
    let mut interface = ScriptedInterface::new(vec![
        UserAction::SelectContinent(Some(ContinentFilter::Asia)),
        UserAction::SelectDifficulty(Difficulty::MultipleWords),
        guess("south korea"),
        UserAction::Restart,
        UserAction::NextCountry,
        guess("south korea"),
    ]);

    game_loop(&catalog, &mut interface, &mut rng);

    let before_restart = &interface.views[3];
    assert_eq!(before_restart.score, 1.0);
    let after_restart = &interface.views[4];
    assert!(after_restart.round.is_none());
    assert_eq!(after_restart.score, 0.0);
    assert_eq!(after_restart.continent_label(), "Choose");
    assert_eq!(after_restart.difficulty, Difficulty::OneWord);
    // Neither Next nor a guess does anything until a continent is chosen again.
    assert!(interface.last_view().round.is_none());
    assert_eq!(interface.last_view().score, 0.0);
}

#[test]
fn test_hint_follows_difficulty() {
    let catalog = Catalog::new(world());
    let mut rng = StdRng::seed_from_u64(2);
    let mut session = Session::new();
    session
        .apply(
            Action::FilterChanged {
                continent: Some(ContinentFilter::Asia),
                difficulty: Difficulty::MultipleWords,
            },
            &catalog,
            &mut rng,
        )
        .unwrap();
    let round = session.view().round.unwrap();
    assert_eq!(round.country, "South Korea");
    assert_eq!(round.hint.as_deref(), Some("S K"));
}

#[test]
fn test_americas_selection() {
    let catalog = Catalog::new(world());
    let mut rng = StdRng::seed_from_u64(21);
    for difficulty in Difficulty::OPTIONS {
        for _ in 0..25 {
            let pick = catalog
                .select_random(ContinentFilter::Americas, difficulty, &mut rng)
                .unwrap();
            let expected = match difficulty {
                Difficulty::OneWord => "Mexico",
                Difficulty::MultipleWords => "El Salvador",
            };
            assert_eq!(pick.common_name, expected);
        }
    }
}

#[test]
fn test_restrictive_filter_falls_back_in_game() {
    let catalog = Catalog::new(world());
    let mut rng = StdRng::seed_from_u64(4);
    let mut interface = ScriptedInterface::new(vec![
        UserAction::SelectDifficulty(Difficulty::MultipleWords),
        UserAction::SelectContinent(Some(ContinentFilter::Africa)),
    ]);

    game_loop(&catalog, &mut interface, &mut rng);

    assert!(interface.errors.is_empty());
    let round = interface.last_view().round.clone().expect("round despite no match");
    assert!(world().iter().any(|c| c.common_name == round.country));
}

#[test]
fn test_json_file_source_to_game() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"name": {{"common": "France"}}, "continents": ["Europe"], "flags": {{"png": "fr.png"}}}},
            {{"name": {{"common": "Papua New Guinea"}}, "continents": ["Oceania"], "flags": {{"png": "pg.png"}}}}
        ]"#
    )
    .unwrap();

    let catalog = Catalog::new(JsonFileSource::new(file.path()));
    let input = ":continent europe\nFrance\n:quit\n";
    let mut interface = CliInterface::new(Cursor::new(input));
    let mut rng = StdRng::seed_from_u64(1);
    game_loop(&catalog, &mut interface, &mut rng);

    assert_eq!(catalog.fetch_all().unwrap().len(), 2);
}

#[test]
fn test_missing_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::new(JsonFileSource::new(dir.path().join("missing.json")));
    let mut rng = StdRng::seed_from_u64(1);
    let mut interface = ScriptedInterface::new(vec![
        UserAction::SelectContinent(Some(ContinentFilter::Europe)),
        guess("France"),
    ]);

    game_loop(&catalog, &mut interface, &mut rng);

    assert!(interface.exited);
    assert!(!interface.errors.is_empty());
    assert!(interface.errors[0].contains("failed to read country data"));
    assert!(interface.last_view().round.is_none());
}

#[test]
fn test_cli_session_with_commands() {
    let catalog = Catalog::new(world());
    let input = ":help\n:bogus\n:continent oceania\n:difficulty multi\npapua new guinea\n:next\n:restart\n";
    let mut interface = CliInterface::new(Cursor::new(input));
    let mut rng = StdRng::seed_from_u64(8);

    // Runs to end of input without panicking.
    game_loop(&catalog, &mut interface, &mut rng);
    assert!(catalog.is_loaded());
}
