//! End-to-end scenarios driven through the test client, against the mock
//! games under `tests/mocks/`.

use ql_engine::ListItem;
use ql_server::StartingLocation;
use ql_testkit::{HarnessError, TestClient};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn mocks() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/mocks")
}

#[tokio::test]
async fn hello_world_reaches_the_main_text() {
    let game = TestClient::start(mocks(), "helloWorld.qsps").await.unwrap();
    game.main_equal("Hello world\r\n").await.unwrap();
}

#[tokio::test]
async fn actions_are_listed_in_order_and_selectable() {
    let mut game = TestClient::start(mocks(), "actions.qsps").await.unwrap();
    game.actions_equal(&[
        ListItem::new("First action"),
        ListItem::new("Second action"),
        ListItem::new("Third action"),
    ])
    .await
    .unwrap();

    game.select("First action").await.unwrap();
    game.main_equal("You click on the first action\r\n")
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_action_lists_everything_available() {
    let mut game = TestClient::start(mocks(), "actions.qsps").await.unwrap();
    let err = game.select("Non-existent action").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Not found \"Non-existent action\" in:\n* First action\n* Second action\n* Third action"
    );
}

#[tokio::test]
async fn deleting_the_last_action_is_observable() {
    let mut game = TestClient::start_at(
        mocks(),
        "actions.qsps",
        StartingLocation::Custom("startEmptyActions".to_string()),
    )
    .await
    .unwrap();
    game.has_action("start").await.unwrap();

    game.select("start").await.unwrap();
    game.actions_equal(&[]).await.unwrap();
}

#[tokio::test]
async fn objects_are_added_and_removed() {
    let mut game = TestClient::start(mocks(), "addObjects.qsps").await.unwrap();
    game.objects_equal(&[
        ListItem::new("Sword"),
        ListItem::new("Shield"),
        ListItem::new("Potion"),
    ])
    .await
    .unwrap();

    game.select("Fight").await.unwrap();
    game.objects_equal(&[ListItem::new("Sword")]).await.unwrap();
    game.main_equal("End of fight\r\n").await.unwrap();
    game.not_has_object("Shield").await.unwrap();
    game.has_object("Sword").await.unwrap();
}

#[tokio::test]
async fn selecting_an_object_runs_the_handler() {
    let mut game = TestClient::start(mocks(), "useObjects.qsps").await.unwrap();

    game.select("Add potion").await.unwrap();
    game.has_object("Potion").await.unwrap();

    game.select_object("Potion").await.unwrap();
    game.main_equal("Potion is selected\r\n").await.unwrap();

    game.select("Drink").await.unwrap();
    game.main_equal("gulp gulp\r\n").await.unwrap();
    game.not_has_object("Potion").await.unwrap();
}

#[tokio::test]
async fn included_library_is_merged_before_play() {
    let mut game = TestClient::start(mocks(), "game.qsps").await.unwrap();
    game.select("start").await.unwrap();
    game.main_equal("Hello world\r\n").await.unwrap();
}

#[tokio::test]
async fn default_start_runs_the_first_location() {
    let game = TestClient::start(mocks(), "startingLocation.qsps")
        .await
        .unwrap();
    game.main_equal("this is c location\r\n").await.unwrap();
}

#[tokio::test]
async fn explicit_default_start_matches_the_implicit_one() {
    let game = TestClient::start_at(
        mocks(),
        "startingLocation.qsps",
        StartingLocation::Default,
    )
    .await
    .unwrap();
    game.main_equal("this is c location\r\n").await.unwrap();
}

#[tokio::test]
async fn custom_start_runs_any_named_location() {
    let game = TestClient::start_at(
        mocks(),
        "startingLocation.qsps",
        StartingLocation::Custom("a".to_string()),
    )
    .await
    .unwrap();
    game.main_equal("this is a location\r\n").await.unwrap();
}

#[tokio::test]
async fn injected_code_drives_an_unstarted_game() {
    let mut game = TestClient::start_at(mocks(), "startingLocation.qsps", StartingLocation::None)
        .await
        .unwrap();
    game.exec_code("gosub 'b'").await.unwrap();
    game.main_equal("this is b location\r\n").await.unwrap();
}

#[tokio::test]
async fn custom_start_skips_the_first_location() {
    let game = TestClient::start_at(
        mocks(),
        "startingLocation.qsps",
        StartingLocation::Custom("b".to_string()),
    )
    .await
    .unwrap();
    game.main_equal("this is b location\r\n").await.unwrap();
}

#[tokio::test]
async fn starting_location_none_runs_nothing() {
    let game = TestClient::start_at(mocks(), "startingLocation.qsps", StartingLocation::None)
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let err = game.main_equal("this is c location\r\n").await.unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_)));
}

#[tokio::test]
async fn menus_open_and_drive_their_locations() {
    let mut game = TestClient::start(mocks(), "menu.qsps").await.unwrap();

    game.select("Talk").await.unwrap();
    game.has_menu("Say goodbye").await.unwrap();
    game.has_menu("Ask about the weather").await.unwrap();
    game.not_has_menu("Leave").await.unwrap();

    game.select_menu("Say goodbye").await.unwrap();
    game.main_equal("Goodbye then\r\n").await.unwrap();
}

#[tokio::test]
async fn missing_menu_entry_lists_the_labels() {
    let mut game = TestClient::start(mocks(), "menu.qsps").await.unwrap();
    game.select("Talk").await.unwrap();

    let err = game.select_menu("Flee").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Not found \"Flee\" in:\n* Say goodbye\n* Ask about the weather"
    );
}

#[tokio::test]
async fn messages_show_and_dismiss() {
    let mut game = TestClient::start(mocks(), "message.qsps").await.unwrap();

    game.select("Shout").await.unwrap();
    game.message_equal("You shout loudly").await.unwrap();

    game.dismiss_message().await;
    let engine = game.server().engine();
    assert!(engine.lock().await.message().is_none());
}

#[tokio::test]
async fn script_errors_fail_the_selection_and_reach_the_client() {
    let mut game = TestClient::start(mocks(), "broken.qsps").await.unwrap();

    let err = game.select("Break").await.unwrap_err();
    assert!(matches!(err, HarnessError::Engine(_)));

    let error = game.await_error().await.unwrap();
    assert_eq!(error.value().location, "begin");
    assert!(error.value().description.contains("nowhere"));
}

#[tokio::test]
async fn assertions_time_out_instead_of_hanging() {
    let game = TestClient::start(mocks(), "helloWorld.qsps")
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let err = game.has_action("anything").await.unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_)));
}

#[tokio::test]
async fn binary_games_load_without_conversion() {
    let source = std::fs::read_to_string(mocks().join("helloWorld.qsps")).unwrap();
    let parsed = ql_engine::parser::parse_game(&source).unwrap();
    let binary = ql_engine::codec::encode(&parsed);

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("game.qsp"), binary).unwrap();

    let game = TestClient::start(dir.path(), "game.qsp").await.unwrap();
    game.main_equal("Hello world\r\n").await.unwrap();
}
