use bytes::Bytes;
use camlpad::config::Config;
use camlpad::runtime::{OutputChannel, UiUpdate};
use camlpad::session::{ProcessOutput, ToplevelSession};

fn tree_config() -> Config {
    Config {
        draw_trees: true,
        ..Config::default()
    }
}

async fn feed(session: &mut ToplevelSession, chunk: &[u8]) -> Vec<UiUpdate> {
    let mut updates = Vec::new();
    session
        .handle_output(ProcessOutput::Stdout(Bytes::copy_from_slice(chunk)), &mut updates)
        .await;
    updates
}

#[tokio::test]
async fn test_session_interleaves_text_commands_and_trees() {
    let mut session = ToplevelSession::new(tree_config());

    let mut updates = Vec::new();
    updates.extend(
        feed(
            &mut session,
            b"# --LemonCamlCommand--RegisterTreeType\tavl\tt=Node(Leaf,Leaf)--EndLemonCamlCommand--it = <abstr>\n",
        )
        .await,
    );
    updates.extend(feed(&mut session, b"--LemonTree--Node(Leaf,Leaf)--EndLemonTree--# ").await);

    // Plain text before and after blocks must survive in order.
    let texts: Vec<&str> = updates
        .iter()
        .filter_map(|u| match u {
            UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text,
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["# ", "it = <abstr>\n", "# "]);

    assert!(
        updates
            .iter()
            .any(|u| matches!(u, UiUpdate::Diagram { index: 1, .. })),
        "the tree block must render as diagram #1"
    );
    assert_eq!(session.substitutions().lookup("t"), Some("Node(Leaf,Leaf)"));
}

#[tokio::test]
async fn test_session_survives_chunk_split_inside_tag() {
    let mut session = ToplevelSession::new(tree_config());
    let mut updates = Vec::new();
    updates.extend(feed(&mut session, b"ready --Lemon").await);
    updates.extend(feed(&mut session, b"Tree--pair(a,b)--EndLemon").await);
    updates.extend(feed(&mut session, b"Tree-- done").await);

    assert!(matches!(
        &updates[0],
        UiUpdate::Output { text, .. } if text == "ready "
    ));
    assert!(updates
        .iter()
        .any(|u| matches!(u, UiUpdate::Diagram { .. })));
    assert!(updates
        .iter()
        .any(|u| matches!(u, UiUpdate::Output { text, .. } if text == " done")));
}

#[tokio::test]
async fn test_session_reports_unterminated_block_on_exit() {
    let mut session = ToplevelSession::new(tree_config());
    feed(&mut session, b"output --LemonCamlCommand--SendCaml\tlost").await;

    let mut updates = Vec::new();
    session
        .handle_output(ProcessOutput::Exited, &mut updates)
        .await;

    let error_text = updates
        .iter()
        .find_map(|u| match u {
            UiUpdate::Output {
                channel: OutputChannel::Error,
                text,
            } => Some(text.clone()),
            _ => None,
        })
        .expect("an unterminated command must surface an error");
    assert!(error_text.contains("Unterminated command"));
    assert!(
        updates
            .iter()
            .any(|u| matches!(u, UiUpdate::ToplevelState { running: false })),
        "process exit must be announced"
    );
}

#[test]
fn test_config_settings_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("camlpad.json");

    let config = Config {
        draw_trees: true,
        indent_unit: 2,
        recent_files: vec!["a.ml".to_string(), "b.ml".to_string()],
        settings_path: Some(settings.clone()),
        ..Config::default()
    };
    config.save().expect("settings must write");

    let raw = std::fs::read_to_string(&settings).expect("settings file exists");
    let reloaded: Config = serde_json::from_str(&raw).expect("settings must parse");
    assert!(reloaded.draw_trees);
    assert_eq!(reloaded.indent_unit, 2);
    assert_eq!(reloaded.recent_files, vec!["a.ml", "b.ml"]);
}
