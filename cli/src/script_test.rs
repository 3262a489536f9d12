use cover_decor::preview::MemoryPreviews;
use cover_decor::sticker::StickerKind;
use cover_decor::{Catalog, DecorConfig};

use super::*;

fn replay() -> Replay {
    let stage = Stage::open(DecorConfig::default(), Catalog::new(), Box::new(MemoryPreviews::new()), Vec::new());
    Replay::new(stage)
}

fn run(replay: &mut Replay, script: &str) {
    for (i, line) in script.lines().enumerate() {
        if let Some(event) = parse_line(i + 1, line).unwrap() {
            replay.apply(i + 1, event).unwrap();
        }
    }
}

// =============================================================
// parse_line
// =============================================================

#[test]
fn blank_and_comment_lines_are_skipped() {
    assert!(parse_line(1, "").unwrap().is_none());
    assert!(parse_line(2, "   ").unwrap().is_none());
    assert!(parse_line(3, "# setup").unwrap().is_none());
}

#[test]
fn parses_pointer_events() {
    let event = parse_line(1, r#"{"event":"move","x":10,"y":20.5,"shift":true}"#).unwrap();
    assert_eq!(event, Some(Event::Move { x: 10.0, y: 20.5, shift: true }));
    let event = parse_line(1, r#"{"event":"down","x":1,"y":2}"#).unwrap();
    assert_eq!(event, Some(Event::Down { x: 1.0, y: 2.0, shift: false }));
    assert_eq!(parse_line(1, r#"{"event":"cancel"}"#).unwrap(), Some(Event::Cancel));
    assert_eq!(parse_line(1, r#"{"event":"background"}"#).unwrap(), Some(Event::Background));
}

#[test]
fn parses_targets() {
    let event = parse_line(1, r#"{"event":"delete","target":2}"#).unwrap();
    assert_eq!(event, Some(Event::Delete { target: Some(Target::Added(2)) }));
    let id = Uuid::new_v4();
    let event = parse_line(1, &format!(r#"{{"event":"delete","target":"{id}"}}"#)).unwrap();
    assert_eq!(event, Some(Event::Delete { target: Some(Target::Id(id)) }));
    let event = parse_line(1, r#"{"event":"delete"}"#).unwrap();
    assert_eq!(event, Some(Event::Delete { target: None }));
}

#[test]
fn parses_text_edit_fields() {
    let event = parse_line(1, r#"{"event":"text","content":"hey","bold":true}"#).unwrap();
    let Some(Event::Text { target, edit }) = event else {
        panic!("expected text event, got {event:?}");
    };
    assert_eq!(target, None);
    assert_eq!(edit.content.as_deref(), Some("hey"));
    assert_eq!(edit.bold, Some(true));
    assert_eq!(edit.italic, None);
}

#[test]
fn unknown_event_is_error() {
    assert!(matches!(parse_line(7, r#"{"event":"jump"}"#), Err(ScriptError::Parse { line: 7, .. })));
}

// =============================================================
// Replay
// =============================================================

#[test]
fn replay_drag_and_undo() {
    let mut r = replay();
    run(
        &mut r,
        r#"
{"event":"resize","width":300,"height":400}
{"event":"add","selection":{"kind":"preset","asset_id":"cat"}}
{"event":"down","x":150,"y":200}
{"event":"move","x":360,"y":200}
{"event":"up","x":360,"y":200}
"#,
    );
    let saved = r.stage().save();
    assert_eq!(saved.len(), 1);
    assert!((saved[0].pos_x - 268.0 / 300.0).abs() < 1e-9);

    let (events, _, commits) = r.counts();
    assert_eq!(events, 5);
    assert_eq!(commits, 2);

    run(&mut r, r#"{"event":"undo"}"#);
    assert!((r.stage().save()[0].pos_x - 0.5).abs() < 1e-12);
}

#[test]
fn replay_text_edit_by_index() {
    let mut r = replay();
    run(
        &mut r,
        r#"
{"event":"resize","width":300,"height":400}
{"event":"add","selection":{"kind":"text","content":"hi"}}
{"event":"add","selection":{"kind":"preset","asset_id":"cat"}}
{"event":"text","target":0,"content":"hello","italic":true}
"#,
    );
    let stage = r.into_stage();
    let text = stage.store().list_by_z_ascending().into_iter().find(|s| s.kind.is_text()).unwrap().clone();
    match text.kind {
        StickerKind::Text { content, style } => {
            assert_eq!(content, "hello");
            assert!(style.italic);
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn delete_without_focus_is_unknown_target() {
    let mut r = replay();
    let event = parse_line(1, r#"{"event":"delete"}"#).unwrap().unwrap();
    assert!(matches!(r.apply(1, event), Err(ScriptError::UnknownTarget { line: 1, .. })));
}

#[test]
fn background_click_clears_focus() {
    let mut r = replay();
    run(
        &mut r,
        r#"
{"event":"resize","width":300,"height":400}
{"event":"add","selection":{"kind":"preset","asset_id":"cat"}}
{"event":"down","x":150,"y":200}
{"event":"up","x":150,"y":200}
{"event":"background"}
"#,
    );
    // The sticker sits under the canvas center; the click still lands on
    // the background.
    assert_eq!(r.stage().focused(), None);
    assert_eq!(r.stage().save().len(), 1);
}

#[test]
fn add_during_drag_is_refused() {
    let mut r = replay();
    run(
        &mut r,
        r#"
{"event":"resize","width":300,"height":400}
{"event":"add","selection":{"kind":"preset","asset_id":"cat"}}
{"event":"down","x":150,"y":200}
"#,
    );
    let event = parse_line(4, r#"{"event":"add","selection":{"kind":"text","content":"hi"}}"#).unwrap().unwrap();
    assert!(matches!(r.apply(4, event), Err(ScriptError::Refused { line: 4, .. })));
    assert_eq!(r.stage().store().len(), 1);
}
